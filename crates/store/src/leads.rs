//! Lead repository

use chrono::Utc;
use rusqlite::{params, Row};
use serde::Deserialize;

use leadcall_core::{Lead, LeadStatus, MobileUsage, Qualification};

use crate::{Store, StoreError};

/// Fields for lead creation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub employee_count: i64,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub employee_count: Option<i64>,
    pub uses_mobile_devices: Option<MobileUsage>,
    pub status: Option<LeadStatus>,
    pub qualification_status: Option<Qualification>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
}

impl LeadUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.category.is_none()
            && self.industry.is_none()
            && self.address.is_none()
            && self.website.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.employee_count.is_none()
            && self.uses_mobile_devices.is_none()
            && self.status.is_none()
            && self.qualification_status.is_none()
            && self.appointment_date.is_none()
            && self.appointment_time.is_none()
    }
}

pub(crate) fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get("id")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        category: row.get("category")?,
        industry: row.get("industry")?,
        address: row.get("address")?,
        website: row.get("website")?,
        city: row.get("city")?,
        state: row.get("state")?,
        employee_count: row.get("employee_count")?,
        uses_mobile_devices: MobileUsage::parse(&row.get::<_, String>("uses_mobile_devices")?),
        status: LeadStatus::parse(&row.get::<_, String>("status")?),
        qualification_status: Qualification::parse(
            &row.get::<_, String>("qualification_status")?,
        ),
        notes: row.get("notes")?,
        appointment_date: row.get("appointment_date")?,
        appointment_time: row.get("appointment_time")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Store {
    pub fn create_lead(&self, new: &NewLead) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO leads (name, phone, category, industry, address, website,
                                city, state, employee_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                new.name,
                new.phone,
                new.category,
                new.industry,
                new.address,
                new.website,
                new.city,
                new.state,
                new.employee_count,
                now,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_lead(&self, id: i64) -> Result<Option<Lead>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM leads WHERE id = ?1")?;
        let mut rows = stmt.query_map([id], lead_from_row)?;
        Ok(rows.next().transpose()?)
    }

    /// Phone is the dedup/lookup key for ingestion paths
    pub fn get_lead_by_phone(&self, phone: &str) -> Result<Option<Lead>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM leads WHERE phone = ?1 LIMIT 1")?;
        let mut rows = stmt.query_map([phone], lead_from_row)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, StoreError> {
        let conn = self.conn()?;
        match status {
            Some(status) => {
                let mut stmt =
                    conn.prepare("SELECT * FROM leads WHERE status = ?1 ORDER BY id")?;
                let rows = stmt.query_map([status.as_str()], lead_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            }
            None => {
                let mut stmt = conn.prepare("SELECT * FROM leads ORDER BY id")?;
                let rows = stmt.query_map([], lead_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            }
        }
    }

    /// Apply a partial update. Returns `NotFound` if the lead is missing.
    pub fn update_lead(&self, id: i64, update: &LeadUpdate) -> Result<(), StoreError> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! push_field {
            ($field:expr, $column:literal, $value:expr) => {
                if let Some(v) = &$field {
                    sets.push(format!("{} = ?{}", $column, values.len() + 1));
                    values.push(Box::new($value(v)));
                }
            };
        }

        push_field!(update.name, "name", |v: &String| v.clone());
        push_field!(update.phone, "phone", |v: &String| v.clone());
        push_field!(update.category, "category", |v: &String| v.clone());
        push_field!(update.industry, "industry", |v: &String| v.clone());
        push_field!(update.address, "address", |v: &String| v.clone());
        push_field!(update.website, "website", |v: &String| v.clone());
        push_field!(update.city, "city", |v: &String| v.clone());
        push_field!(update.state, "state", |v: &String| v.clone());
        push_field!(update.employee_count, "employee_count", |v: &i64| *v);
        push_field!(update.uses_mobile_devices, "uses_mobile_devices", |v: &MobileUsage| v
            .as_str()
            .to_string());
        push_field!(update.status, "status", |v: &LeadStatus| v.as_str().to_string());
        push_field!(
            update.qualification_status,
            "qualification_status",
            |v: &Qualification| v.as_str().to_string()
        );
        push_field!(update.appointment_date, "appointment_date", |v: &String| v.clone());
        push_field!(update.appointment_time, "appointment_time", |v: &String| v.clone());

        if sets.is_empty() {
            return Ok(());
        }

        sets.push(format!("updated_at = ?{}", values.len() + 1));
        values.push(Box::new(Utc::now()));
        values.push(Box::new(id));

        let sql = format!(
            "UPDATE leads SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        let conn = self.conn()?;
        let changed = conn.execute(
            &sql,
            rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("lead", id));
        }
        Ok(())
    }

    pub fn update_lead_status(&self, id: i64, status: LeadStatus) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE leads SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("lead", id));
        }
        Ok(())
    }

    /// Append a system-generated annotation to the lead's notes
    pub fn append_note(&self, id: i64, note: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE leads SET notes = CASE WHEN notes = '' THEN ?1
                                           ELSE notes || char(10) || ?1 END,
                              updated_at = ?2
             WHERE id = ?3",
            params![note, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("lead", id));
        }
        Ok(())
    }

    /// Delete a lead. Foreign keys cascade to call logs, appointments and
    /// follow-ups. Returns whether a row was deleted.
    pub fn delete_lead(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM leads WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}
