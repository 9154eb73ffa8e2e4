//! Appointment repository
//!
//! Every mutation that touches date/time also updates the owning lead's
//! denormalized appointment fields inside the same transaction so the two
//! can never disagree.

use chrono::Utc;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use leadcall_core::{
    Appointment, AppointmentMedium, AppointmentStatus, LeadStatus, Qualification,
};

use crate::{Store, StoreError};

/// Partial appointment update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub medium: Option<AppointmentMedium>,
    pub status: Option<AppointmentStatus>,
}

/// Appointment joined with its lead's display fields
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentWithLead {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub lead_name: String,
    pub lead_phone: String,
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get("id")?,
        lead_id: row.get("lead_id")?,
        date: row.get("date")?,
        time: row.get("time")?,
        medium: AppointmentMedium::parse(&row.get::<_, String>("medium")?),
        status: AppointmentStatus::parse(&row.get::<_, String>("status")?),
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Store {
    /// Create an appointment and mark the lead booked, atomically:
    /// status `Appointment Set`, qualification `Qualified`, denormalized
    /// date/time copied over.
    pub fn create_appointment(
        &self,
        lead_id: i64,
        date: &str,
        time: &str,
        medium: AppointmentMedium,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now();
        let changed = tx.execute(
            "UPDATE leads SET status = ?1, qualification_status = ?2,
                              appointment_date = ?3, appointment_time = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                LeadStatus::AppointmentSet.as_str(),
                Qualification::Qualified.as_str(),
                date,
                time,
                now,
                lead_id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("lead", lead_id));
        }
        tx.execute(
            "INSERT INTO appointments (lead_id, date, time, medium, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![lead_id, date, time, medium.as_str(), now, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM appointments WHERE id = ?1")?;
        let mut rows = stmt.query_map([id], appointment_from_row)?;
        Ok(rows.next().transpose()?)
    }

    /// Apply a partial update; date/time changes propagate to the lead's
    /// denormalized fields in the same transaction.
    pub fn update_appointment(
        &self,
        id: i64,
        update: &AppointmentUpdate,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let existing = {
            let mut stmt = tx.prepare("SELECT * FROM appointments WHERE id = ?1")?;
            let mut rows = stmt.query_map([id], appointment_from_row)?;
            rows.next()
                .transpose()?
                .ok_or(StoreError::NotFound("appointment", id))?
        };

        let date = update.date.clone().unwrap_or(existing.date);
        let time = update.time.clone().unwrap_or(existing.time);
        let medium = update.medium.unwrap_or(existing.medium);
        let status = update.status.unwrap_or(existing.status);

        tx.execute(
            "UPDATE appointments SET date = ?1, time = ?2, medium = ?3, status = ?4,
                                     updated_at = ?5
             WHERE id = ?6",
            params![date, time, medium.as_str(), status.as_str(), now, id],
        )?;

        if update.date.is_some() || update.time.is_some() {
            tx.execute(
                "UPDATE leads SET appointment_date = ?1, appointment_time = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![date, time, now, existing.lead_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Append an annotation (e.g. a CRM event id) to an appointment
    pub fn append_appointment_note(&self, id: i64, note: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE appointments SET notes = CASE WHEN notes = '' THEN ?1
                                                  ELSE notes || char(10) || ?1 END,
                                     updated_at = ?2
             WHERE id = ?3",
            params![note, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("appointment", id));
        }
        Ok(())
    }

    /// All appointments joined with lead display fields, ordered by slot
    pub fn list_appointments(&self) -> Result<Vec<AppointmentWithLead>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT a.*, l.name AS lead_name, l.phone AS lead_phone
             FROM appointments a JOIN leads l ON a.lead_id = l.id
             ORDER BY a.date, a.time",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AppointmentWithLead {
                appointment: appointment_from_row(row)?,
                lead_name: row.get("lead_name")?,
                lead_phone: row.get("lead_phone")?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Times already booked on a date, excluding canceled appointments.
    /// Used by the availability endpoint to filter open slots.
    pub fn booked_times_for_date(&self, date: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT time FROM appointments WHERE date = ?1 AND status != ?2",
        )?;
        let rows = stmt.query_map(
            params![date, AppointmentStatus::Canceled.as_str()],
            |row| row.get::<_, String>(0),
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewLead;

    fn store_with_lead() -> (Store, i64) {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .create_lead(&NewLead {
                name: "Acme".into(),
                phone: "555-1111".into(),
                ..NewLead::default()
            })
            .unwrap();
        (store, id)
    }

    #[test]
    fn booking_updates_lead_denormalized_fields() {
        let (store, lead_id) = store_with_lead();
        store
            .create_appointment(lead_id, "2026-09-01", "10:00", AppointmentMedium::Phone)
            .unwrap();

        let lead = store.get_lead(lead_id).unwrap().unwrap();
        assert_eq!(lead.status, LeadStatus::AppointmentSet);
        assert_eq!(lead.qualification_status, Qualification::Qualified);
        assert_eq!(lead.appointment_date.as_deref(), Some("2026-09-01"));
        assert_eq!(lead.appointment_time.as_deref(), Some("10:00"));
    }

    #[test]
    fn booking_for_missing_lead_rolls_back() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .create_appointment(7, "2026-09-01", "10:00", AppointmentMedium::Phone)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("lead", 7)));
        assert!(store.list_appointments().unwrap().is_empty());
    }

    #[test]
    fn reschedule_keeps_lead_in_sync() {
        let (store, lead_id) = store_with_lead();
        let id = store
            .create_appointment(lead_id, "2026-09-01", "10:00", AppointmentMedium::Phone)
            .unwrap();

        store
            .update_appointment(
                id,
                &AppointmentUpdate {
                    time: Some("14:00".into()),
                    ..AppointmentUpdate::default()
                },
            )
            .unwrap();

        let appt = store.get_appointment(id).unwrap().unwrap();
        assert_eq!(appt.time, "14:00");
        assert_eq!(appt.date, "2026-09-01");

        let lead = store.get_lead(lead_id).unwrap().unwrap();
        assert_eq!(lead.appointment_time.as_deref(), Some("14:00"));
    }

    #[test]
    fn status_only_update_leaves_lead_untouched() {
        let (store, lead_id) = store_with_lead();
        let id = store
            .create_appointment(lead_id, "2026-09-01", "10:00", AppointmentMedium::Phone)
            .unwrap();
        store
            .update_appointment(
                id,
                &AppointmentUpdate {
                    status: Some(AppointmentStatus::Canceled),
                    ..AppointmentUpdate::default()
                },
            )
            .unwrap();
        let lead = store.get_lead(lead_id).unwrap().unwrap();
        assert_eq!(lead.appointment_date.as_deref(), Some("2026-09-01"));
    }

    #[test]
    fn canceled_slots_are_not_booked() {
        let (store, lead_id) = store_with_lead();
        let id = store
            .create_appointment(lead_id, "2026-09-01", "10:00", AppointmentMedium::Phone)
            .unwrap();
        store
            .create_appointment(lead_id, "2026-09-01", "11:00", AppointmentMedium::Phone)
            .unwrap();
        store
            .update_appointment(
                id,
                &AppointmentUpdate {
                    status: Some(AppointmentStatus::Canceled),
                    ..AppointmentUpdate::default()
                },
            )
            .unwrap();

        let booked = store.booked_times_for_date("2026-09-01").unwrap();
        assert_eq!(booked, vec!["11:00".to_string()]);
    }
}
