//! Follow-up repository
//!
//! The sweep task polls [`Store::due_follow_ups`] and works the queue in
//! priority order.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use leadcall_core::{FollowUp, FollowUpStatus};

use crate::{Store, StoreError};

fn follow_up_from_row(row: &Row<'_>) -> rusqlite::Result<FollowUp> {
    Ok(FollowUp {
        id: row.get("id")?,
        lead_id: row.get("lead_id")?,
        scheduled_time: row.get("scheduled_time")?,
        priority: row.get::<_, i64>("priority")?.clamp(1, 10) as u8,
        reason: row.get("reason")?,
        status: FollowUpStatus::parse(&row.get::<_, String>("status")?),
        created_at: row.get("created_at")?,
    })
}

impl Store {
    pub fn create_follow_up(
        &self,
        lead_id: i64,
        scheduled_time: DateTime<Utc>,
        priority: u8,
        reason: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO follow_ups (lead_id, scheduled_time, priority, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lead_id,
                scheduled_time,
                priority as i64,
                reason,
                FollowUpStatus::Pending.as_str(),
                Utc::now(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Pending follow-ups whose scheduled time has passed, most urgent first
    pub fn due_follow_ups(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<FollowUp>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM follow_ups
             WHERE status = ?1 AND scheduled_time <= ?2
             ORDER BY priority DESC, scheduled_time ASC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            params![FollowUpStatus::Pending.as_str(), now, limit as i64],
            follow_up_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_follow_up_status(
        &self,
        id: i64,
        status: FollowUpStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE follow_ups SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("follow_up", id));
        }
        Ok(())
    }

    /// Cancel every pending follow-up for a lead, e.g. once it books.
    /// Returns the number of rows cancelled.
    pub fn cancel_pending_follow_ups(&self, lead_id: i64) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        Ok(conn.execute(
            "UPDATE follow_ups SET status = ?1 WHERE lead_id = ?2 AND status = ?3",
            params![
                FollowUpStatus::Cancelled.as_str(),
                lead_id,
                FollowUpStatus::Pending.as_str(),
            ],
        )?)
    }

    /// All follow-ups, optionally scoped to one lead, soonest due first
    pub fn list_follow_ups(&self, lead_id: Option<i64>) -> Result<Vec<FollowUp>, StoreError> {
        let conn = self.conn()?;
        let mut out = Vec::new();
        match lead_id {
            Some(lead_id) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM follow_ups WHERE lead_id = ?1 ORDER BY scheduled_time",
                )?;
                let rows = stmt.query_map([lead_id], follow_up_from_row)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM follow_ups ORDER BY scheduled_time")?;
                let rows = stmt.query_map([], follow_up_from_row)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewLead;
    use chrono::Duration;

    fn store_with_lead() -> (Store, i64) {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .create_lead(&NewLead {
                name: "Acme".into(),
                phone: "555-2222".into(),
                ..NewLead::default()
            })
            .unwrap();
        (store, id)
    }

    #[test]
    fn due_orders_by_priority_then_time() {
        let (store, lead_id) = store_with_lead();
        let now = Utc::now();
        let low = store
            .create_follow_up(lead_id, now - Duration::hours(3), 3, "catch all")
            .unwrap();
        let high_late = store
            .create_follow_up(lead_id, now - Duration::hours(1), 8, "qualified")
            .unwrap();
        let high_early = store
            .create_follow_up(lead_id, now - Duration::hours(2), 8, "qualified")
            .unwrap();
        store
            .create_follow_up(lead_id, now + Duration::hours(1), 9, "not due yet")
            .unwrap();

        let due: Vec<i64> = store
            .due_follow_ups(now, 10)
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(due, vec![high_early, high_late, low]);
    }

    #[test]
    fn due_respects_limit_and_skips_worked_rows() {
        let (store, lead_id) = store_with_lead();
        let now = Utc::now();
        let first = store
            .create_follow_up(lead_id, now - Duration::minutes(10), 6, "callback")
            .unwrap();
        store
            .create_follow_up(lead_id, now - Duration::minutes(5), 4, "mobile tier")
            .unwrap();

        let due = store.due_follow_ups(now, 1).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, first);

        store
            .update_follow_up_status(first, FollowUpStatus::InProgress)
            .unwrap();
        let due = store.due_follow_ups(now, 10).unwrap();
        assert_eq!(due.len(), 1);
        assert_ne!(due[0].id, first);
    }

    #[test]
    fn cancel_pending_leaves_terminal_rows_alone() {
        let (store, lead_id) = store_with_lead();
        let now = Utc::now();
        let done = store
            .create_follow_up(lead_id, now, 5, "earlier attempt")
            .unwrap();
        store
            .update_follow_up_status(done, FollowUpStatus::Completed)
            .unwrap();
        store.create_follow_up(lead_id, now, 5, "pending").unwrap();

        assert_eq!(store.cancel_pending_follow_ups(lead_id).unwrap(), 1);
        let all = store.list_follow_ups(Some(lead_id)).unwrap();
        let cancelled = all
            .iter()
            .filter(|f| f.status == FollowUpStatus::Cancelled)
            .count();
        let completed = all
            .iter()
            .filter(|f| f.status == FollowUpStatus::Completed)
            .count();
        assert_eq!((cancelled, completed), (1, 1));
    }

    #[test]
    fn missing_follow_up_reports_not_found() {
        let (store, _) = store_with_lead();
        let err = store
            .update_follow_up_status(42, FollowUpStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("follow_up", 42)));
    }
}
