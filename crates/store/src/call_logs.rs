//! Call-log repository
//!
//! Insert-only rows ordered by `created_at` (id as tiebreaker). The one
//! designed mutation is appending a recording URL to the latest entry's
//! transcript.

use chrono::Utc;
use rusqlite::{params, Row};

use leadcall_core::{history_from_transcripts, CallLogEntry, CallLogStatus, Turn};

use crate::{Store, StoreError};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CallLogEntry> {
    Ok(CallLogEntry {
        id: row.get("id")?,
        lead_id: row.get("lead_id")?,
        status: CallLogStatus::parse(&row.get::<_, String>("call_status")?),
        transcript: row.get("transcript")?,
        created_at: row.get("created_at")?,
    })
}

impl Store {
    pub fn append_call_log(
        &self,
        lead_id: i64,
        status: CallLogStatus,
        transcript: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO call_logs (lead_id, call_status, transcript, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![lead_id, status.as_str(), transcript, Utc::now()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All entries for a lead in strict creation order
    pub fn call_log_for_lead(&self, lead_id: i64) -> Result<Vec<CallLogEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM call_logs WHERE lead_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([lead_id], entry_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The most recent entry for a lead, if any
    pub fn latest_call_log(&self, lead_id: i64) -> Result<Option<CallLogEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM call_logs WHERE lead_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([lead_id], entry_from_row)?;
        Ok(rows.next().transpose()?)
    }

    /// Append text to the latest entry's transcript (recording URLs).
    /// Returns false when the lead has no entries yet.
    pub fn append_to_latest_transcript(
        &self,
        lead_id: i64,
        suffix: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE call_logs SET transcript = transcript || char(10) || ?1
             WHERE id = (SELECT id FROM call_logs WHERE lead_id = ?2
                         ORDER BY created_at DESC, id DESC LIMIT 1)",
            params![suffix, lead_id],
        )?;
        Ok(changed > 0)
    }

    /// Reconstruct the role-tagged conversation history the engine
    /// replays: entries in creation order, filtered to speaker-prefixed
    /// transcripts.
    pub fn history_for_lead(&self, lead_id: i64) -> Result<Vec<Turn>, StoreError> {
        let entries = self.call_log_for_lead(lead_id)?;
        Ok(history_from_transcripts(
            entries.iter().map(|e| e.transcript.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewLead;
    use leadcall_core::TurnRole;

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
    fn history_reconstructs_in_creation_order() {
        let (store, lead) = store_with_lead();
        store
            .append_call_log(lead, CallLogStatus::Started, "Bot: Hello, is this John?")
            .unwrap();
        store
            .append_call_log(lead, CallLogStatus::InProgress, "Lead: Speaking.")
            .unwrap();
        store
            .append_call_log(lead, CallLogStatus::Provider("busy".into()), "Call ended")
            .unwrap();
        store
            .append_call_log(lead, CallLogStatus::InProgress, "Bot: Great, quick question.")
            .unwrap();

        let history = store.history_for_lead(lead).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, TurnRole::Assistant);
        assert_eq!(history[1].content, "Speaking.");
        assert_eq!(history[2].content, "Great, quick question.");
    }

    #[test]
    fn latest_entry_wins_ties_by_id() {
        let (store, lead) = store_with_lead();
        store
            .append_call_log(lead, CallLogStatus::Started, "Bot: one")
            .unwrap();
        store
            .append_call_log(lead, CallLogStatus::InProgress, "Lead: two")
            .unwrap();
        let latest = store.latest_call_log(lead).unwrap().unwrap();
        assert_eq!(latest.transcript, "Lead: two");
        assert_eq!(latest.status, CallLogStatus::InProgress);
    }

    #[test]
    fn recording_url_appends_to_latest_entry() {
        let (store, lead) = store_with_lead();
        assert!(!store
            .append_to_latest_transcript(lead, "Recording: https://x/y.mp3")
            .unwrap());

        store
            .append_call_log(lead, CallLogStatus::Completed, "Bot: Goodbye.")
            .unwrap();
        assert!(store
            .append_to_latest_transcript(lead, "Recording: https://x/y.mp3")
            .unwrap());

        let latest = store.latest_call_log(lead).unwrap().unwrap();
        assert_eq!(latest.transcript, "Bot: Goodbye.\nRecording: https://x/y.mp3");

        // The annotated row still parses as a single assistant turn.
        let history = store.history_for_lead(lead).unwrap();
        assert_eq!(history.len(), 1);
    }
}
