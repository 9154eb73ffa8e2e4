//! Note markers linking local rows to their CRM counterparts

pub const LEAD_ID_MARKER: &str = "Zoho Lead ID:";
pub const EVENT_ID_MARKER: &str = "Zoho Event ID:";

/// The id following `marker` in a notes blob, if present. The id runs to
/// the next whitespace.
pub fn extract_marker(notes: &str, marker: &str) -> Option<String> {
    notes
        .split(marker)
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
}

/// Render the note line recording a CRM id
pub fn marker_note(marker: &str, id: &str) -> String {
    format!("{marker} {id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trips_through_notes() {
        let note = marker_note(LEAD_ID_MARKER, "482913000001");
        assert_eq!(note, "Zoho Lead ID: 482913000001");
        assert_eq!(
            extract_marker(&note, LEAD_ID_MARKER).as_deref(),
            Some("482913000001")
        );
    }

    #[test]
    fn marker_is_found_inside_a_larger_notes_blob() {
        let notes = "Called twice.\nZoho Lead ID: 99 \nFollow up next week.";
        assert_eq!(extract_marker(notes, LEAD_ID_MARKER).as_deref(), Some("99"));
        assert_eq!(extract_marker(notes, EVENT_ID_MARKER), None);
    }

    #[test]
    fn absent_marker_yields_none() {
        assert_eq!(extract_marker("", LEAD_ID_MARKER), None);
        assert_eq!(extract_marker("Zoho Lead ID:", LEAD_ID_MARKER), None);
    }
}
