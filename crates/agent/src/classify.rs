//! Terminal-result classification
//!
//! Ordered substring rules over the newest assistant utterance. This is a
//! contract with the persona prompt, which instructs the oracle to use
//! these exact phrasings when concluding; it is not general NLP. The
//! phrase constants here and the prompt text in `stage` must be kept in
//! lockstep.
//!
//! Rule order is fixed: appointment confirmation, then disqualification,
//! then generic farewell, else ongoing. An utterance matching several
//! rules takes the first.

use leadcall_core::{ConversationResult, ConversationStatus};

use crate::extract;

/// Words signalling a booking, paired with [`APPOINTMENT_NOUNS`]
pub const CONFIRMATION_WORDS: [&str; 2] = ["confirmed", "scheduled"];
pub const APPOINTMENT_NOUNS: [&str; 2] = ["appointment", "meeting"];

/// Phrases signalling the lead is not a match
pub const DISQUALIFICATION_PHRASES: [&str; 3] = [
    "not a good fit",
    "don't think this is a good fit",
    "doesn't seem like",
];

/// Both farewell phrases must appear for the ambiguous close
pub const FAREWELL_THANKS: &str = "thank you for your time";
pub const FAREWELL_GOODBYE: &str = "goodbye";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify the newest assistant utterance into a terminal result.
///
/// Mobile usage and employee count are not read from assistant text; the
/// engine fills those from the lead's own utterances.
pub fn classify(utterance: &str) -> ConversationResult {
    let lower = utterance.to_ascii_lowercase();

    if contains_any(&lower, &CONFIRMATION_WORDS) && contains_any(&lower, &APPOINTMENT_NOUNS) {
        let (date, time) = extract::appointment_date_time(utterance);
        return ConversationResult {
            status: ConversationStatus::Complete,
            appointment_set: true,
            appointment_date: date,
            appointment_time: time,
            ..ConversationResult::default()
        };
    }

    if contains_any(&lower, &DISQUALIFICATION_PHRASES) {
        return ConversationResult {
            status: ConversationStatus::Complete,
            qualified: Some(false),
            ..ConversationResult::default()
        };
    }

    if lower.contains(FAREWELL_THANKS) && lower.contains(FAREWELL_GOODBYE) {
        // Ambiguous close: neither qualified nor appointment is known
        return ConversationResult {
            status: ConversationStatus::Complete,
            ..ConversationResult::default()
        };
    }

    ConversationResult::default()
}
