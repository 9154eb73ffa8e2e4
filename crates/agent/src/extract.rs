//! Best-effort field extraction from free text
//!
//! Every extractor returns `None` on failure and never errors. The
//! appointment date/time splitting is deliberately naive first-occurrence
//! token splitting; downstream behavior depends on these exact semantics,
//! including their misparses on multi-occurrence sentences.

use once_cell::sync::Lazy;
use regex::Regex;

use leadcall_core::MobileUsage;

/// Date and time fragments from a confirmation sentence.
///
/// Date is the text between the first ` on ` and the following ` at `;
/// time is the text after the first ` at ` up to the next `.`. Either
/// side can fail independently. Matching is ASCII case-insensitive.
pub fn appointment_date_time(text: &str) -> (Option<String>, Option<String>) {
    let lower = text.to_ascii_lowercase();

    let date = lower.find(" on ").map(|i| {
        let rest = &text[i + 4..];
        let rest_lower = &lower[i + 4..];
        match rest_lower.find(" at ") {
            Some(j) => rest[..j].to_string(),
            None => rest.to_string(),
        }
    });

    let time = lower.find(" at ").map(|i| {
        let rest = &text[i + 4..];
        match rest.find('.') {
            Some(j) => rest[..j].to_string(),
            None => rest.to_string(),
        }
    });

    (date, time)
}

static EMPLOYEE_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,5})\s*(?:employees?|workers?|technicians?|crew members?|people|guys|staff)\b")
        .unwrap()
});

/// Headcount mentioned in prose, e.g. "we have 25 employees"
pub fn employee_count(text: &str) -> Option<i64> {
    EMPLOYEE_COUNT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

const MOBILE_YES: [&str; 6] = [
    "use mobile",
    "use smartphones",
    "use tablets",
    "have phones",
    "on their phones",
    "yes, they do",
];

const MOBILE_NO: [&str; 4] = [
    "don't use mobile",
    "no mobile",
    "don't have phones",
    "no, they don't",
];

/// Whether the speaker said their crews use mobile devices. Negations are
/// checked first since they contain the affirmative substrings.
pub fn mobile_usage(text: &str) -> Option<MobileUsage> {
    let lower = text.to_ascii_lowercase();
    if MOBILE_NO.iter().any(|p| lower.contains(p)) {
        return Some(MobileUsage::No);
    }
    if MOBILE_YES.iter().any(|p| lower.contains(p)) {
        return Some(MobileUsage::Yes);
    }
    None
}
