//! Follow-up recommender
//!
//! Ordered decision table over the terminal result, the lead record and
//! the tail of the conversation. The callback-intent override outranks
//! the qualified-no-appointment rule; everything else falls through in
//! the order written. Callback time parsing is best effort and lands on
//! 10:00 when the lead named a day but no time.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use leadcall_core::{ConversationResult, Lead, MobileUsage, Turn};

/// Default callback hour when only a day was named
const DEFAULT_CALLBACK_HOUR: u32 = 10;

/// How many trailing history entries are scanned for callback intent
const CALLBACK_SCAN_DEPTH: usize = 3;

/// Phrases that signal an explicit callback request
pub const CALLBACK_PHRASES: [&str; 7] = [
    "call me back",
    "call back",
    "call me later",
    "not a good time",
    "try again",
    "another time",
    "busy right now",
];

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// A recommended retry for a lead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub scheduled_time: DateTime<Utc>,
    /// 1-10, higher is more urgent
    pub priority: u8,
    pub reason: String,
}

/// Decide whether and when to retry a lead after a terminal conversation.
/// `None` means no follow-up is warranted.
pub fn recommend(
    result: &ConversationResult,
    lead: &Lead,
    history: &[Turn],
    now: DateTime<Utc>,
) -> Option<Recommendation> {
    // Nothing to decide mid-conversation, and a booked lead is done.
    if !result.is_complete() {
        return None;
    }
    if result.appointment_set {
        return None;
    }

    let callback = callback_override(history, now);

    if result.qualified == Some(true) {
        // Explicit callback request wins over the qualified rule.
        if let Some(recommendation) = callback {
            return Some(recommendation);
        }
        return Some(Recommendation {
            scheduled_time: now + Duration::days(1),
            priority: 8,
            reason: "Qualified but no appointment booked".to_string(),
        });
    }

    if let Some(recommendation) = callback {
        return Some(recommendation);
    }

    let uses_mobile = result.uses_mobile.unwrap_or(lead.uses_mobile_devices);
    let employees = result.employee_count.unwrap_or(lead.employee_count);
    if uses_mobile == MobileUsage::Yes && employees > 0 {
        let (priority, days) = if employees >= 20 {
            (7, 2)
        } else if employees >= 10 {
            (6, 3)
        } else {
            (4, 5)
        };
        return Some(Recommendation {
            scheduled_time: now + Duration::days(days),
            priority,
            reason: format!("Mobile-using business with {employees} employees"),
        });
    }

    // Completed with no stronger signal: low-priority catch-all retry.
    Some(Recommendation {
        scheduled_time: now + Duration::days(7),
        priority: 3,
        reason: "Conversation completed without outcome".to_string(),
    })
}

/// Scan the last few turns for an explicit callback request; when found,
/// parse the requested time out of the same text.
fn callback_override(history: &[Turn], now: DateTime<Utc>) -> Option<Recommendation> {
    let tail: String = history
        .iter()
        .rev()
        .take(CALLBACK_SCAN_DEPTH)
        .map(|turn| turn.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();

    if !CALLBACK_PHRASES.iter().any(|p| tail.contains(p)) {
        return None;
    }

    Some(Recommendation {
        scheduled_time: parse_callback_time(&tail, now),
        priority: 6,
        reason: "Lead asked to be called back".to_string(),
    })
}

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?::([0-5]\d))?\s*(am|pm)\b").unwrap());
static O_CLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*o'?clock\b").unwrap());

/// Requested callback time from lowercased text, in fixed precedence:
/// named weekday, then "tomorrow", then "next week", then an explicit
/// clock time, else tomorrow at the default hour.
fn parse_callback_time(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(weekday) = WEEKDAYS
        .iter()
        .filter_map(|(name, day)| text.find(name).map(|i| (i, *day)))
        .min_by_key(|(i, _)| *i)
        .map(|(_, day)| day)
    {
        return next_weekday(now, weekday);
    }

    if text.contains("tomorrow") || text.contains("next day") {
        return at_hour(now + Duration::days(1), DEFAULT_CALLBACK_HOUR, 0);
    }

    if text.contains("next week") {
        return next_weekday(now, Weekday::Mon);
    }

    if let Some((hour, minute)) = clock_time(text) {
        let today = at_hour(now, hour, minute);
        return if today > now {
            today
        } else {
            today + Duration::days(1)
        };
    }

    at_hour(now + Duration::days(1), DEFAULT_CALLBACK_HOUR, 0)
}

/// Next occurrence of `weekday` at the default hour. The same weekday
/// means a week out, never today.
fn next_weekday(now: DateTime<Utc>, weekday: Weekday) -> DateTime<Utc> {
    let today = now.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut ahead = (target - today).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    at_hour(now + Duration::days(ahead), DEFAULT_CALLBACK_HOUR, 0)
}

fn at_hour(day: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    DateTime::from_naive_utc_and_offset(day.date_naive().and_time(time), Utc)
}

fn clock_time(text: &str) -> Option<(u32, u32)> {
    if let Some(caps) = CLOCK_TIME.captures(text) {
        let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        if hour > 12 {
            return None;
        }
        if caps.get(3)?.as_str() == "pm" {
            if hour != 12 {
                hour += 12;
            }
        } else if hour == 12 {
            hour = 0;
        }
        return Some((hour, minute));
    }

    if let Some(caps) = O_CLOCK.captures(text) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        if (1..=12).contains(&hour) {
            // Bare "N o'clock" is read as business hours
            let hour = if hour < 8 { hour + 12 } else { hour };
            return Some((hour, 0));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leadcall_core::{ConversationStatus, LeadStatus, Qualification};

    fn lead(uses_mobile: MobileUsage, employee_count: i64) -> Lead {
        Lead {
            id: 1,
            name: "Acme Plumbing".into(),
            phone: "555-0001".into(),
            category: String::new(),
            industry: "Plumbing".into(),
            address: String::new(),
            website: String::new(),
            city: "Denver".into(),
            state: "CO".into(),
            employee_count,
            uses_mobile_devices: uses_mobile,
            status: LeadStatus::Calling,
            qualification_status: Qualification::Unknown,
            notes: String::new(),
            appointment_date: None,
            appointment_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn completed() -> ConversationResult {
        ConversationResult {
            status: ConversationStatus::Complete,
            ..ConversationResult::default()
        }
    }

    fn history(lines: &[&str]) -> Vec<Turn> {
        lines.iter().map(|l| Turn::user(*l)).collect()
    }

    // Monday
    fn monday_9am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap()
    }

    #[test]
    fn ongoing_and_booked_conversations_get_nothing() {
        let now = monday_9am();
        assert_eq!(
            recommend(&ConversationResult::default(), &lead(MobileUsage::Yes, 50), &[], now),
            None
        );

        let booked = ConversationResult {
            status: ConversationStatus::Complete,
            appointment_set: true,
            ..ConversationResult::default()
        };
        assert_eq!(recommend(&booked, &lead(MobileUsage::Yes, 50), &[], now), None);
    }

    #[test]
    fn qualified_without_appointment_is_high_priority_next_day() {
        let result = ConversationResult {
            qualified: Some(true),
            ..completed()
        };
        // Employee count must not matter here.
        let rec = recommend(&result, &lead(MobileUsage::Yes, 100), &[], monday_9am()).unwrap();
        assert_eq!(rec.priority, 8);
        assert_eq!(rec.scheduled_time, monday_9am() + Duration::days(1));
    }

    #[test]
    fn callback_request_overrides_the_qualified_rule() {
        let result = ConversationResult {
            qualified: Some(true),
            ..completed()
        };
        let rec = recommend(
            &result,
            &lead(MobileUsage::Unknown, 0),
            &history(&["call me back tomorrow"]),
            monday_9am(),
        )
        .unwrap();
        assert_eq!(rec.priority, 6);
        assert_eq!(
            rec.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn callback_scan_only_reads_the_last_three_turns() {
        let turns = history(&[
            "call me back please",
            "filler one",
            "filler two",
            "filler three",
        ]);
        let rec = recommend(&completed(), &lead(MobileUsage::Unknown, 0), &turns, monday_9am());
        // The request fell out of the scan window; catch-all applies.
        assert_eq!(rec.unwrap().priority, 3);
    }

    #[test]
    fn named_weekday_schedules_the_upcoming_occurrence() {
        let rec = recommend(
            &completed(),
            &lead(MobileUsage::Unknown, 0),
            &history(&["not a good time, let's talk next friday"]),
            monday_9am(),
        )
        .unwrap();
        // Monday the 24th -> Friday the 28th, four days ahead, never eleven.
        assert_eq!(
            rec.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 28, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn same_weekday_means_a_week_out() {
        let rec = recommend(
            &completed(),
            &lead(MobileUsage::Unknown, 0),
            &history(&["try again monday"]),
            monday_9am(),
        )
        .unwrap();
        assert_eq!(
            rec.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 31, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn next_week_lands_on_monday() {
        let rec = recommend(
            &completed(),
            &lead(MobileUsage::Unknown, 0),
            &history(&["not a good time, try next week"]),
            monday_9am(),
        )
        .unwrap();
        assert_eq!(
            rec.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 31, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn clock_time_today_if_still_ahead_else_tomorrow() {
        let now = monday_9am();
        let afternoon = recommend(
            &completed(),
            &lead(MobileUsage::Unknown, 0),
            &history(&["busy right now, call back at 3pm"]),
            now,
        )
        .unwrap();
        assert_eq!(
            afternoon.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 24, 15, 0, 0).unwrap()
        );

        let earlier = recommend(
            &completed(),
            &lead(MobileUsage::Unknown, 0),
            &history(&["busy right now, call back at 8am"]),
            now,
        )
        .unwrap();
        assert_eq!(
            earlier.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 25, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn bare_callback_defaults_to_tomorrow_ten() {
        let rec = recommend(
            &completed(),
            &lead(MobileUsage::Unknown, 0),
            &history(&["just call me back sometime"]),
            monday_9am(),
        )
        .unwrap();
        assert_eq!(
            rec.scheduled_time,
            Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn mobile_headcount_tiers() {
        let now = monday_9am();
        let cases = [
            (25, 7, 2),
            (20, 7, 2),
            (12, 6, 3),
            (10, 6, 3),
            (5, 4, 5),
            (1, 4, 5),
        ];
        for (count, priority, days) in cases {
            let rec =
                recommend(&completed(), &lead(MobileUsage::Yes, count), &[], now).unwrap();
            assert_eq!(rec.priority, priority, "count {count}");
            assert_eq!(rec.scheduled_time, now + Duration::days(days), "count {count}");
        }
    }

    #[test]
    fn extracted_fields_outrank_the_stored_lead_fields() {
        let result = ConversationResult {
            uses_mobile: Some(MobileUsage::Yes),
            employee_count: Some(30),
            ..completed()
        };
        let rec = recommend(&result, &lead(MobileUsage::Unknown, 0), &[], monday_9am()).unwrap();
        assert_eq!(rec.priority, 7);
    }

    #[test]
    fn completed_with_no_signal_is_the_low_priority_catch_all() {
        let rec = recommend(
            &completed(),
            &lead(MobileUsage::No, 40),
            &history(&["we talked for a while"]),
            monday_9am(),
        )
        .unwrap();
        assert_eq!(rec.priority, 3);
        assert_eq!(rec.scheduled_time, monday_9am() + Duration::days(7));
    }
}
