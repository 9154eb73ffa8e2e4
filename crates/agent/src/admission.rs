//! Call admission gate
//!
//! Decides whether a call may start or continue at a given instant. Pure
//! functions over the clock, the business-hours block and the lead's most
//! recent call-log entry; the orchestrator performs the denial side
//! effects (warning log plus a `Failed` call-log entry).
//!
//! Malformed configuration never fails here: an unknown timezone falls
//! back to the default zone and an unparseable `HH:MM` bound falls back
//! to the default window.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use leadcall_config::BusinessHoursConfig;
use leadcall_core::CallLogEntry;

const DEFAULT_TZ: Tz = chrono_tz::US::Mountain;

const DEFAULT_WEEKDAY_WINDOW: ((u32, u32), (u32, u32)) = ((9, 30), (16, 0));
const DEFAULT_WEEKEND_WINDOW: ((u32, u32), (u32, u32)) = ((10, 0), (14, 0));

/// An in-flight call older than this no longer counts as in progress
const IN_PROGRESS_WINDOW_MINUTES: i64 = 30;

fn parse_bound(s: &str, (hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M")
        .ok()
        .or_else(|| NaiveTime::from_hms_opt(hour, minute, 0))
        .unwrap_or(NaiveTime::MIN)
}

/// Hours-only check used by the bulk dial path. No test-mode override and
/// no in-progress override: bulk dialing never starts calls after hours.
/// Both bounds are inclusive.
pub fn is_within_call_hours(now: DateTime<Utc>, hours: &BusinessHoursConfig) -> bool {
    let tz: Tz = hours.timezone.parse().unwrap_or(DEFAULT_TZ);
    let local = now.with_timezone(&tz);
    let weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);

    if weekend && !hours.weekend_enabled {
        return false;
    }

    let (start, end) = if weekend {
        (
            parse_bound(&hours.weekend_start, DEFAULT_WEEKEND_WINDOW.0),
            parse_bound(&hours.weekend_end, DEFAULT_WEEKEND_WINDOW.1),
        )
    } else {
        (
            parse_bound(&hours.weekday_start, DEFAULT_WEEKDAY_WINDOW.0),
            parse_bound(&hours.weekday_end, DEFAULT_WEEKDAY_WINDOW.1),
        )
    };

    let time = local.time();
    start <= time && time <= end
}

/// Whether the lead's latest call-log entry represents a call still in
/// flight: status `Started` or `In Progress` and created within the last
/// 30 minutes.
pub fn has_call_in_progress(now: DateTime<Utc>, latest: Option<&CallLogEntry>) -> bool {
    latest.is_some_and(|entry| {
        entry.status.is_active()
            && now.signed_duration_since(entry.created_at)
                <= Duration::minutes(IN_PROGRESS_WINDOW_MINUTES)
    })
}

/// Full admission decision for one lead.
///
/// Test mode always allows. Otherwise within-hours allows, and outside
/// hours only an in-flight call may continue; a fresh call never starts.
pub fn should_allow_call(
    now: DateTime<Utc>,
    hours: &BusinessHoursConfig,
    test_mode: bool,
    latest: Option<&CallLogEntry>,
) -> bool {
    if test_mode {
        return true;
    }
    if is_within_call_hours(now, hours) {
        return true;
    }
    has_call_in_progress(now, latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leadcall_core::CallLogStatus;

    fn mountain(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        chrono_tz::US::Mountain
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn entry(status: CallLogStatus, created_at: DateTime<Utc>) -> CallLogEntry {
        CallLogEntry {
            id: 1,
            lead_id: 1,
            status,
            transcript: String::new(),
            created_at,
        }
    }

    // 2026-08-26 is a Wednesday, 2026-08-29 a Saturday.

    #[test]
    fn weekday_bounds_are_inclusive_on_both_ends() {
        let hours = BusinessHoursConfig::default();
        assert!(!is_within_call_hours(mountain(2026, 8, 26, 9, 29, 59), &hours));
        assert!(is_within_call_hours(mountain(2026, 8, 26, 9, 30, 0), &hours));
        assert!(is_within_call_hours(mountain(2026, 8, 26, 16, 0, 0), &hours));
        assert!(!is_within_call_hours(mountain(2026, 8, 26, 16, 0, 1), &hours));
    }

    #[test]
    fn weekends_are_closed_unless_enabled() {
        let mut hours = BusinessHoursConfig::default();
        let saturday_noon = mountain(2026, 8, 29, 12, 0, 0);
        assert!(!is_within_call_hours(saturday_noon, &hours));

        hours.weekend_enabled = true;
        assert!(is_within_call_hours(saturday_noon, &hours));
        assert!(!is_within_call_hours(mountain(2026, 8, 29, 9, 59, 59), &hours));
        assert!(!is_within_call_hours(mountain(2026, 8, 29, 14, 0, 1), &hours));
    }

    #[test]
    fn invalid_timezone_falls_back_to_default_zone() {
        let hours = BusinessHoursConfig {
            timezone: "Mars/Olympus_Mons".into(),
            ..BusinessHoursConfig::default()
        };
        assert!(is_within_call_hours(mountain(2026, 8, 26, 10, 0, 0), &hours));
        assert!(!is_within_call_hours(mountain(2026, 8, 26, 17, 0, 0), &hours));
    }

    #[test]
    fn invalid_time_strings_fall_back_to_default_window() {
        let hours = BusinessHoursConfig {
            weekday_start: "nine thirty".into(),
            weekday_end: "25:99".into(),
            ..BusinessHoursConfig::default()
        };
        assert!(is_within_call_hours(mountain(2026, 8, 26, 9, 30, 0), &hours));
        assert!(!is_within_call_hours(mountain(2026, 8, 26, 16, 0, 1), &hours));
    }

    #[test]
    fn in_progress_override_respects_the_recency_window() {
        let hours = BusinessHoursConfig::default();
        let after_hours = mountain(2026, 8, 26, 20, 0, 0);

        let recent = entry(CallLogStatus::Started, after_hours - Duration::minutes(10));
        assert!(should_allow_call(after_hours, &hours, false, Some(&recent)));

        let stale = entry(CallLogStatus::Started, after_hours - Duration::minutes(45));
        assert!(!should_allow_call(after_hours, &hours, false, Some(&stale)));
    }

    #[test]
    fn only_active_statuses_count_as_in_progress() {
        let now = mountain(2026, 8, 26, 20, 0, 0);
        let completed = entry(CallLogStatus::Completed, now - Duration::minutes(5));
        assert!(!has_call_in_progress(now, Some(&completed)));

        let in_progress = entry(CallLogStatus::InProgress, now - Duration::minutes(5));
        assert!(has_call_in_progress(now, Some(&in_progress)));

        assert!(!has_call_in_progress(now, None));
    }

    #[test]
    fn test_mode_always_allows() {
        let hours = BusinessHoursConfig::default();
        assert!(should_allow_call(mountain(2026, 8, 26, 3, 0, 0), &hours, true, None));
    }

    #[test]
    fn bulk_check_ignores_test_mode_and_in_progress() {
        let hours = BusinessHoursConfig::default();
        let after_hours = mountain(2026, 8, 26, 20, 0, 0);
        // should_allow_call would say yes for both of these
        assert!(!is_within_call_hours(after_hours, &hours));
    }
}
