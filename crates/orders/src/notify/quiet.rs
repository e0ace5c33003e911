//! Quiet-hours scheduling.
//!
//! Window membership is computed in minutes since local midnight in the
//! user's IANA timezone. `start` is inclusive, `end` is exclusive; a
//! window with `start > end` wraps midnight (e.g. 22:00-08:00).

use chrono::{DateTime, Days, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use maru_core::{NotificationPreferences, QuietHours};

/// Whether `now` falls inside the user's quiet window.
///
/// Absent or disabled quiet hours, and windows that fail to parse, are
/// never quiet.
#[must_use]
pub fn is_quiet_at(prefs: &NotificationPreferences, now: DateTime<Utc>) -> bool {
    let Some(quiet_hours) = &prefs.quiet_hours else {
        return false;
    };
    if !quiet_hours.enabled {
        return false;
    }
    let Some((tz, start, end)) = parse_window(quiet_hours) else {
        return false;
    };

    let now_minutes = minutes_since_midnight(now.with_timezone(&tz).time());
    let start_minutes = minutes_since_midnight(start);
    let end_minutes = minutes_since_midnight(end);

    if start_minutes > end_minutes {
        // Window wraps midnight
        now_minutes >= start_minutes || now_minutes < end_minutes
    } else {
        now_minutes >= start_minutes && now_minutes < end_minutes
    }
}

/// Convenience wrapper over [`is_quiet_at`] using the current time.
#[must_use]
pub fn is_quiet_now(prefs: &NotificationPreferences) -> bool {
    is_quiet_at(prefs, Utc::now())
}

/// Next eligible delivery instant: the next occurrence of the window's
/// `end` wall-clock time after `now`.
///
/// Callers are expected to have confirmed [`is_quiet_at`] first; outside
/// the window the result is still a future timestamp, just not a
/// meaningful schedule. Unparseable windows fall back to `now` + 1 day.
#[must_use]
pub fn next_delivery_after(prefs: &NotificationPreferences, now: DateTime<Utc>) -> DateTime<Utc> {
    let fallback = now + chrono::Duration::days(1);
    let Some(quiet_hours) = &prefs.quiet_hours else {
        return fallback;
    };
    let Some((tz, _, end)) = parse_window(quiet_hours) else {
        return fallback;
    };

    let local_now = now.with_timezone(&tz);
    let mut date = local_now.date_naive();
    // Skipped local times (DST spring-forward) can make a candidate
    // unrepresentable; step at most a couple of days before giving up.
    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(end)).earliest()
            && candidate > local_now
        {
            return candidate.with_timezone(&Utc);
        }
        match date.checked_add_days(Days::new(1)) {
            Some(next) => date = next,
            None => break,
        }
    }
    fallback
}

fn parse_window(quiet_hours: &QuietHours) -> Option<(Tz, NaiveTime, NaiveTime)> {
    let Ok(tz) = quiet_hours.timezone.parse::<Tz>() else {
        warn!(timezone = %quiet_hours.timezone, "unknown quiet-hours timezone, ignoring window");
        return None;
    };
    let Ok(start) = NaiveTime::parse_from_str(&quiet_hours.start, "%H:%M") else {
        warn!(start = %quiet_hours.start, "invalid quiet-hours start, ignoring window");
        return None;
    };
    let Ok(end) = NaiveTime::parse_from_str(&quiet_hours.end, "%H:%M") else {
        warn!(end = %quiet_hours.end, "invalid quiet-hours end, ignoring window");
        return None;
    };
    Some((tz, start, end))
}

fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

#[cfg(test)]
mod tests {
    use maru_core::QuietHours;

    use super::*;

    fn prefs_with_window(start: &str, end: &str, timezone: &str) -> NotificationPreferences {
        NotificationPreferences {
            quiet_hours: Some(QuietHours {
                enabled: true,
                start: start.to_string(),
                end: end.to_string(),
                timezone: timezone.to_string(),
            }),
            ..NotificationPreferences::default()
        }
    }

    /// Build a UTC instant that is `hh:mm` wall clock in Seoul (UTC+9,
    /// no DST).
    fn seoul_wall_clock(hh: u32, mm: u32) -> DateTime<Utc> {
        chrono_tz::Asia::Seoul
            .with_ymd_and_hms(2026, 3, 14, hh, mm, 0)
            .single()
            .expect("unambiguous Seoul time")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_wrapping_window_boundaries() {
        let prefs = prefs_with_window("22:00", "08:00", "Asia/Seoul");

        assert!(is_quiet_at(&prefs, seoul_wall_clock(23, 59)));
        assert!(is_quiet_at(&prefs, seoul_wall_clock(0, 0)));
        assert!(is_quiet_at(&prefs, seoul_wall_clock(7, 59)));
        assert!(is_quiet_at(&prefs, seoul_wall_clock(22, 0)));

        // end is exclusive; 21:59 is before start
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(8, 0)));
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(21, 59)));
    }

    #[test]
    fn test_non_wrapping_window() {
        let prefs = prefs_with_window("13:00", "15:00", "Asia/Seoul");

        assert!(is_quiet_at(&prefs, seoul_wall_clock(13, 0)));
        assert!(is_quiet_at(&prefs, seoul_wall_clock(14, 30)));
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(15, 0)));
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(12, 59)));
    }

    #[test]
    fn test_disabled_or_absent_window_never_quiet() {
        let mut prefs = prefs_with_window("22:00", "08:00", "Asia/Seoul");
        if let Some(quiet_hours) = prefs.quiet_hours.as_mut() {
            quiet_hours.enabled = false;
        }
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(23, 0)));

        assert!(!is_quiet_at(
            &NotificationPreferences::default(),
            seoul_wall_clock(23, 0)
        ));
    }

    #[test]
    fn test_unparseable_window_never_quiet() {
        let prefs = prefs_with_window("22:00", "08:00", "Mars/Olympus_Mons");
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(23, 0)));

        let prefs = prefs_with_window("25:99", "08:00", "Asia/Seoul");
        assert!(!is_quiet_at(&prefs, seoul_wall_clock(23, 0)));
    }

    #[test]
    fn test_next_delivery_rolls_forward_past_end() {
        let prefs = prefs_with_window("22:00", "08:00", "Asia/Seoul");

        // 23:00: today's 08:00 already passed, expect tomorrow 08:00
        let now = seoul_wall_clock(23, 0);
        let next = next_delivery_after(&prefs, now);
        let next_seoul = next.with_timezone(&chrono_tz::Asia::Seoul);
        assert_eq!(next_seoul.time(), NaiveTime::from_hms_opt(8, 0, 0).expect("time"));
        assert_eq!(next_seoul.date_naive(), now.with_timezone(&chrono_tz::Asia::Seoul).date_naive() + Days::new(1));
    }

    #[test]
    fn test_next_delivery_same_day_before_end() {
        let prefs = prefs_with_window("22:00", "08:00", "Asia/Seoul");

        // 06:30: still quiet, today's 08:00 is ahead
        let now = seoul_wall_clock(6, 30);
        let next = next_delivery_after(&prefs, now);
        let next_seoul = next.with_timezone(&chrono_tz::Asia::Seoul);
        assert_eq!(next_seoul.time(), NaiveTime::from_hms_opt(8, 0, 0).expect("time"));
        assert_eq!(
            next_seoul.date_naive(),
            now.with_timezone(&chrono_tz::Asia::Seoul).date_naive()
        );
    }

    #[test]
    fn test_next_delivery_is_always_future() {
        let prefs = prefs_with_window("22:00", "08:00", "Asia/Seoul");
        let now = seoul_wall_clock(12, 0); // outside the window
        assert!(next_delivery_after(&prefs, now) > now);
    }
}
