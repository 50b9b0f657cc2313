use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fmt::Display;

const DATE_FORMAT: &str = "%a, %b %-d, %I:%M %p";
const NEXT_RUN_FORMAT: &str = "%b %-d, %I:%M %p";

/// Parse the timestamp shapes the remote services emit. Naive timestamps are
/// taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Timezone used to render timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayZone {
    Local,
    Utc,
    Named(chrono_tz::Tz),
}

impl DisplayZone {
    pub fn parse(name: Option<&str>) -> Result<Self> {
        match name.map(str::trim) {
            None | Some("") | Some("local") => Ok(DisplayZone::Local),
            Some("UTC") | Some("utc") => Ok(DisplayZone::Utc),
            Some(other) => other
                .parse::<chrono_tz::Tz>()
                .map(DisplayZone::Named)
                .map_err(|e| anyhow!("Unknown timezone '{}': {}", other, e)),
        }
    }

    fn render(&self, instant: DateTime<Utc>, fmt: &str) -> String {
        match self {
            DisplayZone::Local => render_in(instant, &chrono::Local, fmt),
            DisplayZone::Utc => render_in(instant, &Utc, fmt),
            DisplayZone::Named(tz) => render_in(instant, tz, fmt),
        }
    }

    /// `Sun, Oct 18, 04:30 PM`, or the input unchanged when it is not a timestamp.
    pub fn format_date(&self, s: &str) -> String {
        match parse_timestamp(s) {
            Some(instant) => self.render(instant, DATE_FORMAT),
            None => s.to_string(),
        }
    }

    /// Countdown to the next run: `in Xh Ym` within a day, an absolute date
    /// beyond that.
    pub fn format_next_run(&self, next_run: Option<&str>, now: DateTime<Utc>) -> String {
        let next_run = match next_run {
            Some(s) if !s.is_empty() && s != crate::NOT_SCHEDULED => s,
            _ => return crate::NOT_SCHEDULED.to_string(),
        };
        let Some(instant) = parse_timestamp(next_run) else {
            return crate::NOT_SCHEDULED.to_string();
        };

        let diff = instant - now;
        if diff < chrono::Duration::zero() {
            return "Pending...".to_string();
        }

        let hours = diff.num_hours();
        let minutes = diff.num_minutes() % 60;
        if hours > 24 {
            return self.render(instant, NEXT_RUN_FORMAT);
        }
        format!("in {}h {}m", hours, minutes)
    }
}

fn render_in<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format(fmt).to_string()
}

pub fn pluralize_tasks(n: usize) -> String {
    if n == 1 { "1 task".to_string() } else { format!("{} tasks", n) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_and_naive() {
        assert_eq!(parse_timestamp("2026-10-18T12:00:00Z"), Some(now()));
        assert_eq!(parse_timestamp("2026-10-18T14:00:00+02:00"), Some(now()));
        assert_eq!(parse_timestamp("2026-10-18T12:00:00.000"), Some(now()));
        assert_eq!(parse_timestamp("2026-10-18 12:00:00"), Some(now()));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn format_date_in_utc() {
        let zone = DisplayZone::Utc;
        assert_eq!(zone.format_date("2026-10-18T16:30:00Z"), "Sun, Oct 18, 04:30 PM");
        assert_eq!(zone.format_date("not a date"), "not a date");
    }

    #[test]
    fn format_date_in_named_zone() {
        let zone = DisplayZone::parse(Some("America/New_York")).unwrap();
        assert_eq!(zone.format_date("2026-10-18T20:30:00Z"), "Sun, Oct 18, 04:30 PM");
    }

    #[test]
    fn next_run_countdown_within_a_day() {
        let zone = DisplayZone::Utc;
        assert_eq!(zone.format_next_run(Some("2026-10-18T16:30:00Z"), now()), "in 4h 30m");
        assert_eq!(zone.format_next_run(Some("2026-10-19T12:59:00Z"), now()), "in 24h 59m");
    }

    #[test]
    fn next_run_beyond_a_day_is_absolute() {
        let zone = DisplayZone::Utc;
        assert_eq!(zone.format_next_run(Some("2026-10-20T16:30:00Z"), now()), "Oct 20, 04:30 PM");
        assert_eq!(zone.format_next_run(Some("2026-10-19T13:00:00Z"), now()), "Oct 19, 01:00 PM");
    }

    #[test]
    fn next_run_in_past_is_pending() {
        assert_eq!(
            DisplayZone::Utc.format_next_run(Some("2026-10-18T11:00:00Z"), now()),
            "Pending..."
        );
    }

    #[test]
    fn missing_or_invalid_next_run() {
        let zone = DisplayZone::Utc;
        assert_eq!(zone.format_next_run(None, now()), "Not scheduled");
        assert_eq!(zone.format_next_run(Some(""), now()), "Not scheduled");
        assert_eq!(zone.format_next_run(Some("Not scheduled"), now()), "Not scheduled");
        assert_eq!(zone.format_next_run(Some("soon"), now()), "Not scheduled");
    }

    #[test]
    fn zone_parsing() {
        assert_eq!(DisplayZone::parse(None).unwrap(), DisplayZone::Local);
        assert_eq!(DisplayZone::parse(Some("UTC")).unwrap(), DisplayZone::Utc);
        assert!(DisplayZone::parse(Some("Mars/Olympus")).is_err());
    }

    #[test]
    fn task_count_label() {
        assert_eq!(pluralize_tasks(1), "1 task");
        assert_eq!(pluralize_tasks(0), "0 tasks");
        assert_eq!(pluralize_tasks(5), "5 tasks");
    }
}
