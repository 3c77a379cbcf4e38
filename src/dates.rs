//! Free-text date expression parsing.
//!
//! Handles the date vocabulary the intent pipeline extracts: ISO dates and
//! datetimes, dd.mm.yyyy / dd/mm/yyyy / mm/dd/yyyy, "today" / "tomorrow",
//! bare weekday names, and "next <weekday>", in English and Ukrainian.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

/// Weekday names, Monday = 0. Ukrainian entries include the accusative
/// forms the intent pipeline tends to produce ("у середу").
const WEEKDAYS: &[(&str, u32)] = &[
    ("monday", 0),
    ("tuesday", 1),
    ("wednesday", 2),
    ("thursday", 3),
    ("friday", 4),
    ("saturday", 5),
    ("sunday", 6),
    ("понеділок", 0),
    ("вівторок", 1),
    ("середа", 2),
    ("середу", 2),
    ("четвер", 3),
    ("п'ятниця", 4),
    ("п'ятницю", 4),
    ("субота", 5),
    ("суботу", 5),
    ("неділя", 6),
    ("неділю", 6),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse a free-text date expression relative to `reference`.
///
/// "tomorrow" keeps the reference clock time; "today" and weekday
/// references snap to midnight, matching how people phrase day-level
/// requests. Returns `None` for anything unrecognized.
pub fn parse_date_expr(input: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = input.trim();
    if raw.is_empty() {
        return None;
    }
    let text = raw.to_lowercase();

    if matches!(text.as_str(), "tomorrow" | "завтра") {
        return Some(reference + Duration::days(1));
    }
    if matches!(text.as_str(), "today" | "сьогодні") {
        return Some(midnight(reference));
    }

    static NEXT_RE: OnceLock<Regex> = OnceLock::new();
    let next_re = NEXT_RE.get_or_init(|| {
        Regex::new(r"^(?:next|наступний|наступна|наступну)\s+([\w']+)$").expect("valid regex")
    });
    if let Some(caps) = next_re.captures(&text) {
        if let Some(target) = weekday_index(&caps[1]) {
            let mut ahead = days_ahead(reference, target);
            if ahead == 0 {
                // Today is that day; "next" means the following week.
                ahead = 7;
            }
            return Some(midnight(reference + Duration::days(ahead)));
        }
    }

    for (name, target) in WEEKDAYS {
        if text == *name || text.ends_with(name) {
            let ahead = days_ahead(reference, *target);
            return Some(midnight(reference + Duration::days(ahead)));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    log::warn!("unparseable date expression: {input:?}");
    None
}

/// Days from `reference` to the next occurrence of `target` (0 = today).
fn days_ahead(reference: DateTime<Utc>, target: u32) -> i64 {
    let current = reference.weekday().num_days_from_monday();
    i64::from((target + 7 - current) % 7)
}

fn weekday_index(name: &str) -> Option<u32> {
    WEEKDAYS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, index)| *index)
}

fn midnight(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&dt.date_naive().and_time(NaiveTime::MIN))
}
