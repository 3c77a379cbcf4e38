//! Day timeline construction.
//!
//! Classifies a day into fixed slots (available / busy / out of office)
//! from raw calendar events, then compresses consecutive identical slots
//! into contiguous, presentable ranges.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{CalendarEvent, Sensitivity, ShowAs};

/// Subject keywords that mark an absence, checked case-insensitively.
const OUT_OF_OFFICE_KEYWORDS: &[&str] = &[
    "vacation",
    "out of office",
    "ooo",
    "sick",
    "відпустка",
    "відпустку",
    "відпуск",
    "лікарняний",
    "лікарняне",
];

const LABEL_FREE: &str = "✅ Вільний";
const LABEL_OOO_DEFAULT: &str = "🏖️ Відпустка";
const LABEL_BUSY_DEFAULT: &str = "📅 Зустріч";

/// Redaction labels for private events. The raw subject of a private event
/// must never reach the caller.
const GENERIC_BUSY: &str = "Busy";
const GENERIC_OOO: &str = "Out of Office";

/// Slot classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Busy,
    OutOfOffice,
}

/// One presentable stretch of the day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSlot {
    pub time_range: String,
    pub status: SlotStatus,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BusyPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    subject: String,
    status: SlotStatus,
}

/// Splits a day into fixed slots and groups the result.
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    slot_minutes: i64,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        TimelineBuilder { slot_minutes: 30 }
    }
}

impl TimelineBuilder {
    pub fn new(slot_minutes: u32) -> Self {
        TimelineBuilder {
            slot_minutes: i64::from(slot_minutes.max(1)),
        }
    }

    /// Build the grouped timeline covering `[day_start, day_end)`.
    ///
    /// Events with unparseable timestamps are logged and skipped; a
    /// degenerate window produces an empty timeline. The final slot is
    /// truncated to `day_end`.
    pub fn build(
        &self,
        events: &[CalendarEvent],
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Vec<TimelineSlot> {
        if day_end <= day_start {
            log::error!("invalid day window: {day_start} .. {day_end}");
            return Vec::new();
        }

        let periods = extract_busy_periods(events);

        let mut slots = Vec::new();
        let mut current = day_start;
        while current < day_end {
            let slot_end = (current + Duration::minutes(self.slot_minutes)).min(day_end);
            let (status, subject) = classify_slot(current, slot_end, &periods);
            slots.push(TimelineSlot {
                time_range: format_range(current, slot_end),
                status,
                subject: format_subject(status, &subject),
                start: current,
                end: slot_end,
            });
            current = slot_end;
        }

        group_slots(slots)
    }
}

/// Busy periods from raw events, sorted by start time. Cancelled events and
/// events without parseable times are skipped.
fn extract_busy_periods(events: &[CalendarEvent]) -> Vec<BusyPeriod> {
    let mut periods = Vec::new();
    for event in events {
        if event.is_cancelled {
            continue;
        }
        let start = event.start.as_ref().and_then(|m| m.to_utc());
        let end = event.end.as_ref().and_then(|m| m.to_utc());
        let (Some(start), Some(end)) = (start, end) else {
            log::warn!("skipping event with unparseable times: {:?}", event.subject);
            continue;
        };
        let (status, subject) = classify_event(event);
        periods.push(BusyPeriod {
            start,
            end,
            subject,
            status,
        });
    }
    periods.sort_by_key(|period| period.start);
    periods
}

/// Status and display subject for one event. Private events never leak
/// their real subject.
fn classify_event(event: &CalendarEvent) -> (SlotStatus, String) {
    let subject = event.subject.clone().unwrap_or_default();

    let mut out_of_office = matches!(event.show_as, Some(ShowAs::Oof));
    if !out_of_office && !subject.is_empty() {
        let subject_lower = subject.to_lowercase();
        out_of_office = OUT_OF_OFFICE_KEYWORDS
            .iter()
            .any(|keyword| subject_lower.contains(keyword));
    }
    let status = if out_of_office {
        SlotStatus::OutOfOffice
    } else {
        SlotStatus::Busy
    };

    let subject = if matches!(event.sensitivity, Some(Sensitivity::Private)) {
        match status {
            SlotStatus::OutOfOffice => GENERIC_OOO.to_string(),
            _ => GENERIC_BUSY.to_string(),
        }
    } else {
        subject
    };

    (status, subject)
}

/// First busy period that strictly overlaps the slot wins.
fn classify_slot(
    slot_start: DateTime<Utc>,
    slot_end: DateTime<Utc>,
    periods: &[BusyPeriod],
) -> (SlotStatus, String) {
    for period in periods {
        if slot_start < period.end && slot_end > period.start {
            return (period.status, period.subject.clone());
        }
    }
    (SlotStatus::Available, String::new())
}

fn format_subject(status: SlotStatus, subject: &str) -> String {
    match status {
        SlotStatus::Available => LABEL_FREE.to_string(),
        SlotStatus::OutOfOffice => {
            if subject.is_empty() || subject == GENERIC_OOO || subject == GENERIC_BUSY {
                LABEL_OOO_DEFAULT.to_string()
            } else {
                format!("🏖️ {subject}")
            }
        }
        SlotStatus::Busy => {
            if subject.is_empty() || subject == GENERIC_BUSY {
                LABEL_BUSY_DEFAULT.to_string()
            } else {
                format!("📅 {subject}")
            }
        }
    }
}

fn format_range(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

/// Merge adjacent slots with identical status and formatted subject.
fn group_slots(slots: Vec<TimelineSlot>) -> Vec<TimelineSlot> {
    let mut grouped: Vec<TimelineSlot> = Vec::new();
    for slot in slots {
        match grouped.last_mut() {
            Some(last)
                if last.status == slot.status
                    && last.subject == slot.subject
                    && last.end == slot.start =>
            {
                last.end = slot.end;
                last.time_range = format_range(last.start, last.end);
            }
            _ => grouped.push(slot),
        }
    }
    grouped
}
