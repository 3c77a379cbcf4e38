//! Find-time use case: common free slots for a participant set.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{identities_or_outcome, SchedulingOutcome};
use crate::dates::parse_date_expr;
use crate::gateway::{CalendarGateway, RawSuggestion};
use crate::resolve::{ParticipantRef, ParticipantResolver};
use crate::types::{Confidence, Identity, TimeSlotSuggestion};
use crate::util::looks_like_email;

/// Availability states that make an attendee a conflict for a slot.
const CONFLICT_STATES: &[&str] = &["busy", "tentative", "oof"];

/// Default search window when no end date is given.
const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct FindTimeRequest {
    pub requester_id: String,
    pub participant_names: Vec<String>,
    pub subject: String,
    pub duration_minutes: u32,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindTimeData {
    pub slots: Vec<TimeSlotSuggestion>,
    pub subject: String,
    pub duration_minutes: u32,
    pub participants: Vec<Identity>,
}

/// Finds bookable time slots for a free-text participant list.
pub struct FindTimeAction {
    resolver: Arc<ParticipantResolver>,
    calendar: Arc<dyn CalendarGateway>,
}

impl FindTimeAction {
    pub fn new(resolver: Arc<ParticipantResolver>, calendar: Arc<dyn CalendarGateway>) -> Self {
        FindTimeAction { resolver, calendar }
    }

    pub async fn execute(&self, request: &FindTimeRequest) -> SchedulingOutcome<FindTimeData> {
        let (window_start, window_end) = search_window(
            request.start_date.as_deref(),
            request.end_date.as_deref(),
            Utc::now(),
        );

        // Raw emails skip the directory; everything else resolves.
        let mut participants: Vec<Identity> = Vec::new();
        let mut names: Vec<ParticipantRef> = Vec::new();
        for name in &request.participant_names {
            if looks_like_email(name) {
                participants.push(Identity::from_email(name.trim()));
            } else {
                names.push(ParticipantRef::name(name.clone()));
            }
        }

        let resolved = match identities_or_outcome(
            self.resolver
                .resolve_many(&names, Some(&request.requester_id))
                .await,
        ) {
            Ok(resolved) => resolved,
            Err(outcome) => return outcome,
        };
        participants.extend(resolved);

        let emails: Vec<String> = participants
            .iter()
            .filter_map(|participant| participant.email().map(str::to_owned))
            .collect();
        if emails.is_empty() {
            return SchedulingOutcome::Failure {
                message: "Не вдалося знайти жодного учасника з валідною поштою.".to_string(),
                resolved: participants,
            };
        }

        let suggestions = match self
            .calendar
            .suggest_meeting_times(
                &request.requester_id,
                &emails,
                window_start,
                window_end,
                request.duration_minutes,
            )
            .await
        {
            Ok(suggestions) => suggestions,
            Err(err) => {
                log::error!("meeting time search failed: {err}");
                return SchedulingOutcome::Failure {
                    message: err.to_string(),
                    resolved: participants,
                };
            }
        };

        let slots = map_suggestions(&suggestions, &participants);
        if slots.is_empty() {
            return SchedulingOutcome::Failure {
                message: "На жаль, не знайдено вільного часу для всіх учасників.".to_string(),
                resolved: participants,
            };
        }

        SchedulingOutcome::Success {
            data: FindTimeData {
                slots,
                subject: request.subject.clone(),
                duration_minutes: request.duration_minutes,
                participants,
            },
        }
    }
}

/// Resolve the search window from optional free-text bounds. The start
/// defaults to now, the end to start plus a week.
fn search_window(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let window_start = start.and_then(|text| parse_date_expr(text, now)).unwrap_or(now);
    let window_end = end
        .and_then(|text| parse_date_expr(text, now))
        .unwrap_or_else(|| window_start + Duration::days(DEFAULT_WINDOW_DAYS));
    (window_start, window_end)
}

/// Map raw suggestions into presentable slots, resolving busy attendees
/// back to full identities where possible. Suggestions without a complete
/// time slot are skipped.
fn map_suggestions(
    suggestions: &[RawSuggestion],
    participants: &[Identity],
) -> Vec<TimeSlotSuggestion> {
    let mut slots = Vec::new();
    for suggestion in suggestions {
        let Some(slot) = &suggestion.meeting_time_slot else {
            continue;
        };
        let start = slot.start.as_ref().and_then(|moment| moment.to_utc());
        let end = slot.end.as_ref().and_then(|moment| moment.to_utc());
        let (Some(start), Some(end)) = (start, end) else {
            log::warn!("skipping suggestion with incomplete time slot");
            continue;
        };

        let mut conflicts = Vec::new();
        for attendee in &suggestion.attendee_availability {
            let availability = attendee.availability.as_deref().unwrap_or("");
            if !CONFLICT_STATES.contains(&availability) {
                continue;
            }
            let Some(address) = attendee
                .email_address
                .as_ref()
                .map(|email| email.address.as_str())
                .filter(|address| !address.is_empty())
            else {
                continue;
            };

            let identity = participants
                .iter()
                .find(|participant| {
                    participant
                        .email()
                        .is_some_and(|email| email.eq_ignore_ascii_case(address))
                })
                .cloned()
                .unwrap_or_else(|| Identity::from_email(address));
            conflicts.push(identity);
        }

        slots.push(TimeSlotSuggestion {
            start,
            end,
            confidence: Confidence::from_score(suggestion.confidence),
            conflicts,
        });
    }
    slots
}
