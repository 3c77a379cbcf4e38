//! Book-meeting use case: resolve participants, parse the start, create the
//! event through the calendar gateway.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{identities_or_outcome, SchedulingOutcome};
use crate::dates::parse_date_expr;
use crate::gateway::{CalendarGateway, CreateEventRequest};
use crate::resolve::{ParticipantRef, ParticipantResolver};
use crate::types::{CreatedEvent, Identity};
use crate::util::looks_like_email;

#[derive(Debug, Clone)]
pub struct BookMeetingRequest {
    pub requester_id: String,
    pub participant_names: Vec<String>,
    pub subject: String,
    pub start: Option<String>,
    pub duration_minutes: u32,
    pub agenda: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeetingData {
    pub event: CreatedEvent,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub subject: String,
    pub participants: Vec<Identity>,
}

/// Books a meeting once the find-time flow (or the user) has settled on a
/// start time.
pub struct BookMeetingAction {
    resolver: Arc<ParticipantResolver>,
    calendar: Arc<dyn CalendarGateway>,
}

impl BookMeetingAction {
    pub fn new(resolver: Arc<ParticipantResolver>, calendar: Arc<dyn CalendarGateway>) -> Self {
        BookMeetingAction { resolver, calendar }
    }

    pub async fn execute(&self, request: &BookMeetingRequest) -> SchedulingOutcome<BookMeetingData> {
        let start_text = request.start.as_deref().unwrap_or("");
        let Some(start) = request
            .start
            .as_deref()
            .and_then(|text| parse_date_expr(text, Utc::now()))
        else {
            return SchedulingOutcome::failure(format!(
                "Не вдалося розпізнати дату початку зустрічі: '{start_text}'"
            ));
        };
        let end = start + Duration::minutes(i64::from(request.duration_minutes.max(1)));

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

        let create = CreateEventRequest {
            organizer_id: request.requester_id.clone(),
            attendee_emails: emails,
            subject: request.subject.clone(),
            start,
            end,
            body_html: None,
            agenda: request.agenda.clone(),
        };
        match self.calendar.create_event(&create).await {
            Ok(event) => SchedulingOutcome::Success {
                data: BookMeetingData {
                    event,
                    start,
                    end,
                    subject: request.subject.clone(),
                    participants,
                },
            },
            Err(err) => {
                log::error!("meeting creation failed: {err}");
                SchedulingOutcome::Failure {
                    message: err.to_string(),
                    resolved: participants,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::{DirectoryGateway, RawSuggestion};
    use crate::types::CalendarEvent;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn person(display: &str, mail: &str) -> Identity {
        Identity {
            id: Some(display.to_lowercase().replace(' ', "-")),
            display_name: display.to_string(),
            mail: Some(mail.to_string()),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct StubDirectory {
        exact: HashMap<String, Vec<Identity>>,
    }

    #[async_trait]
    impl DirectoryGateway for StubDirectory {
        async fn search_by_name(
            &self,
            term: &str,
            _limit: usize,
        ) -> Result<Vec<Identity>, GatewayError> {
            Ok(self.exact.get(&term.to_lowercase()).cloned().unwrap_or_default())
        }
        async fn search_by_prefix(&self, _: &str, _: usize) -> Result<Vec<Identity>, GatewayError> {
            Ok(Vec::new())
        }
        async fn search_by_surname_initial(
            &self,
            _: &str,
            _: usize,
        ) -> Result<Vec<Identity>, GatewayError> {
            Ok(Vec::new())
        }
        async fn get_by_id(&self, id: &str) -> Result<Identity, GatewayError> {
            Err(GatewayError::Api {
                status: 404,
                message: format!("user {id} not found"),
            })
        }
    }

    #[derive(Default)]
    struct StubCalendar {
        created: Mutex<Vec<CreateEventRequest>>,
        create_calls: AtomicUsize,
    }

    #[async_trait]
    impl CalendarGateway for StubCalendar {
        async fn get_events(
            &self,
            _: &str,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
            _: bool,
        ) -> Result<Vec<CalendarEvent>, GatewayError> {
            Ok(Vec::new())
        }
        async fn suggest_meeting_times(
            &self,
            _: &str,
            _: &[String],
            _: DateTime<Utc>,
            _: DateTime<Utc>,
            _: u32,
        ) -> Result<Vec<RawSuggestion>, GatewayError> {
            Ok(Vec::new())
        }
        async fn create_event(
            &self,
            request: &CreateEventRequest,
        ) -> Result<CreatedEvent, GatewayError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.created.lock().unwrap().push(request.clone());
            Ok(CreatedEvent {
                id: "evt-1".to_string(),
                web_link: Some("https://calendar.example.com/evt-1".to_string()),
                join_url: Some("https://meet.example.com/j/evt-1".to_string()),
            })
        }
    }

    fn request(start: Option<&str>) -> BookMeetingRequest {
        BookMeetingRequest {
            requester_id: "req-1".to_string(),
            participant_names: vec!["Anna Kovalenko".to_string()],
            subject: "Планування спринту".to_string(),
            start: start.map(str::to_string),
            duration_minutes: 45,
            agenda: None,
        }
    }

    #[tokio::test]
    async fn test_books_meeting_with_resolved_participants() {
        let mut directory = StubDirectory::default();
        directory.exact.insert(
            "anna kovalenko".to_string(),
            vec![person("Anna Kovalenko", "anna.k@corp.example.com")],
        );
        let calendar = Arc::new(StubCalendar::default());
        let action = BookMeetingAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(directory))),
            calendar.clone(),
        );

        let outcome = action.execute(&request(Some("2026-08-04T09:00:00"))).await;
        match outcome {
            SchedulingOutcome::Success { data } => {
                assert_eq!(data.event.id, "evt-1");
                assert_eq!(
                    data.start,
                    Utc.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap()
                );
                assert_eq!(data.end, data.start + Duration::minutes(45));
                assert!(data.event.join_url.is_some());
            }
            other => panic!("expected success, got {other:?}"),
        }
        let created = calendar.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].attendee_emails, vec!["anna.k@corp.example.com"]);
    }

    #[tokio::test]
    async fn test_unparseable_start_fails_without_calendar_call() {
        let calendar = Arc::new(StubCalendar::default());
        let action = BookMeetingAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(StubDirectory::default()))),
            calendar.clone(),
        );

        let outcome = action.execute(&request(Some("колись потім"))).await;
        match outcome {
            SchedulingOutcome::Failure { message, .. } => {
                assert!(message.contains("колись потім"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_start_fails() {
        let action = BookMeetingAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(StubDirectory::default()))),
            Arc::new(StubCalendar::default()),
        );
        let outcome = action.execute(&request(None)).await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_unresolvable_participant_aborts_booking() {
        let calendar = Arc::new(StubCalendar::default());
        let action = BookMeetingAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(StubDirectory::default()))),
            calendar.clone(),
        );

        let outcome = action.execute(&request(Some("2026-08-04T09:00:00"))).await;
        match outcome {
            SchedulingOutcome::Failure { message, .. } => {
                assert!(message.contains("Anna Kovalenko"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 0);
    }
}
