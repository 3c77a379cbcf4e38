//! View-schedule use case: one employee's day as a grouped timeline.

use std::sync::Arc;

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use super::SchedulingOutcome;
use crate::dates::parse_date_expr;
use crate::gateway::CalendarGateway;
use crate::resolve::{ParticipantResolver, SearchOutcome};
use crate::timeline::{TimelineBuilder, TimelineSlot};
use crate::types::{AmbiguousName, CalendarEvent, Identity};

#[derive(Debug, Clone, Default)]
pub struct ViewScheduleRequest {
    pub requester_id: String,
    pub employee_id: Option<String>,
    pub employee_name: Option<String>,
    pub date: Option<String>,
    /// When set, the response includes the grouped day timeline.
    pub detailed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewScheduleData {
    pub events: Vec<CalendarEvent>,
    pub timeline: Vec<TimelineSlot>,
    pub date: String,
    pub employee_id: String,
    pub employee_name: Option<String>,
}

/// Shows one day of an employee's calendar, resolved by name when needed.
pub struct ViewScheduleAction {
    resolver: Arc<ParticipantResolver>,
    calendar: Arc<dyn CalendarGateway>,
    timeline: TimelineBuilder,
}

impl ViewScheduleAction {
    pub fn new(resolver: Arc<ParticipantResolver>, calendar: Arc<dyn CalendarGateway>) -> Self {
        ViewScheduleAction {
            resolver,
            calendar,
            timeline: TimelineBuilder::default(),
        }
    }

    pub fn with_timeline(mut self, timeline: TimelineBuilder) -> Self {
        self.timeline = timeline;
        self
    }

    pub async fn execute(
        &self,
        request: &ViewScheduleRequest,
    ) -> SchedulingOutcome<ViewScheduleData> {
        let mut employee: Option<Identity> = None;
        let mut target_id = request.employee_id.clone();

        // Explicit id wins; otherwise resolve the name; otherwise the
        // requester looks at their own schedule.
        if target_id.is_none() {
            if let Some(name) = request
                .employee_name
                .as_deref()
                .filter(|name| !name.trim().is_empty())
            {
                match self.resolver.resolve_one(name).await {
                    Ok(SearchOutcome::Resolved(identity)) => {
                        target_id = identity.id.clone();
                        employee = Some(identity);
                    }
                    Ok(SearchOutcome::Ambiguous { term, candidates }) => {
                        return SchedulingOutcome::NeedsDisambiguation {
                            resolved: Vec::new(),
                            pending: vec![AmbiguousName {
                                search_term: term,
                                candidates,
                            }],
                        };
                    }
                    Ok(SearchOutcome::Failed { reason }) => {
                        return SchedulingOutcome::failure(reason);
                    }
                    Err(err) => {
                        log::error!("employee resolution failed for '{name}': {err}");
                        return SchedulingOutcome::failure(format!(
                            "Помилка пошуку користувача: {err}"
                        ));
                    }
                }
            }
        }
        let target_id = target_id.unwrap_or_else(|| request.requester_id.clone());

        let day = request
            .date
            .as_deref()
            .and_then(|text| parse_date_expr(text, Utc::now()))
            .unwrap_or_else(Utc::now);
        let day_start = Utc.from_utc_datetime(&day.date_naive().and_time(NaiveTime::MIN));
        let day_end = day_start + Duration::days(1);

        let events = match self
            .calendar
            .get_events(&target_id, day_start, day_end, request.detailed)
            .await
        {
            Ok(events) => events,
            Err(err) => {
                log::error!("schedule fetch failed for {target_id}: {err}");
                return SchedulingOutcome::failure(err.to_string());
            }
        };

        let timeline = if request.detailed {
            self.timeline.build(&events, day_start, day_end)
        } else {
            Vec::new()
        };

        let employee_name = employee.map(|identity| identity.display_name);
        SchedulingOutcome::Success {
            data: ViewScheduleData {
                events,
                timeline,
                date: day.to_rfc3339(),
                employee_id: target_id,
                employee_name,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::{CreateEventRequest, DirectoryGateway, RawSuggestion};
    use crate::timeline::SlotStatus;
    use crate::types::{CreatedEvent, WireMoment};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn person(display: &str, id: &str) -> Identity {
        Identity {
            id: Some(id.to_string()),
            display_name: display.to_string(),
            mail: Some(format!("{id}@corp.example.com")),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct StubDirectory {
        exact: HashMap<String, Vec<Identity>>,
        prefix: HashMap<String, Vec<Identity>>,
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
        async fn search_by_prefix(
            &self,
            term: &str,
            _limit: usize,
        ) -> Result<Vec<Identity>, GatewayError> {
            Ok(self.prefix.get(&term.to_lowercase()).cloned().unwrap_or_default())
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

    /// Calendar stub that records the user ids it was asked about.
    #[derive(Default)]
    struct StubCalendar {
        events: Vec<CalendarEvent>,
        asked_for: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CalendarGateway for StubCalendar {
        async fn get_events(
            &self,
            user_id: &str,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
            _: bool,
        ) -> Result<Vec<CalendarEvent>, GatewayError> {
            self.asked_for.lock().unwrap().push(user_id.to_string());
            Ok(self.events.clone())
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
            _: &CreateEventRequest,
        ) -> Result<CreatedEvent, GatewayError> {
            Ok(CreatedEvent::default())
        }
    }

    fn busy_event(subject: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            subject: Some(subject.to_string()),
            start: Some(WireMoment::new(start)),
            end: Some(WireMoment::new(end)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resolves_employee_by_name_and_builds_timeline() {
        let mut directory = StubDirectory::default();
        directory.exact.insert(
            "anna kovalenko".to_string(),
            vec![person("Anna Kovalenko", "u-anna")],
        );
        let calendar = Arc::new(StubCalendar {
            events: vec![busy_event(
                "Планування",
                "2026-08-03T10:00:00Z",
                "2026-08-03T11:00:00Z",
            )],
            ..Default::default()
        });
        let action = ViewScheduleAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(directory))),
            calendar.clone(),
        );

        let outcome = action
            .execute(&ViewScheduleRequest {
                requester_id: "req-1".to_string(),
                employee_name: Some("Anna Kovalenko".to_string()),
                date: Some("2026-08-03".to_string()),
                detailed: true,
                ..Default::default()
            })
            .await;

        match outcome {
            SchedulingOutcome::Success { data } => {
                assert_eq!(data.employee_id, "u-anna");
                assert_eq!(data.employee_name.as_deref(), Some("Anna Kovalenko"));
                assert!(!data.timeline.is_empty());
                assert!(data
                    .timeline
                    .iter()
                    .any(|slot| slot.status == SlotStatus::Busy));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(*calendar.asked_for.lock().unwrap(), vec!["u-anna".to_string()]);
    }

    #[tokio::test]
    async fn test_defaults_to_requester_schedule() {
        let calendar = Arc::new(StubCalendar::default());
        let action = ViewScheduleAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(StubDirectory::default()))),
            calendar.clone(),
        );

        let outcome = action
            .execute(&ViewScheduleRequest {
                requester_id: "req-1".to_string(),
                ..Default::default()
            })
            .await;
        assert!(outcome.is_success());
        assert_eq!(*calendar.asked_for.lock().unwrap(), vec!["req-1".to_string()]);
    }

    #[tokio::test]
    async fn test_ambiguous_employee_needs_disambiguation() {
        let mut directory = StubDirectory::default();
        directory.prefix.insert(
            "anna".to_string(),
            vec![
                person("Anna Kovalenko", "u-1"),
                person("Anna Shevchenko", "u-2"),
            ],
        );
        let action = ViewScheduleAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(directory))),
            Arc::new(StubCalendar::default()),
        );

        let outcome = action
            .execute(&ViewScheduleRequest {
                requester_id: "req-1".to_string(),
                employee_name: Some("Anna".to_string()),
                ..Default::default()
            })
            .await;
        match outcome {
            SchedulingOutcome::NeedsDisambiguation { pending, .. } => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].candidates.len(), 2);
            }
            other => panic!("expected disambiguation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_employee_fails_with_term() {
        let action = ViewScheduleAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(StubDirectory::default()))),
            Arc::new(StubCalendar::default()),
        );

        let outcome = action
            .execute(&ViewScheduleRequest {
                requester_id: "req-1".to_string(),
                employee_name: Some("Nobody Anywhere".to_string()),
                ..Default::default()
            })
            .await;
        match outcome {
            SchedulingOutcome::Failure { message, .. } => {
                assert!(message.contains("Nobody Anywhere"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shallow_request_skips_timeline() {
        let calendar = Arc::new(StubCalendar {
            events: vec![busy_event(
                "Планування",
                "2026-08-03T10:00:00Z",
                "2026-08-03T11:00:00Z",
            )],
            ..Default::default()
        });
        let action = ViewScheduleAction::new(
            Arc::new(ParticipantResolver::new(Arc::new(StubDirectory::default()))),
            calendar,
        );

        let outcome = action
            .execute(&ViewScheduleRequest {
                requester_id: "req-1".to_string(),
                detailed: false,
                ..Default::default()
            })
            .await;
        match outcome {
            SchedulingOutcome::Success { data } => {
                assert_eq!(data.events.len(), 1);
                assert!(data.timeline.is_empty());
            }
            other => panic!("expected success, got {other:?}"),
        }
    }
}
