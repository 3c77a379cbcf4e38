//! Calendar reads and meeting-time operations over the Graph events API.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{Collection, GraphClient};
use crate::error::GatewayError;
use crate::gateway::{CalendarGateway, CreateEventRequest, RawSuggestion};
use crate::types::{CalendarEvent, CreatedEvent};

const EVENT_FIELDS: &str = "id,start,end,showAs,sensitivity,isCancelled";

/// Production `CalendarGateway` backed by the Graph calendar API.
pub struct GraphCalendar {
    client: GraphClient,
}

impl GraphCalendar {
    pub fn new(client: GraphClient) -> Self {
        GraphCalendar { client }
    }
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn attendee_payload(emails: &[String]) -> Vec<serde_json::Value> {
    emails
        .iter()
        .map(|email| {
            json!({
                "emailAddress": { "address": email },
                "type": "required",
            })
        })
        .collect()
}

#[async_trait]
impl CalendarGateway for GraphCalendar {
    async fn get_events(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_details: bool,
    ) -> Result<Vec<CalendarEvent>, GatewayError> {
        let mut select = EVENT_FIELDS.to_string();
        if include_details {
            select.push_str(",subject");
        }

        let response: Collection<CalendarEvent> = self
            .client
            .get(
                &format!("users/{user_id}/calendarView"),
                &[
                    ("startDateTime", iso(start)),
                    ("endDateTime", iso(end)),
                    ("$top", "50".to_string()),
                    ("$orderby", "start/dateTime".to_string()),
                    ("$select", select),
                ],
                false,
            )
            .await?;
        Ok(response.value)
    }

    async fn suggest_meeting_times(
        &self,
        organizer_id: &str,
        attendee_emails: &[String],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<Vec<RawSuggestion>, GatewayError> {
        let body = json!({
            "attendees": attendee_payload(attendee_emails),
            "timeConstraint": {
                "timeslots": [{
                    "start": { "dateTime": iso(window_start), "timeZone": "UTC" },
                    "end": { "dateTime": iso(window_end), "timeZone": "UTC" },
                }]
            },
            "meetingDuration": format!("PT{duration_minutes}M"),
            "maxCandidates": 10,
            "isOrganizerOptional": false,
        });

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SuggestionsResponse {
            #[serde(default)]
            meeting_time_suggestions: Vec<RawSuggestion>,
        }

        let response: SuggestionsResponse = self
            .client
            .post(&format!("users/{organizer_id}/findMeetingTimes"), &body)
            .await?;
        Ok(response.meeting_time_suggestions)
    }

    async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<CreatedEvent, GatewayError> {
        let mut content = request
            .body_html
            .clone()
            .unwrap_or_else(|| "<p>Зустріч заплановано асистентом Kolega</p>".to_string());
        if let Some(agenda) = request.agenda.as_deref().filter(|a| !a.is_empty()) {
            content.push_str(&format!(
                "<br/><h3>Порядок денний:</h3><p>{}</p>",
                agenda.replace('\n', "<br>")
            ));
        }

        let body = json!({
            "subject": request.subject,
            "body": { "contentType": "html", "content": content },
            "start": { "dateTime": iso(request.start), "timeZone": "UTC" },
            "end": { "dateTime": iso(request.end), "timeZone": "UTC" },
            "attendees": attendee_payload(&request.attendee_emails),
            "isOnlineMeeting": true,
            "onlineMeetingProvider": "teamsForBusiness",
        });

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct EventResponse {
            #[serde(default)]
            id: String,
            web_link: Option<String>,
            online_meeting: Option<OnlineMeeting>,
        }

        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OnlineMeeting {
            join_url: Option<String>,
        }

        let response: EventResponse = self
            .client
            .post(&format!("users/{}/events", request.organizer_id), &body)
            .await?;
        Ok(CreatedEvent {
            id: response.id,
            web_link: response.web_link,
            join_url: response.online_meeting.and_then(|meeting| meeting.join_url),
        })
    }
}
