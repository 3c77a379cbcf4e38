//! Collaborator ports: the external services the core talks to.
//!
//! Each port is a trait with one production implementation (`graph`, `ai`)
//! and in-memory stubs in tests. Network-level retry and timeout policy
//! lives behind these traits, never in front of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::types::{CalendarEvent, Confidence, CreatedEvent, Identity, WireMoment};

/// Directory lookups for people.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Name search across display name, mail, and principal name.
    async fn search_by_name(&self, term: &str, limit: usize)
        -> Result<Vec<Identity>, GatewayError>;

    /// Starts-with search across display name, given name, surname, mail.
    async fn search_by_prefix(&self, term: &str, limit: usize)
        -> Result<Vec<Identity>, GatewayError>;

    /// Last-resort search on the first letter of the surname.
    async fn search_by_surname_initial(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Identity>, GatewayError>;

    /// Fetch one identity by stable id.
    async fn get_by_id(&self, id: &str) -> Result<Identity, GatewayError>;
}

/// An oracle pick plus how sure it is.
#[derive(Debug, Clone)]
pub struct OracleSelection {
    pub identity: Identity,
    pub confidence: Confidence,
}

/// AI-backed disambiguation over a short candidate list.
#[async_trait]
pub trait DisambiguationOracle: Send + Sync {
    /// Pick the best candidate for `term`, or `None` when no candidate
    /// stands out.
    async fn select_best_match(
        &self,
        term: &str,
        candidates: &[Identity],
    ) -> Result<Option<OracleSelection>, GatewayError>;
}

/// Raw meeting-time suggestion as the calendar service sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSuggestion {
    pub meeting_time_slot: Option<RawTimeSlot>,
    pub confidence: Option<f64>,
    pub attendee_availability: Vec<RawAttendeeAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTimeSlot {
    pub start: Option<WireMoment>,
    pub end: Option<WireMoment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAttendeeAvailability {
    pub email_address: Option<RawEmailAddress>,
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEmailAddress {
    pub address: String,
}

/// Parameters for creating a meeting.
#[derive(Debug, Clone)]
pub struct CreateEventRequest {
    pub organizer_id: String,
    pub attendee_emails: Vec<String>,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub body_html: Option<String>,
    pub agenda: Option<String>,
}

/// Calendar reads and meeting-time operations.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Raw events for one user in `[start, end)`.
    async fn get_events(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_details: bool,
    ) -> Result<Vec<CalendarEvent>, GatewayError>;

    /// Meeting-time suggestions for an attendee set inside a window.
    async fn suggest_meeting_times(
        &self,
        organizer_id: &str,
        attendee_emails: &[String],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<Vec<RawSuggestion>, GatewayError>;

    /// Create a meeting on the organizer's calendar.
    async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<CreatedEvent, GatewayError>;
}

/// Bearer-token source for the REST gateways. Token acquisition and refresh
/// are the host application's concern.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, GatewayError>;
}

/// Fixed token, for tests and short-lived tools.
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, GatewayError> {
        Ok(self.0.clone())
    }
}
