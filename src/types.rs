//! Shared domain types for the scheduling core.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A directory identity: one person, as the directory knows them.
///
/// Immutable once fetched; the core only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub id: Option<String>,
    pub display_name: String,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
}

impl Identity {
    /// Preferred addressable email: primary mail, else the principal name.
    pub fn email(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.user_principal_name.as_deref().filter(|u| !u.is_empty()))
    }

    /// Synthetic identity for a raw email with no directory record.
    pub fn from_email(email: &str) -> Self {
        Identity {
            display_name: email.to_string(),
            mail: Some(email.to_string()),
            ..Default::default()
        }
    }
}

/// Confidence label attached to oracle selections and slot suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Map the suggestion service's 0–100 score to a label.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= 75.0 => Confidence::High,
            Some(s) if s >= 50.0 => Confidence::Medium,
            Some(_) => Confidence::Low,
            None => Confidence::Medium,
        }
    }
}

/// Busy-state hint on a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShowAs {
    Free,
    Tentative,
    Busy,
    Oof,
    WorkingElsewhere,
    #[serde(other)]
    Unknown,
}

/// Sensitivity flag; `Private` subjects are redacted before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sensitivity {
    Normal,
    Personal,
    Private,
    Confidential,
    #[serde(other)]
    Unknown,
}

/// One boundary of a calendar event as the wire sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireMoment {
    pub date_time: String,
    pub time_zone: Option<String>,
}

impl WireMoment {
    pub fn new(date_time: impl Into<String>) -> Self {
        WireMoment {
            date_time: date_time.into(),
            time_zone: None,
        }
    }

    /// Parse into a UTC instant.
    ///
    /// Accepts RFC 3339 with any offset. Naive timestamps are interpreted in
    /// `time_zone` when it names an IANA zone, otherwise as UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_time.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return self.resolve_naive(naive);
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return self.resolve_naive(date.and_time(NaiveTime::MIN));
        }

        None
    }

    fn resolve_naive(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.zone() {
            Some(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            None => Some(Utc.from_utc_datetime(&naive)),
        }
    }

    fn zone(&self) -> Option<Tz> {
        let name = self.time_zone.as_deref()?.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("utc") {
            return None;
        }
        match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                log::debug!("unrecognized time zone '{name}', assuming UTC");
                None
            }
        }
    }
}

/// A raw calendar event, read-only input to the timeline builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub start: Option<WireMoment>,
    pub end: Option<WireMoment>,
    pub show_as: Option<ShowAs>,
    pub sensitivity: Option<Sensitivity>,
    pub is_cancelled: bool,
}

/// A bookable slot produced by the find-time flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotSuggestion {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub confidence: Confidence,
    /// Participants the suggestion service reports as busy, tentative, or
    /// out of office during this slot.
    pub conflicts: Vec<Identity>,
}

/// A created meeting, echoed back to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatedEvent {
    pub id: String,
    pub web_link: Option<String>,
    pub join_url: Option<String>,
}

/// A name that matched several directory candidates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousName {
    pub search_term: String,
    pub candidates: Vec<Identity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_identity_email_prefers_mail() {
        let identity = Identity {
            mail: Some("anna@corp.example.com".to_string()),
            user_principal_name: Some("anna.k@corp.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(identity.email(), Some("anna@corp.example.com"));
    }

    #[test]
    fn test_identity_email_falls_back_to_upn() {
        let identity = Identity {
            mail: Some(String::new()),
            user_principal_name: Some("anna.k@corp.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(identity.email(), Some("anna.k@corp.example.com"));
        assert_eq!(Identity::default().email(), None);
    }

    #[test]
    fn test_wire_moment_with_offset() {
        let moment = WireMoment::new("2026-08-03T12:00:00+02:00");
        let utc = moment.to_utc().unwrap();
        assert_eq!(utc.hour(), 10);
    }

    #[test]
    fn test_wire_moment_zulu() {
        let moment = WireMoment::new("2026-08-03T12:00:00Z");
        assert_eq!(moment.to_utc().unwrap().hour(), 12);
    }

    #[test]
    fn test_wire_moment_naive_defaults_to_utc() {
        let moment = WireMoment::new("2026-08-03T12:00:00.0000000");
        assert_eq!(moment.to_utc().unwrap().hour(), 12);
    }

    #[test]
    fn test_wire_moment_named_zone() {
        let moment = WireMoment {
            date_time: "2026-08-03T12:00:00".to_string(),
            time_zone: Some("Europe/Kyiv".to_string()),
        };
        // Kyiv is UTC+3 in August
        assert_eq!(moment.to_utc().unwrap().hour(), 9);
    }

    #[test]
    fn test_wire_moment_garbage() {
        assert_eq!(WireMoment::new("not a time").to_utc(), None);
        assert_eq!(WireMoment::new("").to_utc(), None);
    }

    #[test]
    fn test_confidence_from_score() {
        assert_eq!(Confidence::from_score(Some(90.0)), Confidence::High);
        assert_eq!(Confidence::from_score(Some(60.0)), Confidence::Medium);
        assert_eq!(Confidence::from_score(Some(10.0)), Confidence::Low);
        assert_eq!(Confidence::from_score(None), Confidence::Medium);
    }

    #[test]
    fn test_show_as_unknown_catchall() {
        let parsed: ShowAs = serde_json::from_str("\"somethingNew\"").unwrap();
        assert_eq!(parsed, ShowAs::Unknown);
        let oof: ShowAs = serde_json::from_str("\"oof\"").unwrap();
        assert_eq!(oof, ShowAs::Oof);
    }
}
