use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use freshcut_core::calendar::{
    Attendee, CalendarError, CalendarEvent, CalendarSource, ResponseStatus,
};

const EVENTS_URL_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";
const MAX_EVENTS: u32 = 20;

/// Google Calendar v3 client. Decodes the wire shape into the core's typed
/// event model at this boundary; a missing required key is a decode error,
/// not a silent default.
pub struct GoogleCalendarSource {
    client: reqwest::Client,
    calendar_id: String,
    api_token: SecretString,
}

impl GoogleCalendarSource {
    pub fn new(calendar_id: impl Into<String>, api_token: SecretString) -> Self {
        Self { client: reqwest::Client::new(), calendar_id: calendar_id.into(), api_token }
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarSource {
    async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let url = format!("{EVENTS_URL_BASE}/{}/events", self.calendar_id);
        debug!(%url, %start, %end, "fetching calendar events");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token.expose_secret())
            .query(&[
                ("timeMin", start.to_rfc3339()),
                ("timeMax", end.to_rfc3339()),
                ("singleEvents", "true".to_owned()),
                ("orderBy", "startTime".to_owned()),
                ("maxResults", MAX_EVENTS.to_string()),
            ])
            .send()
            .await
            .map_err(|error| CalendarError::Fetch(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Fetch(status.to_string()));
        }

        let payload: EventsResponse = response
            .json()
            .await
            .map_err(|error| CalendarError::Decode(error.to_string()))?;

        payload.items.into_iter().map(CalendarEvent::try_from).collect()
    }
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<WireEvent>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    summary: String,
    #[serde(default)]
    description: Option<String>,
    start: WireEventTime,
    end: WireEventTime,
    #[serde(default)]
    attendees: Vec<WireAttendee>,
}

/// Timed events carry `dateTime`; all-day events carry `date` only.
#[derive(Debug, Deserialize)]
struct WireEventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<DateTime<Utc>>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct WireAttendee {
    email: String,
    #[serde(rename = "responseStatus")]
    response_status: Option<String>,
}

impl WireEventTime {
    fn resolve(self, context: &str) -> Result<DateTime<Utc>, CalendarError> {
        if let Some(date_time) = self.date_time {
            return Ok(date_time);
        }
        if let Some(date) = self.date {
            return Ok(date
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
                .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC));
        }
        Err(CalendarError::Decode(format!("event {context} time carries neither dateTime nor date")))
    }
}

impl TryFrom<WireEvent> for CalendarEvent {
    type Error = CalendarError;

    fn try_from(event: WireEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            summary: event.summary,
            description: event.description.unwrap_or_default(),
            start: event.start.resolve("start")?,
            end: event.end.resolve("end")?,
            attendees: event
                .attendees
                .into_iter()
                .map(|attendee| Attendee {
                    email: attendee.email,
                    response: attendee
                        .response_status
                        .as_deref()
                        .map(ResponseStatus::from_api)
                        .unwrap_or_default(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use freshcut_core::calendar::{CalendarError, CalendarEvent, ResponseStatus};

    use super::{EventsResponse, WireEvent};

    #[test]
    fn wire_event_decodes_timed_events_with_attendees() {
        let payload = r#"{
            "items": [{
                "summary": "D&D TC Session 12",
                "description": "The descent",
                "start": {"dateTime": "2026-08-13T19:00:00Z"},
                "end": {"dateTime": "2026-08-13T23:00:00Z"},
                "attendees": [
                    {"email": "zora@example.com", "responseStatus": "accepted"},
                    {"email": "brett@example.com", "responseStatus": "declined"},
                    {"email": "drew@example.com"}
                ]
            }]
        }"#;

        let decoded: EventsResponse = serde_json::from_str(payload).expect("decode");
        let event = CalendarEvent::try_from(decoded.items.into_iter().next().expect("one event"))
            .expect("convert");

        assert_eq!(event.summary, "D&D TC Session 12");
        assert_eq!(event.attendees.len(), 3);
        assert_eq!(event.attendees[0].response, ResponseStatus::Accepted);
        assert_eq!(event.attendees[2].response, ResponseStatus::NeedsAction);
    }

    #[test]
    fn all_day_events_fall_back_to_the_date_field() {
        let payload = r#"{
            "summary": "Festival",
            "start": {"date": "2026-08-13"},
            "end": {"date": "2026-08-14"}
        }"#;
        let wire: WireEvent = serde_json::from_str(payload).expect("decode");
        let event = CalendarEvent::try_from(wire).expect("convert");
        assert_eq!(event.start.to_rfc3339(), "2026-08-13T00:00:00+00:00");
        assert_eq!(event.description, "");
    }

    #[test]
    fn missing_summary_is_a_decode_error() {
        let payload = r#"{
            "start": {"dateTime": "2026-08-13T19:00:00Z"},
            "end": {"dateTime": "2026-08-13T23:00:00Z"}
        }"#;
        assert!(serde_json::from_str::<WireEvent>(payload).is_err());
    }

    #[test]
    fn event_without_any_time_fails_conversion() {
        let payload = r#"{
            "summary": "Ghost event",
            "start": {},
            "end": {}
        }"#;
        let wire: WireEvent = serde_json::from_str(payload).expect("decode");
        assert!(matches!(CalendarEvent::try_from(wire), Err(CalendarError::Decode(_))));
    }
}
