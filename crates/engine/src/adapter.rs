//! Boundary adaptation of upstream event payloads.
//!
//! The upstream exports events under several alternate field spellings.
//! All of them are folded into the canonical [`Event`] here, so the
//! core never branches on key names internally.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use precontrack_core_types::{CandidateId, Event, ProcessStatus};
use serde::Deserialize;
use tracing::warn;

/// Duck-typed upstream event as it arrives over the wire.
#[derive(Clone, Debug, Deserialize)]
pub struct RawEvent {
    #[serde(alias = "candidateId", alias = "idCandidato", alias = "candidato")]
    pub candidate_id: String,
    #[serde(alias = "etapa")]
    pub stage: String,
    #[serde(alias = "fase", alias = "nombreFase")]
    pub phase: String,
    #[serde(alias = "eventType", alias = "tipoEvento", alias = "evento", alias = "tipo")]
    pub event_type: String,
    #[serde(default, alias = "estado")]
    pub status: Option<String>,
    #[serde(
        default,
        alias = "timestamp",
        alias = "fecha",
        alias = "fechaEvento",
        alias = "date"
    )]
    pub recorded_at: Option<String>,
    #[serde(default, alias = "intento")]
    pub attempt: Option<u32>,
    #[serde(default, alias = "responsable")]
    pub responsible: Option<String>,
    #[serde(default, alias = "observaciones", alias = "nota")]
    pub notes: Option<String>,
}

impl RawEvent {
    pub fn into_event(self) -> Event {
        let timestamp = self.recorded_at.as_deref().and_then(parse_timestamp);
        if timestamp.is_none() {
            if let Some(raw) = self.recorded_at.as_deref() {
                if !raw.trim().is_empty() {
                    warn!(raw = %raw, "unparseable event timestamp treated as absent");
                }
            }
        }
        Event {
            candidate_id: CandidateId(self.candidate_id),
            stage: self.stage,
            phase: self.phase,
            event_type: self.event_type,
            status: self
                .status
                .as_deref()
                .map(ProcessStatus::from_upstream)
                .unwrap_or(ProcessStatus::InProgress),
            timestamp,
            attempt: self.attempt.unwrap_or(1),
            responsible: self.responsible,
            notes: self.notes,
        }
    }
}

pub fn adapt_events(raw: Vec<RawEvent>) -> Vec<Event> {
    raw.into_iter().map(RawEvent::into_event).collect()
}

/// Accepts RFC 3339 plus the date-only forms the upstream emits.
/// Anything else counts as absent; the engine never substitutes "now"
/// for a broken timestamp.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&ts));
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_fold_into_canonical_event() {
        let raw: RawEvent = serde_json::from_str(
            r#"{
                "idCandidato": "c-1",
                "etapa": "Revisión",
                "fase": "10 Revisión",
                "tipoEvento": "Radicación",
                "estado": "En proceso",
                "fecha": "2024-01-01"
            }"#,
        )
        .expect("raw event");
        let event = raw.into_event();
        assert_eq!(event.candidate_id.0, "c-1");
        assert_eq!(event.stage, "Revisión");
        assert_eq!(event.status, ProcessStatus::InProgress);
        assert_eq!(event.attempt, 1);
        assert!(event.timestamp.is_some());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-01-01").is_some());
        assert!(parse_timestamp("15/02/2024").is_some());
        assert!(parse_timestamp("2024-01-01T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-01 10:30:00").is_some());
        assert!(parse_timestamp("no es fecha").is_none());
    }

    #[test]
    fn test_unparseable_timestamp_is_absent() {
        let raw: RawEvent = serde_json::from_str(
            r#"{
                "candidate_id": "c-2",
                "stage": "Revisión",
                "phase": "10 Revisión",
                "event_type": "Radicación",
                "fecha": "mañana"
            }"#,
        )
        .expect("raw event");
        let event = raw.into_event();
        assert!(event.timestamp.is_none());
    }
}
