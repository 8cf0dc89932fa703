//! JSON codec for the persisted session snapshot.
//!
//! The record types mirror the domain `Session` so repositories can
//! serialize/deserialize without leaking storage concerns into the domain layer.

use chrono::{DateTime, Utc};
use quiz_core::model::{Session, SessionPhase, SessionStateError, Statement, StatementId, Ticket};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

/// Name under which the single snapshot is stored.
pub const SNAPSHOT_KEY: &str = "quiz_session_v1";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub phase: String,
    pub tickets: Vec<TicketRecord>,
    pub current_ticket_index: usize,
    pub running_score: u32,
    pub total_possible: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub statements: Vec<StatementRecord>,
    pub true_required: u32,
    pub selections: Vec<bool>,
    pub revealed: bool,
    pub score: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRecord {
    pub id: StatementId,
    pub text: String,
    pub is_true: bool,
}

impl SessionRecord {
    #[must_use]
    pub fn from_session(session: &Session, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION,
            saved_at,
            phase: session.phase().as_str().to_owned(),
            tickets: session.tickets().iter().map(TicketRecord::from_ticket).collect(),
            current_ticket_index: session.current_ticket_index(),
            running_score: session.running_score(),
            total_possible: session.total_possible(),
        }
    }

    /// Convert the record back into a domain `Session`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unknown version or phase, or
    /// when any ticket or session invariant does not hold.
    pub fn into_session(self) -> Result<Session, StorageError> {
        if self.version != FORMAT_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported snapshot version: {}",
                self.version
            )));
        }
        let phase = SessionPhase::parse(&self.phase).ok_or_else(|| {
            StorageError::Serialization(format!("invalid phase: {}", self.phase))
        })?;

        let tickets = self
            .tickets
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .into_ticket()
                    .map_err(|source| SessionStateError::Ticket { index, source })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(ser)?;

        Session::from_persisted(
            phase,
            tickets,
            self.current_ticket_index,
            self.running_score,
            self.total_possible,
        )
        .map_err(ser)
    }
}

impl TicketRecord {
    fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            statements: ticket
                .statements()
                .iter()
                .map(|s| StatementRecord {
                    id: s.id().clone(),
                    text: s.text().to_owned(),
                    is_true: s.is_true(),
                })
                .collect(),
            true_required: ticket.true_required(),
            selections: ticket.selections().to_vec(),
            revealed: ticket.is_revealed(),
            score: ticket.score(),
        }
    }

    fn into_ticket(self) -> Result<Ticket, quiz_core::model::TicketError> {
        let statements = self
            .statements
            .into_iter()
            .map(|s| Statement::new(s.id, s.text, s.is_true))
            .collect();
        Ticket::from_persisted(
            statements,
            self.true_required,
            self.selections,
            self.revealed,
            self.score,
        )
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Encode `session` as snapshot JSON stamped with the current time.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode(session: &Session) -> Result<String, StorageError> {
    serde_json::to_string(&SessionRecord::from_session(session, Utc::now())).map_err(ser)
}

/// Decode and validate snapshot JSON.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON, a missing or
/// mistyped field, or state that violates a session invariant.
pub fn decode(raw: &str) -> Result<Session, StorageError> {
    let record: SessionRecord = serde_json::from_str(raw).map_err(ser)?;
    record.into_session()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::SessionBuilder;
    use quiz_core::model::{PoolRecord, SessionConfig, TrueQuota};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config() -> SessionConfig {
        SessionConfig::new(3, 3, TrueQuota::new(1, 2).unwrap()).unwrap()
    }

    fn started() -> Session {
        let records: Vec<_> = (0..5)
            .map(|i| PoolRecord::labeled(format!("t{i}"), format!("true {i}"), true))
            .chain((0..5).map(|i| PoolRecord::labeled(format!("f{i}"), format!("false {i}"), false)))
            .collect();
        let tickets = SessionBuilder::new(config())
            .build(records, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let mut session = Session::idle(&config());
        session.start(tickets).unwrap();
        session
    }

    fn mark_ready(session: &mut Session) {
        let required = session.current_ticket().unwrap().true_required() as usize;
        for index in 0..required {
            session.toggle_selection(index).unwrap();
        }
    }

    #[test]
    fn round_trip_preserves_progress() {
        let mut session = started();
        mark_ready(&mut session);
        session.advance().unwrap();
        session.advance().unwrap();
        session.toggle_selection(1).unwrap();

        let decoded = decode(&encode(&session).unwrap()).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn round_trip_finished_and_idle() {
        let mut session = started();
        while session.phase() == SessionPhase::Active {
            if !session.current_ticket().unwrap().is_revealed() {
                mark_ready(&mut session);
            }
            session.advance().unwrap();
        }
        assert_eq!(decode(&encode(&session).unwrap()).unwrap(), session);

        session.reset(&config());
        assert_eq!(decode(&encode(&session).unwrap()).unwrap(), session);
    }

    #[test]
    fn encoded_fields_are_camel_case() {
        let encoded = encode(&started()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["phase"], "active");
        assert_eq!(value["currentTicketIndex"], 0);
        assert!(value["tickets"][0]["trueRequired"].is_number());
        assert!(value["tickets"][0]["statements"][0]["isTrue"].is_boolean());
    }

    #[test]
    fn rejects_missing_tickets() {
        let raw = r#"{"version":1,"savedAt":"2024-01-01T00:00:00Z","phase":"active",
            "currentTicketIndex":0,"runningScore":0,"totalPossible":3}"#;
        assert!(matches!(decode(raw), Err(StorageError::Serialization(_))));
    }

    #[test]
    fn rejects_non_numeric_index() {
        let mut value: serde_json::Value = serde_json::from_str(&encode(&started()).unwrap()).unwrap();
        value["currentTicketIndex"] = serde_json::Value::from("zero");
        assert!(decode(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_tampered_score() {
        let mut session = started();
        mark_ready(&mut session);
        session.advance().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&encode(&session).unwrap()).unwrap();
        value["runningScore"] = serde_json::Value::from(99);

        let err = decode(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("running score"));
    }

    #[test]
    fn rejects_unknown_phase() {
        let mut value: serde_json::Value = serde_json::from_str(&encode(&started()).unwrap()).unwrap();
        value["phase"] = serde_json::Value::from("quiz");
        assert!(decode(&value.to_string()).is_err());
    }
}
