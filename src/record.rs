//! Local record projections.
//!
//! A [`LocalRecord`] is the persisted projection of one remote envelope's
//! payload plus its identity. Identity is unique within a domain's store.
//! Records are created on first sight of an identity, overwritten in place
//! on every subsequent sight, and deleted only by pruning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Domain;
use crate::envelope::{CaptureAsset, EventKind, EventPayload};

/// A persisted local record, one variant per record shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LocalRecord {
    Note(NoteRecord),
    Capture(CaptureRecord),
    Event(EventRecord),
}

impl LocalRecord {
    /// The stable identity matched against the remote listing.
    pub fn identity(&self) -> Uuid {
        match self {
            LocalRecord::Note(r) => r.id,
            LocalRecord::Capture(r) => r.id,
            LocalRecord::Event(r) => r.id,
        }
    }

    /// The domain whose store this record lives in.
    pub fn domain(&self) -> Domain {
        match self {
            LocalRecord::Note(_) => Domain::Notes,
            LocalRecord::Capture(_) => Domain::Captures,
            LocalRecord::Event(r) => r.kind.domain(),
        }
    }

    /// The user favorite flag.
    pub fn favorite(&self) -> bool {
        match self {
            LocalRecord::Note(r) => r.favorite,
            LocalRecord::Capture(r) => r.favorite,
            LocalRecord::Event(r) => r.favorite,
        }
    }

    /// The remote modification timestamp this projection was taken from.
    pub fn modified_at(&self) -> DateTime<Utc> {
        match self {
            LocalRecord::Note(r) => r.modified_at,
            LocalRecord::Capture(r) => r.modified_at,
            LocalRecord::Event(r) => r.modified_at,
        }
    }
}

/// Local projection of a note envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Local projection of a capture envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: Uuid,
    pub assets: Vec<CaptureAsset>,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Local projection of an event envelope (all four kinds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub kind: EventKind,
    pub detail: EventPayload,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: Uuid) -> LocalRecord {
        LocalRecord::Note(NoteRecord {
            id,
            title: "t".to_string(),
            text: "b".to_string(),
            favorite: false,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        })
    }

    #[test]
    fn test_identity_accessor() {
        let id = Uuid::new_v4();
        assert_eq!(note(id).identity(), id);
    }

    #[test]
    fn test_note_domain() {
        assert_eq!(note(Uuid::new_v4()).domain(), Domain::Notes);
    }

    #[test]
    fn test_event_record_domain_follows_kind() {
        let record = LocalRecord::Event(EventRecord {
            id: Uuid::new_v4(),
            kind: EventKind::Call,
            detail: EventPayload::Call {
                counterpart: "+1 555 0100".to_string(),
                duration_secs: 30,
                outgoing: false,
            },
            favorite: false,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        });
        assert_eq!(record.domain(), Domain::Calls);
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = note(Uuid::new_v4());
        let json = serde_json::to_string(&record).unwrap();
        let decoded: LocalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.identity(), record.identity());
        assert_eq!(decoded.domain(), Domain::Notes);
    }
}
