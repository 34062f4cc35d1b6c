//! Shared test helpers: envelope builders and the mock remote source.

#![allow(dead_code)] // Each test binary uses a different subset of helpers

pub mod mock_remote;

use chrono::{TimeZone, Utc};
use mirror_engine::envelope::{
    CaptureAsset, CapturePayload, EventPayload, MediaKind, NotePayload, Payload, RemoteEnvelope,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Build a note envelope with a fresh identity.
pub fn note_envelope() -> RemoteEnvelope {
    note_envelope_with(Uuid::new_v4())
}

/// Build a note envelope with a fixed identity.
pub fn note_envelope_with(id: Uuid) -> RemoteEnvelope {
    RemoteEnvelope {
        id,
        favorite: false,
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0).unwrap(),
        modified_at: Utc.with_ymd_and_hms(2026, 1, 11, 10, 0, 0).unwrap(),
        payload: Payload::Note(NotePayload {
            title: format!("note-{}", id),
            text: "body".to_string(),
        }),
    }
}

/// Build a listing of `n` note envelopes.
pub fn note_listing(n: usize) -> Vec<RemoteEnvelope> {
    (0..n).map(|_| note_envelope()).collect()
}

/// Build a capture envelope.
pub fn capture_envelope() -> RemoteEnvelope {
    RemoteEnvelope {
        id: Uuid::new_v4(),
        favorite: false,
        created_at: Utc::now(),
        modified_at: Utc::now(),
        payload: Payload::Capture(CapturePayload {
            assets: vec![CaptureAsset {
                url: "https://cdn.example/a.jpg".to_string(),
                thumbnail_url: None,
                media: MediaKind::Photo,
            }],
        }),
    }
}

/// Build an event envelope of the given payload.
pub fn event_envelope(payload: EventPayload) -> RemoteEnvelope {
    RemoteEnvelope {
        id: Uuid::new_v4(),
        favorite: false,
        created_at: Utc::now(),
        modified_at: Utc::now(),
        payload: Payload::Event(payload),
    }
}

/// Identity set of a listing.
pub fn ids(listing: &[RemoteEnvelope]) -> HashSet<Uuid> {
    listing.iter().map(|e| e.id).collect()
}
