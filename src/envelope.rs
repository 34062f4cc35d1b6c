// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Wire model for the remote assistant-data API.
//!
//! The remote lists every collection as pages shaped
//! `{content: [...], totalElements, totalPages, pageable: {pageNumber}}`.
//! Each listed item is a [`RemoteEnvelope`]: identity, favorite flag,
//! timestamps, and exactly one payload substructure.
//!
//! # Payload Disambiguation
//!
//! The payload is a closed tagged union, decoded in a single serde pass:
//! the envelope carries exactly one of the known substructure keys
//! (`note`, `capture`, `event`), and event payloads carry a `kind` tag.
//! An envelope whose substructure does not belong to the domain being
//! synced is skipped by the adapter, not treated as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Domain;

/// One page of a remote collection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// The envelopes on this page.
    pub content: Vec<RemoteEnvelope>,
    /// Total items in the collection, across all pages.
    pub total_elements: usize,
    /// Total pages at the requested chunk size.
    pub total_pages: u32,
    /// Pagination echo from the server.
    pub pageable: Pageable,
}

/// Server echo of the requested page position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u32,
}

/// The remote wire representation of one synchronized item.
///
/// Opaque to the engine beyond identity, timestamps, and the favorite
/// flag; the payload is projected into a local record by the domain's
/// adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEnvelope {
    /// Stable unique identity, matched against local records.
    pub id: Uuid,
    /// User favorite flag.
    #[serde(default)]
    pub favorite: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
    /// The single payload substructure present on this envelope.
    #[serde(flatten)]
    pub payload: Payload,
}

impl RemoteEnvelope {
    /// The domain this envelope's payload belongs to.
    pub fn domain(&self) -> Domain {
        self.payload.domain()
    }
}

/// Closed union over the known payload substructures.
///
/// Externally tagged by which substructure key is present on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Payload {
    /// A user note.
    Note(NotePayload),
    /// A photo/video capture.
    Capture(CapturePayload),
    /// One of the four event shapes.
    Event(EventPayload),
}

impl Payload {
    /// The domain this payload belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            Payload::Note(_) => Domain::Notes,
            Payload::Capture(_) => Domain::Captures,
            Payload::Event(event) => event.kind().domain(),
        }
    }
}

/// Note payload: title plus body text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub title: String,
    pub text: String,
}

/// Capture payload: one or more media asset references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayload {
    pub assets: Vec<CaptureAsset>,
}

/// A single media asset reference within a capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureAsset {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub media: MediaKind,
}

/// Media type of a capture asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Event payload, tagged by `kind` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventPayload {
    /// A voice-assistant exchange.
    #[serde(rename_all = "camelCase")]
    Transcript { prompt: String, response: String },
    /// A call log entry.
    #[serde(rename_all = "camelCase")]
    Call {
        counterpart: String,
        duration_secs: u64,
        #[serde(default)]
        outgoing: bool,
    },
    /// A translation session.
    #[serde(rename_all = "camelCase")]
    Translation {
        source_language: String,
        target_language: String,
        source_text: String,
        translated_text: String,
    },
    /// A music listening session.
    #[serde(rename_all = "camelCase")]
    MusicSession {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artist: Option<String>,
        duration_secs: u64,
    },
}

impl EventPayload {
    /// The event kind tag.
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Transcript { .. } => EventKind::Transcript,
            EventPayload::Call { .. } => EventKind::Call,
            EventPayload::Translation { .. } => EventKind::Translation,
            EventPayload::MusicSession { .. } => EventKind::MusicSession,
        }
    }
}

/// The four event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Transcript,
    Call,
    Translation,
    MusicSession,
}

impl EventKind {
    /// The domain an event of this kind belongs to.
    pub fn domain(self) -> Domain {
        match self {
            EventKind::Transcript => Domain::Transcripts,
            EventKind::Call => Domain::Calls,
            EventKind::Translation => Domain::Translations,
            EventKind::MusicSession => Domain::MusicSessions,
        }
    }
}
