//! Per-domain envelope adapters.
//!
//! An adapter is a pure mapping from one remote envelope to zero-or-one
//! local record. Returning `None` means the envelope's payload shape does
//! not belong to this adapter's domain; the item is skipped, not an error.
//!
//! All six domains share the one [`DomainAdapter`] trait. The four event
//! domains are a single [`EventAdapter`] parameterized by kind; notes and
//! captures have their own mappings. Adapters never touch the remote
//! source or the store; the engine owns all writes.

use crate::domain::Domain;
use crate::envelope::{EventKind, Payload, RemoteEnvelope};
use crate::record::{CaptureRecord, EventRecord, LocalRecord, NoteRecord};

/// Pure per-domain mapping from a remote envelope to a local record.
pub trait DomainAdapter: Send + Sync {
    /// The domain this adapter projects into.
    fn domain(&self) -> Domain;

    /// Project an envelope into this domain's record shape.
    ///
    /// Returns `None` when the payload does not belong to this domain.
    fn adapt(&self, envelope: &RemoteEnvelope) -> Option<LocalRecord>;
}

/// Adapter for the notes domain.
pub struct NoteAdapter;

impl DomainAdapter for NoteAdapter {
    fn domain(&self) -> Domain {
        Domain::Notes
    }

    fn adapt(&self, envelope: &RemoteEnvelope) -> Option<LocalRecord> {
        match &envelope.payload {
            Payload::Note(note) => Some(LocalRecord::Note(NoteRecord {
                id: envelope.id,
                title: note.title.clone(),
                text: note.text.clone(),
                favorite: envelope.favorite,
                created_at: envelope.created_at,
                modified_at: envelope.modified_at,
            })),
            _ => None,
        }
    }
}

/// Adapter for the captures domain.
pub struct CaptureAdapter;

impl DomainAdapter for CaptureAdapter {
    fn domain(&self) -> Domain {
        Domain::Captures
    }

    fn adapt(&self, envelope: &RemoteEnvelope) -> Option<LocalRecord> {
        match &envelope.payload {
            Payload::Capture(capture) => Some(LocalRecord::Capture(CaptureRecord {
                id: envelope.id,
                assets: capture.assets.clone(),
                favorite: envelope.favorite,
                created_at: envelope.created_at,
                modified_at: envelope.modified_at,
            })),
            _ => None,
        }
    }
}

/// Adapter for one event domain, parameterized by kind.
pub struct EventAdapter {
    kind: EventKind,
}

impl EventAdapter {
    pub const fn new(kind: EventKind) -> Self {
        Self { kind }
    }
}

impl DomainAdapter for EventAdapter {
    fn domain(&self) -> Domain {
        self.kind.domain()
    }

    fn adapt(&self, envelope: &RemoteEnvelope) -> Option<LocalRecord> {
        match &envelope.payload {
            Payload::Event(event) if event.kind() == self.kind => {
                Some(LocalRecord::Event(EventRecord {
                    id: envelope.id,
                    kind: self.kind,
                    detail: event.clone(),
                    favorite: envelope.favorite,
                    created_at: envelope.created_at,
                    modified_at: envelope.modified_at,
                }))
            }
            _ => None,
        }
    }
}

static NOTES: NoteAdapter = NoteAdapter;
static CAPTURES: CaptureAdapter = CaptureAdapter;
static TRANSCRIPTS: EventAdapter = EventAdapter::new(EventKind::Transcript);
static CALLS: EventAdapter = EventAdapter::new(EventKind::Call);
static TRANSLATIONS: EventAdapter = EventAdapter::new(EventKind::Translation);
static MUSIC_SESSIONS: EventAdapter = EventAdapter::new(EventKind::MusicSession);

/// The adapter instance for a domain.
pub fn adapter_for(domain: Domain) -> &'static dyn DomainAdapter {
    match domain {
        Domain::Notes => &NOTES,
        Domain::Captures => &CAPTURES,
        Domain::Transcripts => &TRANSCRIPTS,
        Domain::Calls => &CALLS,
        Domain::Translations => &TRANSLATIONS,
        Domain::MusicSessions => &MUSIC_SESSIONS,
    }
}
