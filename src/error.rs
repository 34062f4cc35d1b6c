// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the mirror engine.
//!
//! This module defines the error types used throughout the mirror engine.
//! Errors are categorized by their source (remote API, local store, etc.)
//! and include context to help with debugging.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `Http` | Yes | Network errors, timeouts, 5xx responses |
//! | `Unauthorized` | No | Token rejected; caller must re-authenticate |
//! | `Decode` | No | Malformed page or envelope body |
//! | `Store` | No | Local store failure (save, upsert) |
//! | `InvalidState` | No | Engine/service state machine violation |
//! | `Shutdown` | No | Engine is shutting down |
//! | `Internal` | No | Unexpected internal error |
//!
//! # The Unauthorized Case
//!
//! `Unauthorized` is deliberately its own variant rather than an `Http`
//! status: a pass aborts on it immediately, it is never retried internally,
//! and the caller is expected to run the re-authentication flow before
//! invoking sync again. Use [`MirrorError::is_unauthorized()`] at trigger
//! call sites.

use crate::domain::Domain;
use thiserror::Error;

/// Result type alias for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Errors that can occur during a sync pass.
///
/// Use [`is_retryable()`](Self::is_retryable) to check whether the
/// operation should be retried with backoff, and
/// [`is_unauthorized()`](Self::is_unauthorized) to route to re-auth.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The remote rejected our bearer token.
    ///
    /// Propagated immediately with no internal retry. The caller owns the
    /// browser-based re-authentication flow.
    #[error("Unauthorized: remote rejected credentials")]
    Unauthorized,

    /// HTTP transport or server error.
    ///
    /// Occurs when talking to the remote API. Typically retryable
    /// (timeouts, connection drops, 5xx).
    #[error("HTTP error ({operation}): {message}")]
    Http {
        operation: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Malformed page or envelope body.
    ///
    /// Occurs when a response fails to decode into the wire model.
    /// Not retryable, the data is malformed at the source.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local store failure.
    ///
    /// Occurs when an upsert, delete, or the terminal save fails.
    /// Not retryable, indicates local persistence issues that need attention.
    #[error("Store error: {0}")]
    Store(String),

    /// Engine or service state machine violation.
    ///
    /// Occurs when an operation is attempted in the wrong state
    /// (e.g., calling `start()` on an already-running service).
    /// Not retryable, indicates a bug in the caller.
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Shutdown in progress.
    ///
    /// Returned when operations are attempted during shutdown.
    #[error("Shutdown in progress")]
    Shutdown,

    /// Unexpected internal error.
    ///
    /// Catch-all for errors that shouldn't happen.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MirrorError {
    /// Create an HTTP error from a reqwest::Error.
    pub fn http(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            operation: operation.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an HTTP error without source.
    pub fn http_msg(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error scoped to a domain.
    pub fn store(domain: Domain, message: impl Into<String>) -> Self {
        Self::Store(format!("{}: {}", domain, message.into()))
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } => true,   // Network errors are retryable
            Self::Unauthorized => false, // Re-auth required first
            Self::Decode(_) => false,    // Malformed at the source
            Self::Store(_) => false,     // Local persistence needs attention
            Self::InvalidState { .. } => false,
            Self::Shutdown => false,
            Self::Internal(_) => false,
        }
    }

    /// Check if this error means the caller must re-authenticate.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
