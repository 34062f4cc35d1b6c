//! Configuration for the mirror engine.
//!
//! Configuration is passed to [`SyncEngine::new()`](crate::SyncEngine::new)
//! and [`MirrorService::new()`](crate::MirrorService::new) and can be
//! constructed programmatically or deserialized from YAML/JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use mirror_engine::config::MirrorConfig;
//!
//! let config = MirrorConfig {
//!     base_url: "https://api.example.com/v1".into(),
//!     ..Default::default()
//! };
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! MirrorConfig
//! ├── base_url: String              # Remote API root
//! └── settings: MirrorSettings
//!     ├── sync: SyncSettings        # Chunk size, page fan-out
//!     ├── poll: PollConfig          # Foreground periodic poll
//!     ├── background: BackgroundRefreshConfig
//!     └── http: HttpConfig          # Transport timeout, retries
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// Top-level config: passed to SyncEngine::new() / MirrorService::new()
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level config object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Root URL of the remote API (no trailing slash).
    /// Example: `"https://api.example.com/v1"`.
    pub base_url: String,

    /// Tunable settings for sync passes, polling, and transport.
    #[serde(default)]
    pub settings: MirrorSettings,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8443/v1".to_string(),
            settings: MirrorSettings::default(),
        }
    }
}

impl MirrorConfig {
    /// Create a minimal config for testing.
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            settings: MirrorSettings {
                sync: SyncSettings {
                    chunk_size: 10,
                    max_concurrent_pages: 4,
                },
                poll: PollConfig {
                    enabled: false,
                    ..Default::default()
                },
                background: BackgroundRefreshConfig {
                    enabled: false,
                    ..Default::default()
                },
                http: HttpConfig::default(),
            },
        }
    }
}

/// General settings for the mirror logic.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MirrorSettings {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub background: BackgroundRefreshConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SyncSettings: pass shape
// ═══════════════════════════════════════════════════════════════════════════════

/// Valid chunk size bounds for page requests.
const CHUNK_SIZE_MIN: usize = 10;
const CHUNK_SIZE_MAX: usize = 20;

/// Sync pass settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Page size C for probe and page fetches. Valid range 10-20;
    /// out-of-range values are clamped by [`effective_chunk_size()`](Self::effective_chunk_size).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum concurrent page fetch tasks per pass.
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,
}

fn default_chunk_size() -> usize {
    15
}

fn default_max_concurrent_pages() -> usize {
    8
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            chunk_size: 15,
            max_concurrent_pages: 8,
        }
    }
}

impl SyncSettings {
    /// The chunk size clamped to the valid range.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(CHUNK_SIZE_MIN, CHUNK_SIZE_MAX)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PollConfig: foreground periodic poll
// ═══════════════════════════════════════════════════════════════════════════════

/// Foreground periodic poll configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Whether the foreground poll task runs.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Poll interval as a duration string (e.g., "5m").
    #[serde(default = "default_poll_interval")]
    pub interval: String,
}

fn default_poll_interval() -> String {
    "5m".to_string()
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: "5m".to_string(),
        }
    }
}

impl PollConfig {
    /// Parse the interval string to a Duration.
    pub fn interval_duration(&self) -> Duration {
        humantime::parse_duration(&self.interval).unwrap_or(Duration::from_secs(300))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BackgroundRefreshConfig: per-domain re-arming refresh tasks
// ═══════════════════════════════════════════════════════════════════════════════

/// OS-style background refresh has a floor on how soon a task may re-run.
const BACKGROUND_MIN_DELAY_FLOOR: Duration = Duration::from_secs(60);

/// Background refresh configuration.
///
/// One task per domain; each re-arms itself after every completed pass
/// with at least the minimum delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundRefreshConfig {
    /// Whether background refresh tasks run.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Earliest-begin delay between completions as a duration string.
    /// Floored at one minute.
    #[serde(default = "default_background_delay")]
    pub min_delay: String,
}

fn default_background_delay() -> String {
    "15m".to_string()
}

impl Default for BackgroundRefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay: "15m".to_string(),
        }
    }
}

impl BackgroundRefreshConfig {
    /// Parse the delay string to a Duration, floored at one minute.
    pub fn min_delay_duration(&self) -> Duration {
        humantime::parse_duration(&self.min_delay)
            .unwrap_or(Duration::from_secs(900))
            .max(BACKGROUND_MIN_DELAY_FLOOR)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HttpConfig: transport settings
// ═══════════════════════════════════════════════════════════════════════════════

/// HTTP transport configuration.
///
/// Timeouts live entirely here; the engine imposes none itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout as a duration string.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Maximum attempts for a transiently failing request
    /// (including the first).
    #[serde(default = "default_transient_attempts")]
    pub transient_attempts: usize,
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

fn default_transient_attempts() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: "30s".to_string(),
            transient_attempts: 3,
        }
    }
}

impl HttpConfig {
    /// Parse the request timeout string to a Duration.
    pub fn request_timeout_duration(&self) -> Duration {
        humantime::parse_duration(&self.request_timeout).unwrap_or(Duration::from_secs(30))
    }

    /// Retry policy for transient transport failures.
    pub fn retry_config(&self) -> crate::resilience::RetryConfig {
        crate::resilience::RetryConfig {
            max_attempts: self.transient_attempts.max(1),
            ..crate::resilience::RetryConfig::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
