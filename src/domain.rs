//! Synchronized content domains.
//!
//! Each domain is one remotely listed, locally mirrored content category.
//! All six share the same reconciliation algorithm; they differ only in
//! their adapter mapping and the API collection they page through.

use serde::{Deserialize, Serialize};

/// One of the six synchronized content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// User notes (title + body text).
    Notes,
    /// Photo and video captures (asset references).
    Captures,
    /// Voice-assistant transcripts.
    Transcripts,
    /// Call log entries.
    Calls,
    /// Translation sessions.
    Translations,
    /// Music listening sessions.
    MusicSessions,
}

impl Domain {
    /// All domains, in sync order.
    pub const ALL: [Domain; 6] = [
        Domain::Notes,
        Domain::Captures,
        Domain::Transcripts,
        Domain::Calls,
        Domain::Translations,
        Domain::MusicSessions,
    ];

    /// Stable dense index, used for per-domain flag/channel arrays.
    pub fn index(self) -> usize {
        match self {
            Domain::Notes => 0,
            Domain::Captures => 1,
            Domain::Transcripts => 2,
            Domain::Calls => 3,
            Domain::Translations => 4,
            Domain::MusicSessions => 5,
        }
    }

    /// The remote collection path for this domain.
    ///
    /// Appended to the configured base URL: `{base}/{api_path}?page=N&size=C`.
    pub fn api_path(self) -> &'static str {
        match self {
            Domain::Notes => "notes",
            Domain::Captures => "captures",
            Domain::Transcripts => "transcripts",
            Domain::Calls => "calls",
            Domain::Translations => "translations",
            Domain::MusicSessions => "music-sessions",
        }
    }

    /// Short name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Notes => "notes",
            Domain::Captures => "captures",
            Domain::Transcripts => "transcripts",
            Domain::Calls => "calls",
            Domain::Translations => "translations",
            Domain::MusicSessions => "music_sessions",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_domain() {
        assert_eq!(Domain::ALL.len(), 6);
        for (i, domain) in Domain::ALL.iter().enumerate() {
            assert_eq!(domain.index(), i);
        }
    }

    #[test]
    fn test_indices_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for domain in Domain::ALL {
            assert!(seen.insert(domain.index()));
        }
    }

    #[test]
    fn test_display_matches_as_str() {
        for domain in Domain::ALL {
            assert_eq!(domain.to_string(), domain.as_str());
        }
    }

    #[test]
    fn test_api_paths_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for domain in Domain::ALL {
            assert!(seen.insert(domain.api_path()));
        }
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Domain::MusicSessions).unwrap();
        assert_eq!(json, r#""music_sessions""#);
        let parsed: Domain = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Domain::MusicSessions);
    }
}
