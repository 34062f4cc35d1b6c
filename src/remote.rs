// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote source integration trait and HTTP implementation.
//!
//! [`RemoteSource`] abstracts the paginated read-only listing API the
//! engine reconciles against. It is offset-based, stateless, and
//! idempotent per call: there is no server-side cursor, so concurrent
//! page requests within one pass are safe and order-independent.
//!
//! [`HttpRemoteSource`] is the production implementation: HTTPS REST with
//! bearer-token auth and JSON page bodies. An HTTP 401/403 maps to
//! [`MirrorError::Unauthorized`] and is never retried here; transient
//! transport failures are retried with backoff before surfacing.

use std::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MirrorConfig;
use crate::domain::Domain;
use crate::envelope::{Page, RemoteEnvelope};
use crate::error::{MirrorError, Result};
use crate::resilience::RetryConfig;
use crate::store::BoxFuture;

/// One fetched page of a remote listing, as the engine consumes it.
#[derive(Debug, Clone)]
pub struct RemotePage {
    /// Envelopes on this page.
    pub items: Vec<RemoteEnvelope>,
    /// Total items in the collection, across all pages.
    pub total_elements: usize,
    /// Total pages at the requested chunk size.
    pub total_pages: u32,
    /// The page index this response covers.
    pub page_number: u32,
}

impl RemotePage {
    /// Identity of the first listed item, `None` for an empty page.
    pub fn first_identity(&self) -> Option<Uuid> {
        self.items.first().map(|envelope| envelope.id)
    }
}

impl From<Page> for RemotePage {
    fn from(page: Page) -> Self {
        Self {
            items: page.content,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            page_number: page.pageable.page_number,
        }
    }
}

/// Trait defining what the engine needs from the remote API.
///
/// One method: fetch page `index` of a domain's listing at the given chunk
/// size. Implementations must be safe to call concurrently for different
/// indices of the same pass.
pub trait RemoteSource: Send + Sync + 'static {
    /// Fetch one page of a domain's listing.
    fn page(&self, domain: Domain, index: u32, size: usize) -> BoxFuture<'_, RemotePage>;
}

/// HTTPS implementation of [`RemoteSource`].
///
/// The bearer token is replaceable at runtime: after an
/// [`Unauthorized`](MirrorError::Unauthorized) abort, the caller completes
/// re-authentication and installs the fresh token via
/// [`set_token()`](Self::set_token) before triggering sync again.
pub struct HttpRemoteSource {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<String>,
    retry: RetryConfig,
}

impl HttpRemoteSource {
    /// Create a source from config and an initial bearer token.
    pub fn new(config: &MirrorConfig, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.settings.http.request_timeout_duration())
            .build()
            .map_err(|e| MirrorError::http("client_build", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(token.into()),
            retry: config.settings.http.retry_config(),
        })
    }

    /// Replace the bearer token (after re-authentication).
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = token.into();
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn page_url(&self, domain: Domain, index: u32, size: usize) -> String {
        format!(
            "{}/{}?page={}&size={}",
            self.base_url,
            domain.api_path(),
            index,
            size
        )
    }

    async fn request_page(&self, domain: Domain, index: u32, size: usize) -> Result<RemotePage> {
        let url = self.page_url(domain, index, size);
        let token = self.token.read().expect("token lock poisoned").clone();

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MirrorError::http("page", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MirrorError::Unauthorized);
        }
        if !status.is_success() {
            return Err(MirrorError::http_msg(
                "page",
                format!("unexpected status {}", status),
            ));
        }

        let page: Page = response
            .json()
            .await
            .map_err(|e| MirrorError::Decode(format!("{} page {}: {}", domain, index, e)))?;

        debug!(
            domain = %domain,
            page = index,
            items = page.content.len(),
            total = page.total_elements,
            "Fetched remote page"
        );

        Ok(RemotePage::from(page))
    }

    async fn fetch_with_retry(&self, domain: Domain, index: u32, size: usize) -> Result<RemotePage> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.request_page(domain, index, size).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        domain = %domain,
                        page = index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient page fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl RemoteSource for HttpRemoteSource {
    fn page(&self, domain: Domain, index: u32, size: usize) -> BoxFuture<'_, RemotePage> {
        Box::pin(self.fetch_with_retry(domain, index, size))
    }
}

/// A no-op source for standalone mode: every listing is empty.
#[derive(Clone)]
pub struct EmptyRemoteSource;

impl RemoteSource for EmptyRemoteSource {
    fn page(&self, domain: Domain, index: u32, _size: usize) -> BoxFuture<'_, RemotePage> {
        Box::pin(async move {
            tracing::trace!(domain = %domain, page = index, "EmptyRemoteSource: empty page");
            Ok(RemotePage {
                items: Vec::new(),
                total_elements: 0,
                total_pages: 0,
                page_number: index,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> HttpRemoteSource {
        let config = MirrorConfig::for_testing("https://api.example.com/v1/");
        HttpRemoteSource::new(&config, "token-1").unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(source().base_url(), "https://api.example.com/v1");
    }

    #[test]
    fn test_page_url_shape() {
        let source = source();
        assert_eq!(
            source.page_url(Domain::Notes, 0, 15),
            "https://api.example.com/v1/notes?page=0&size=15"
        );
        assert_eq!(
            source.page_url(Domain::MusicSessions, 3, 10),
            "https://api.example.com/v1/music-sessions?page=3&size=10"
        );
    }

    #[test]
    fn test_set_token_replaces() {
        let source = source();
        source.set_token("token-2");
        assert_eq!(*source.token.read().unwrap(), "token-2");
    }

    #[test]
    fn test_remote_page_first_identity() {
        let page = RemotePage {
            items: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page_number: 0,
        };
        assert!(page.first_identity().is_none());
    }

    #[test]
    fn test_remote_page_from_wire_page() {
        let json = r#"{
            "content": [],
            "totalElements": 42,
            "totalPages": 3,
            "pageable": {"pageNumber": 2}
        }"#;
        let wire: Page = serde_json::from_str(json).unwrap();
        let page = RemotePage::from(wire);
        assert_eq!(page.total_elements, 42);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page_number, 2);
    }

    #[tokio::test]
    async fn test_empty_source_always_empty() {
        let source = EmptyRemoteSource;
        let page = source.page(Domain::Notes, 0, 15).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_elements, 0);
    }
}
