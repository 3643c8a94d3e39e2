//! Blocking HTTP markup source.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};

use super::MarkupSource;
use crate::config::SourceConfig;
use crate::error::{BridgeError, ErrorCode, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches playlist pages over HTTP with browser-like headers.
///
/// The embeddable page is used for extraction since it carries the most
/// complete track data without a login.
pub struct HttpMarkupSource {
    client: Client,
    embed_base_url: String,
    page_base_url: String,
}

impl HttpMarkupSource {
    /// Creates a source from configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                BridgeError::with_source(
                    ErrorCode::Configuration,
                    "Failed to create HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            embed_base_url: config.embed_base_url.trim_end_matches('/').to_string(),
            page_base_url: config.page_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the full (non-embed) playlist page, for saving and inspection.
    pub fn fetch_page(&self, source_id: &str) -> Result<String> {
        self.get(&format!("{}/{}", self.page_base_url, source_id))
    }

    fn get(&self, url: &str) -> Result<String> {
        tracing::debug!(url = %url, "fetching markup");

        let response = self.client.get(url).send().map_err(|e| {
            BridgeError::with_source(
                ErrorCode::FetchFailed,
                format!("Playlist request failed for {}", url),
                e,
            )
        })?;

        if !response.status().is_success() {
            return Err(BridgeError::fetch_status(response.status().as_u16(), url));
        }

        let body = response.text().map_err(|e| {
            BridgeError::with_source(
                ErrorCode::FetchFailed,
                format!("Failed to read response from {}", url),
                e,
            )
        })?;

        tracing::debug!(url = %url, bytes = body.len(), "markup fetched");
        Ok(body)
    }
}

impl MarkupSource for HttpMarkupSource {
    fn fetch_markup(&self, source_id: &str) -> Result<String> {
        self.get(&format!("{}/{}", self.embed_base_url, source_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let mut config = SourceConfig::default();
        config.embed_base_url.push('/');
        let source = HttpMarkupSource::new(&config).unwrap();
        assert_eq!(source.embed_base_url, "https://open.spotify.com/embed/playlist");
        assert_eq!(source.page_base_url, "https://open.spotify.com/playlist");
    }

    #[test]
    fn unreachable_host_is_fetch_failure() {
        let config = SourceConfig {
            embed_base_url: "http://127.0.0.1:9".to_string(),
            ..SourceConfig::default()
        };
        let source = HttpMarkupSource::new(&config).unwrap();
        let err = source.fetch_markup("abc").unwrap_err();
        assert_eq!(err.code, ErrorCode::FetchFailed);
        assert!(!err.code.is_fatal());
    }
}
