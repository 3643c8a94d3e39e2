//! YouTube Data API v3 client.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::auth::Authenticator;
use super::{find_by_title, Destination};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, ErrorCode, Result};
use crate::extract::text::clean_text;
use crate::types::{CandidateResult, DestinationPlaylist};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page the playlists endpoint returns.
const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Transport retry policy with linear backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Throttling and server errors are worth another try; anything else is final.
fn is_retriable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Why an API call did not succeed, before mapping to an operation error.
#[derive(Debug)]
enum ApiFailure {
    Transport(reqwest::Error),
    Status { status: u16, message: String },
}

impl ApiFailure {
    fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Self::Status {
            status,
            message: error_message(&body),
        }
    }

    /// True for "video already in playlist" style answers.
    fn is_duplicate(&self) -> bool {
        match self {
            ApiFailure::Transport(_) => false,
            ApiFailure::Status { status, message } => {
                *status == 409 || *status == 304 || message.contains("already exists")
            }
        }
    }

    fn into_error(self, make: fn(String) -> BridgeError) -> BridgeError {
        match self {
            ApiFailure::Transport(e) => {
                let err = make(e.to_string());
                BridgeError::with_source(err.code, err.message, e)
            }
            ApiFailure::Status { status, message } => make(format!("HTTP {}: {}", status, message)),
        }
    }
}

/// Pulls `error.message` out of an API error body, else the trimmed body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    id: String,
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
    #[serde(default)]
    description: String,
}

impl From<PlaylistResource> for DestinationPlaylist {
    fn from(resource: PlaylistResource) -> Self {
        DestinationPlaylist {
            id: resource.id,
            title: resource.snippet.title,
            description: resource.snippet.description,
        }
    }
}

/// Converts a search response into candidates, in ranking order.
///
/// Items without a video id (channels, playlists) are dropped. Titles come
/// back entity-escaped and are decoded here.
fn parse_search(body: SearchResponse) -> Vec<CandidateResult> {
    body.items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id.filter(|id| !id.is_empty())?;
            Some(CandidateResult::new(
                id,
                clean_text(&item.snippet.title),
                clean_text(&item.snippet.channel_title),
            ))
        })
        .collect()
}

/// Authorized client for the playlist operations the transfer needs.
pub struct YouTubeClient {
    http: Client,
    access_token: String,
    api_base_url: String,
    max_results: u32,
    privacy_status: String,
    retry: RetryPolicy,
}

impl YouTubeClient {
    /// Creates a client around an existing access token.
    pub fn new(config: &BridgeConfig, access_token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| {
            BridgeError::with_source(ErrorCode::Configuration, "Failed to create HTTP client", e)
        })?;

        Ok(Self {
            http,
            access_token: access_token.into(),
            api_base_url: config.destination.api_base_url.trim_end_matches('/').to_string(),
            max_results: config.destination.max_results,
            privacy_status: config.destination.privacy_status.clone(),
            retry: RetryPolicy {
                max_retries: config.transfer.max_retries,
                base_delay: Duration::from_millis(config.transfer.retry_delay_ms),
            },
        })
    }

    /// Authorizes (saved token, refresh, or browser consent) and creates a client.
    pub fn connect(config: &BridgeConfig) -> Result<Self> {
        let token = Authenticator::from_config(config)?.authorize()?;
        Self::new(config, token.access_token)
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.api_base_url, resource)
    }

    /// Sends a request, retrying throttling, server and transport failures.
    fn execute<F>(&self, build: F) -> std::result::Result<Response, ApiFailure>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = build().bearer_auth(&self.access_token).send();

            let retriable = match &result {
                Ok(response) => is_retriable(response.status()),
                Err(_) => true,
            };
            if retriable && attempt < self.retry.max_retries {
                attempt += 1;
                let delay = self.retry.delay_for(attempt);
                match &result {
                    Ok(response) => tracing::warn!(
                        status = response.status().as_u16(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "API request throttled or failed, retrying"
                    ),
                    Err(e) => tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "API request failed, retrying"
                    ),
                }
                thread::sleep(delay);
                continue;
            }

            return match result {
                Err(e) => Err(ApiFailure::Transport(e)),
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(ApiFailure::from_response(response)),
            };
        }
    }

    /// Lists every playlist owned by the authorized account.
    pub fn list_playlists(&self) -> Result<Vec<DestinationPlaylist>> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;
        let page_size = PLAYLIST_PAGE_SIZE.to_string();

        loop {
            let response = self
                .execute(|| {
                    let mut request = self.http.get(self.url("playlists")).query(&[
                        ("part", "snippet"),
                        ("mine", "true"),
                        ("maxResults", page_size.as_str()),
                    ]);
                    if let Some(token) = &page_token {
                        request = request.query(&[("pageToken", token)]);
                    }
                    request
                })
                .map_err(|f| f.into_error(BridgeError::lookup_failed))?;

            let page: PlaylistPage = response.json().map_err(|e| {
                BridgeError::with_source(ErrorCode::LookupFailed, "Invalid playlists response", e)
            })?;

            playlists.extend(page.items.into_iter().map(DestinationPlaylist::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = playlists.len(), "listed destination playlists");
        Ok(playlists)
    }
}

impl Destination for YouTubeClient {
    fn search(&self, query: &str) -> Result<Vec<CandidateResult>> {
        let max_results = self.max_results.to_string();
        let response = self
            .execute(|| {
                self.http.get(self.url("search")).query(&[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("q", query),
                    ("maxResults", max_results.as_str()),
                ])
            })
            .map_err(|f| f.into_error(BridgeError::search_failed))?;

        let body: SearchResponse = response.json().map_err(|e| {
            BridgeError::with_source(ErrorCode::SearchFailed, "Invalid search response", e)
        })?;
        Ok(parse_search(body))
    }

    fn playlist_exists(&self, title: &str) -> Result<(bool, Option<DestinationPlaylist>)> {
        let playlists = self.list_playlists()?;
        match find_by_title(&playlists, title) {
            Some(found) => Ok((true, Some(found.clone()))),
            None => Ok((false, None)),
        }
    }

    fn create_playlist(&self, title: &str, description: &str) -> Result<DestinationPlaylist> {
        let body = json!({
            "snippet": { "title": title, "description": description },
            "status": { "privacyStatus": self.privacy_status },
        });

        let response = self
            .execute(|| {
                self.http
                    .post(self.url("playlists"))
                    .query(&[("part", "snippet,status")])
                    .json(&body)
            })
            .map_err(|f| f.into_error(BridgeError::create_failed))?;

        let created: PlaylistResource = response.json().map_err(|e| {
            BridgeError::with_source(ErrorCode::CreateFailed, "Invalid playlist response", e)
        })?;
        tracing::info!(id = %created.id, title = %created.snippet.title, "created playlist");
        Ok(created.into())
    }

    fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id },
            }
        });

        match self.execute(|| {
            self.http
                .post(self.url("playlistItems"))
                .query(&[("part", "snippet")])
                .json(&body)
        }) {
            Ok(_) => Ok(()),
            Err(failure) if failure.is_duplicate() => {
                tracing::debug!(playlist_id, video_id, "video already in playlist");
                Ok(())
            }
            Err(failure) => Err(failure.into_error(BridgeError::add_failed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    /// Serves canned responses, one per connection, then stops.
    fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                let mut content_length = 0;
                loop {
                    line.clear();
                    if reader.read_line(&mut line).unwrap() == 0 || line.trim().is_empty() {
                        break;
                    }
                    let lower = line.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
                let mut request_body = vec![0u8; content_length];
                reader.read_exact(&mut request_body).unwrap();
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        format!("http://127.0.0.1:{}", port)
    }

    fn client(base_url: String, max_retries: u32) -> YouTubeClient {
        let mut config = BridgeConfig::new();
        config.destination.api_base_url = base_url;
        config.transfer.max_retries = max_retries;
        config.transfer.retry_delay_ms = 1;
        YouTubeClient::new(&config, "token").unwrap()
    }

    const SEARCH_BODY: &str = r#"{"items":[
        {"id":{"kind":"youtube#video","videoId":"abc"},"snippet":{"title":"Ed Sheeran - Shape of You (Official Music Video)","channelTitle":"Ed Sheeran"}},
        {"id":{"kind":"youtube#channel","channelId":"c1"},"snippet":{"title":"Some Channel","channelTitle":"Some Channel"}},
        {"id":{"kind":"youtube#video","videoId":"def"},"snippet":{"title":"Shape of You &amp; Cover","channelTitle":"Covers"}}
    ]}"#;

    #[test]
    fn search_parsing_keeps_videos_in_order() {
        let body: SearchResponse = serde_json::from_str(SEARCH_BODY).unwrap();
        let candidates = parse_search(body);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "abc");
        assert_eq!(candidates[0].url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(candidates[1].title, "Shape of You & Cover");
    }

    #[test]
    fn error_message_extraction() {
        let body = r#"{"error":{"code":403,"message":"quota exceeded","errors":[]}}"#;
        assert_eq!(error_message(body), "quota exceeded");
        assert_eq!(error_message("  plain text "), "plain text");
    }

    #[test]
    fn duplicates_count_as_success() {
        let conflict = ApiFailure::Status {
            status: 409,
            message: "conflict".into(),
        };
        let exists = ApiFailure::Status {
            status: 400,
            message: "Video already exists in playlist".into(),
        };
        let forbidden = ApiFailure::Status {
            status: 403,
            message: "forbidden".into(),
        };
        assert!(conflict.is_duplicate());
        assert!(exists.is_duplicate());
        assert!(!forbidden.is_duplicate());
    }

    #[test]
    fn linear_backoff() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));

        let huge = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::MAX,
        };
        assert_eq!(huge.delay_for(2), Duration::MAX);
        assert!(is_retriable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retriable(StatusCode::BAD_GATEWAY));
        assert!(!is_retriable(StatusCode::FORBIDDEN));
    }

    #[test]
    fn search_retries_server_errors() {
        let base = serve(vec![(503, "{}"), (200, SEARCH_BODY)]);
        let candidates = client(base, 2).search("Ed Sheeran Shape of You").unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let base = serve(vec![(403, r#"{"error":{"message":"quota exceeded"}}"#)]);
        let err = client(base, 3).search("anything").unwrap_err();
        assert_eq!(err.code, ErrorCode::SearchFailed);
        assert!(err.message.contains("quota exceeded"));
    }

    #[test]
    fn add_treats_conflict_as_success() {
        let base = serve(vec![(409, r#"{"error":{"message":"duplicate"}}"#)]);
        assert!(client(base, 0).add_to_playlist("PL1", "abc").is_ok());
    }

    #[test]
    fn playlist_lookup_follows_pages() {
        let base = serve(vec![
            (
                200,
                r#"{"items":[{"id":"PL1","snippet":{"title":"Other"}}],"nextPageToken":"p2"}"#,
            ),
            (
                200,
                r#"{"items":[{"id":"PL2","snippet":{"title":"road trip","description":"d"}}]}"#,
            ),
        ]);
        let (exists, found) = client(base, 0).playlist_exists("Road Trip").unwrap();
        assert!(exists);
        assert_eq!(found.unwrap().id, "PL2");
    }
}
