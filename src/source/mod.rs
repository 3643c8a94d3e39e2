//! Source side: playlist references, the markup collaborator, and the
//! configured playlist catalogue.

mod web;

pub use web::HttpMarkupSource;

use crate::error::{BridgeError, Result};
use crate::extract::{extract_playlist_summary, extract_tracks};
use crate::types::SourcePlaylist;

const WEB_MARKER: &str = "open.spotify.com/playlist/";
const URI_PREFIX: &str = "spotify:playlist:";

/// Fetches raw page markup for a playlist id.
pub trait MarkupSource {
    /// Returns the markup for `source_id`.
    ///
    /// Fails with `FETCH_FAILED` on a non-success status or transport failure.
    fn fetch_markup(&self, source_id: &str) -> Result<String>;
}

impl<T: MarkupSource + ?Sized> MarkupSource for &T {
    fn fetch_markup(&self, source_id: &str) -> Result<String> {
        (**self).fetch_markup(source_id)
    }
}

/// Extracts a playlist id from a web link, a `spotify:playlist:` URI, or a bare id.
pub fn parse_playlist_id(input: &str) -> Result<String> {
    let input = input.trim();

    let id = if let Some((_, rest)) = input.split_once(WEB_MARKER) {
        rest.split(['?', '#', '/']).next().unwrap_or_default()
    } else if let Some(rest) = input.strip_prefix(URI_PREFIX) {
        rest
    } else if input.contains('/') || input.contains(':') {
        return Err(BridgeError::invalid_source(input, "unsupported link format"));
    } else {
        input
    };

    if id.is_empty() {
        return Err(BridgeError::invalid_source(input, "missing playlist id"));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(BridgeError::invalid_source(input, "playlist id must be alphanumeric"));
    }
    Ok(id.to_string())
}

/// The playlists named in configuration, resolved through a markup source.
pub struct SourceCatalog<'a, S: MarkupSource> {
    source: &'a S,
    links: &'a [String],
}

impl<'a, S: MarkupSource> SourceCatalog<'a, S> {
    pub fn new(source: &'a S, links: &'a [String]) -> Self {
        Self { source, links }
    }

    /// Resolves every configured link into a playlist summary.
    ///
    /// Links that do not parse or cannot be fetched are logged and skipped.
    /// Track counts come from the extracted tracks.
    pub fn playlists(&self) -> Vec<SourcePlaylist> {
        let mut result = Vec::with_capacity(self.links.len());

        for link in self.links {
            let id = match parse_playlist_id(link) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(link = %link, error = %e.short_message(), "skipping playlist link");
                    continue;
                }
            };

            let markup = match self.source.fetch_markup(&id) {
                Ok(markup) => markup,
                Err(e) => {
                    tracing::warn!(link = %link, error = %e.short_message(), "skipping playlist");
                    continue;
                }
            };

            let mut playlist = extract_playlist_summary(&markup, &id, None);
            playlist.set_track_count(extract_tracks(&markup).len());
            result.push(playlist);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::collections::HashMap;

    struct FakeSource(HashMap<String, String>);

    impl MarkupSource for FakeSource {
        fn fetch_markup(&self, source_id: &str) -> Result<String> {
            self.0
                .get(source_id)
                .cloned()
                .ok_or_else(|| BridgeError::fetch_status(404, source_id))
        }
    }

    #[test]
    fn parses_supported_forms() {
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M").unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc123")
                .unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
        assert_eq!(parse_playlist_id("spotify:playlist:abc123").unwrap(), "abc123");
        assert_eq!(parse_playlist_id("  abc123 ").unwrap(), "abc123");
    }

    #[test]
    fn rejects_unknown_forms() {
        for input in [
            "https://example.com/playlist/abc",
            "spotify:album:abc",
            "https://open.spotify.com/playlist/",
            "",
            "abc-123",
        ] {
            let err = parse_playlist_id(input).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidSource, "input: {input}");
        }
    }

    #[test]
    fn catalogue_skips_bad_links_and_counts_tracks() {
        let markup = r#"<meta property="og:title" content="Road Trip | Spotify">
Daft Punk - One More Time
Justice - Genesis Remix"#;
        let source = FakeSource(HashMap::from([("good".to_string(), markup.to_string())]));
        let links = vec![
            "not a link/at all".to_string(),
            "spotify:playlist:missing".to_string(),
            "https://open.spotify.com/playlist/good?si=x".to_string(),
        ];

        let playlists = SourceCatalog::new(&source, &links).playlists();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].id, "good");
        assert_eq!(playlists[0].name, "Road Trip");
        assert_eq!(playlists[0].track_count, 2);
    }
}
