//! Playlist summary (title, description) from page metadata.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{SourcePlaylist, UNKNOWN_PLAYLIST_NAME};

use super::text::clean_text;

static OG_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+property="og:title"\s+content="([^"]+)"\s*/?>"#).expect("og:title regex")
});

static OG_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+property="og:description"\s+content="([^"]*)"\s*/?>"#)
        .expect("og:description regex")
});

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").expect("title regex"));

/// Site branding appended to page titles, longest first.
const BRANDING_SUFFIXES: [&str; 3] = [" | Spotify", " - Spotify", " Spotify"];

/// Builds the summary of a source playlist.
///
/// A usable `explicit_name` (present, non-empty, not the unknown-playlist
/// placeholder) is taken verbatim and the markup is not read at all.
/// Otherwise the name comes from the `og:title` meta tag, falling back to
/// `<title>`, with trailing site branding removed.
pub fn extract_playlist_summary(
    markup: &str,
    playlist_id: &str,
    explicit_name: Option<&str>,
) -> SourcePlaylist {
    if let Some(name) = explicit_name.filter(|n| is_usable_name(n)) {
        return SourcePlaylist::new(playlist_id, name);
    }

    let title = OG_TITLE
        .captures(markup)
        .or_else(|| TITLE_TAG.captures(markup))
        .map(|caps| strip_branding(&clean_text(&caps[1])))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_PLAYLIST_NAME.to_string());

    let mut playlist = SourcePlaylist::new(playlist_id, title);
    if let Some(caps) = OG_DESCRIPTION.captures(markup) {
        playlist.description = clean_text(&caps[1]);
    }
    playlist
}

/// Returns true if `name` can be used as-is without consulting the markup.
pub fn is_usable_name(name: &str) -> bool {
    !name.trim().is_empty() && name != UNKNOWN_PLAYLIST_NAME
}

fn strip_branding(title: &str) -> String {
    BRANDING_SUFFIXES
        .iter()
        .find_map(|suffix| title.strip_suffix(*suffix))
        .unwrap_or(title)
        .trim()
        .to_string()
}
