//! Source-side types: tracks and playlists read from the streaming page.
//!
//! Both types are produced by the extractor and treated as read-only by
//! everything downstream of it.

use serde::{Deserialize, Serialize};

/// Placeholder name used when the caller has no playlist name to offer.
///
/// Passing this to [`crate::extract::extract_playlist_summary`] forces the
/// name to be read from the markup instead.
pub const UNKNOWN_PLAYLIST_NAME: &str = "Unknown Playlist";

/// Owner name used when the page does not expose one.
pub const UNKNOWN_OWNER: &str = "Unknown";

/// A single track as read from the source page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTrack {
    /// Track title.
    pub name: String,

    /// Artist credit. Multiple artists are rendered as `"A ft. B"`.
    pub artist: String,

    /// Album title, empty when unknown.
    #[serde(default)]
    pub album: String,

    /// Track length in milliseconds. 0 means unknown.
    #[serde(default)]
    pub duration_ms: u64,

    /// Identifier on the source service, empty when unknown.
    #[serde(default)]
    pub external_id: String,
}

impl SourceTrack {
    /// Creates a track with only a name and artist.
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            ..Default::default()
        }
    }

    /// Returns the `"artist - name"` label used in reports and error lines.
    pub fn label(&self) -> String {
        format!("{} - {}", self.artist, self.name)
    }

    /// Returns the duration formatted as `M:SS`, or `None` when unknown.
    pub fn duration_display(&self) -> Option<String> {
        if self.duration_ms == 0 {
            return None;
        }
        let total_secs = self.duration_ms / 1000;
        Some(format!("{}:{:02}", total_secs / 60, total_secs % 60))
    }
}

/// Summary information about a source playlist.
///
/// `track_count` is provisional until tracks have been extracted; callers
/// overwrite it with [`SourcePlaylist::set_track_count`] afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePlaylist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub owner_name: String,
    pub track_count: usize,
}

impl SourcePlaylist {
    /// Creates a playlist summary with everything but id and name defaulted.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            is_public: false,
            owner_name: UNKNOWN_OWNER.to_string(),
            track_count: 0,
        }
    }

    /// Records the authoritative track count after extraction.
    pub fn set_track_count(&mut self, count: usize) {
        self.track_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_joins_artist_and_name() {
        let track = SourceTrack::new("One More Time", "Daft Punk");
        assert_eq!(track.label(), "Daft Punk - One More Time");
    }

    #[test]
    fn duration_display_formats_minutes_and_seconds() {
        let mut track = SourceTrack::new("a", "b");
        assert_eq!(track.duration_display(), None);

        track.duration_ms = 225_000;
        assert_eq!(track.duration_display().as_deref(), Some("3:45"));

        track.duration_ms = 61_500;
        assert_eq!(track.duration_display().as_deref(), Some("1:01"));
    }

    #[test]
    fn playlist_defaults() {
        let mut playlist = SourcePlaylist::new("abc", "Road Trip");
        assert_eq!(playlist.owner_name, UNKNOWN_OWNER);
        assert_eq!(playlist.track_count, 0);
        assert!(!playlist.is_public);

        playlist.set_track_count(12);
        assert_eq!(playlist.track_count, 12);
    }
}
