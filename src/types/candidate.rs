//! Destination-side types: search hits and playlists on the video platform.

use serde::{Deserialize, Serialize};

/// Base URL for watch links built from a video id.
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// A video search hit considered as a match for a source track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub url: String,
}

impl CandidateResult {
    /// Creates a candidate, deriving the watch URL from the id.
    pub fn new(id: impl Into<String>, title: impl Into<String>, channel: impl Into<String>) -> Self {
        let id = id.into();
        let url = format!("{}{}", WATCH_URL_BASE, id);
        Self {
            id,
            title: title.into(),
            channel: channel.into(),
            url,
        }
    }
}

/// A playlist on the destination platform.
///
/// The id is empty for placeholders synthesized in dry-run mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationPlaylist {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl DestinationPlaylist {
    /// Creates an in-memory placeholder that has not been created remotely.
    pub fn placeholder(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: description.into(),
        }
    }
}
