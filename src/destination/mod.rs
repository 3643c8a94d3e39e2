//! Destination side: the video platform collaborator.

pub mod auth;
mod youtube;

pub use youtube::YouTubeClient;

use crate::error::Result;
use crate::types::{CandidateResult, DestinationPlaylist};

/// Operations the transfer orchestrator needs from the video platform.
pub trait Destination {
    /// Searches for videos, most relevant first. Fails with `SEARCH_FAILED`.
    fn search(&self, query: &str) -> Result<Vec<CandidateResult>>;

    /// Looks for an existing playlist whose title equals `title`, ignoring case.
    /// Fails with `LOOKUP_FAILED`.
    fn playlist_exists(&self, title: &str) -> Result<(bool, Option<DestinationPlaylist>)>;

    /// Creates a playlist. Fails with `CREATE_FAILED`.
    fn create_playlist(&self, title: &str, description: &str) -> Result<DestinationPlaylist>;

    /// Adds a video to a playlist. A video already present counts as success.
    /// Fails with `ADD_FAILED`.
    fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()>;
}

impl<T: Destination + ?Sized> Destination for &T {
    fn search(&self, query: &str) -> Result<Vec<CandidateResult>> {
        (**self).search(query)
    }

    fn playlist_exists(&self, title: &str) -> Result<(bool, Option<DestinationPlaylist>)> {
        (**self).playlist_exists(title)
    }

    fn create_playlist(&self, title: &str, description: &str) -> Result<DestinationPlaylist> {
        (**self).create_playlist(title, description)
    }

    fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        (**self).add_to_playlist(playlist_id, video_id)
    }
}

/// Finds the first playlist whose title equals `title`, ignoring case.
pub fn find_by_title<'a>(
    playlists: &'a [DestinationPlaylist],
    title: &str,
) -> Option<&'a DestinationPlaylist> {
    let wanted = title.to_lowercase();
    playlists.iter().find(|p| p.title.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(id: &str, title: &str) -> DestinationPlaylist {
        DestinationPlaylist {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn title_lookup_ignores_case_but_not_content() {
        let playlists = vec![playlist("1", "Road Trip 2"), playlist("2", "ROAD TRIP")];
        assert_eq!(find_by_title(&playlists, "road trip").unwrap().id, "2");
        assert!(find_by_title(&playlists, "Road").is_none());
        assert!(find_by_title(&[], "anything").is_none());
    }
}
