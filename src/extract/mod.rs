//! Markup extraction.
//!
//! Source pages are not a stable contract, so tracks are read by a cascade
//! of independent strategies tried in a fixed order. The first strategy to
//! return any tracks wins and nothing from later strategies is merged in.
//! An empty result means "no tracks found" and is not an error here.
//!
//! Each strategy lives in its own module with its own fixtures, so a new
//! one can be added to [`CASCADE`] without disturbing the others.

pub mod embedded_state;
pub mod free_text;
pub mod linked_data;
pub mod row_tags;
pub mod summary;
pub mod text;

pub use summary::{extract_playlist_summary, is_usable_name};

use crate::types::SourceTrack;

/// An extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Page initial-state JSON assigned in a script.
    EmbeddedState,
    /// Tagged track-row list items.
    RowTags,
    /// Linked-data (`ld+json`) blocks.
    LinkedData,
    /// `Artist - Title` text lines.
    FreeText,
}

/// Strategies in priority order.
pub const CASCADE: [Strategy; 4] = [
    Strategy::EmbeddedState,
    Strategy::RowTags,
    Strategy::LinkedData,
    Strategy::FreeText,
];

impl Strategy {
    /// Returns the string representation of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::EmbeddedState => "embedded_state",
            Strategy::RowTags => "row_tags",
            Strategy::LinkedData => "linked_data",
            Strategy::FreeText => "free_text",
        }
    }

    /// Runs this strategy alone.
    pub fn extract(&self, markup: &str) -> Vec<SourceTrack> {
        match self {
            Strategy::EmbeddedState => embedded_state::extract(markup),
            Strategy::RowTags => row_tags::extract(markup),
            Strategy::LinkedData => linked_data::extract(markup),
            Strategy::FreeText => free_text::extract(markup),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracts tracks, reporting which strategy produced them.
///
/// Returns `None` when no strategy recognized anything.
pub fn extract_tracks_with_strategy(markup: &str) -> Option<(Strategy, Vec<SourceTrack>)> {
    for strategy in CASCADE {
        let tracks = strategy.extract(markup);
        if tracks.is_empty() {
            tracing::debug!(strategy = %strategy, "strategy found no tracks");
            continue;
        }
        tracing::debug!(strategy = %strategy, count = tracks.len(), "strategy matched");
        return Some((strategy, tracks));
    }
    None
}

/// Extracts tracks from raw markup. Never fails; empty means nothing was recognized.
pub fn extract_tracks(markup: &str) -> Vec<SourceTrack> {
    extract_tracks_with_strategy(markup)
        .map(|(_, tracks)| tracks)
        .unwrap_or_default()
}
