//! Core types for playlist-bridge.
//!
//! This module re-exports the data types shared by every stage:
//! - [`SourceTrack`] / [`SourcePlaylist`]: what was read from the source page
//! - [`CandidateResult`] / [`DestinationPlaylist`]: what the video platform returns
//! - [`TransferOutcome`] / [`BatchSummary`]: the tally of a run

mod candidate;
mod outcome;
mod track;

// Re-export all types at the module level
pub use candidate::{CandidateResult, DestinationPlaylist, WATCH_URL_BASE};
pub use outcome::{BatchSummary, TierCounts, TransferOutcome};
pub use track::{SourcePlaylist, SourceTrack, UNKNOWN_OWNER, UNKNOWN_PLAYLIST_NAME};
