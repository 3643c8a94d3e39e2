//! Transfer results for a single playlist and for a batch of playlists.

use serde::{Deserialize, Serialize};

use crate::matching::MatchTier;

use super::track::SourceTrack;

/// How many matches were made at each selection tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub artist_and_title: usize,
    pub title_only: usize,
    pub positional: usize,
}

impl TierCounts {
    fn record(&mut self, tier: MatchTier) {
        match tier {
            MatchTier::ArtistAndTitle => self.artist_and_title += 1,
            MatchTier::TitleOnly => self.title_only += 1,
            MatchTier::Positional => self.positional += 1,
        }
    }
}

/// Tally for one playlist transfer.
///
/// Once every track has been processed, `matched_count + failed_count ==
/// total_tracks` and `errors.len() == failed_count`. A cancelled transfer
/// stops short of that and is flagged with `cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub playlist_name: String,
    pub total_tracks: usize,
    pub matched_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
    pub tiers: TierCounts,
    pub cancelled: bool,
}

impl TransferOutcome {
    /// Starts an empty tally for a playlist with `total_tracks` tracks.
    pub fn new(playlist_name: impl Into<String>, total_tracks: usize) -> Self {
        Self {
            playlist_name: playlist_name.into(),
            total_tracks,
            matched_count: 0,
            failed_count: 0,
            errors: Vec::new(),
            tiers: TierCounts::default(),
            cancelled: false,
        }
    }

    /// Records a track that was matched (and added, outside dry-run).
    pub fn record_match(&mut self, tier: MatchTier) {
        self.matched_count += 1;
        self.tiers.record(tier);
    }

    /// Records a failed track together with its reason.
    pub fn record_failure(&mut self, track: &SourceTrack, reason: impl std::fmt::Display) {
        self.failed_count += 1;
        self.errors.push(format!("{}: {}", track.label(), reason));
    }

    /// Number of tracks processed so far.
    pub fn processed(&self) -> usize {
        self.matched_count + self.failed_count
    }

    /// Returns true once every track has been either matched or failed.
    pub fn is_complete(&self) -> bool {
        self.processed() == self.total_tracks
    }
}

/// Aggregate over every playlist handled in a batch run, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<TransferOutcome>,
    /// Playlists that could not be transferred at all, as `"name: reason"`.
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn push(&mut self, outcome: TransferOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total_playlists(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_tracks(&self) -> usize {
        self.outcomes.iter().map(|o| o.total_tracks).sum()
    }

    pub fn total_matched(&self) -> usize {
        self.outcomes.iter().map(|o| o.matched_count).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.outcomes.iter().map(|o| o.failed_count).sum()
    }
}
