//! Best-match selection among search candidates.
//!
//! Candidates are assumed to be ranked by relevance already. The first
//! candidate whose title contains both the track name and the artist wins;
//! failing that, the first whose title contains the name; failing that,
//! the first candidate. Matching is case-insensitive substring containment.
//!
//! An empty track name matches every title at the name-only tier.

use serde::{Deserialize, Serialize};

use crate::types::{CandidateResult, SourceTrack};

/// Which rule selected the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Title contains both the track name and the artist.
    ArtistAndTitle,
    /// Title contains the track name only.
    TitleOnly,
    /// No rule fired; the top-ranked candidate was taken.
    Positional,
}

impl MatchTier {
    /// Returns the string representation of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::ArtistAndTitle => "artist_and_title",
            MatchTier::TitleOnly => "title_only",
            MatchTier::Positional => "positional",
        }
    }

    /// Returns true if a substring rule fired.
    pub fn is_confident(&self) -> bool {
        !matches!(self, MatchTier::Positional)
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A selected candidate together with the rule that picked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub candidate: &'a CandidateResult,
    pub tier: MatchTier,
}

/// Selects the best candidate and reports which rule selected it.
///
/// Returns `None` only for an empty candidate list.
pub fn select_with_tier<'a>(
    track: &SourceTrack,
    candidates: &'a [CandidateResult],
) -> Option<Selection<'a>> {
    let first = candidates.first()?;

    let name = track.name.to_lowercase();
    let artist = track.artist.to_lowercase();

    for candidate in candidates {
        let title = candidate.title.to_lowercase();
        if !title.contains(&name) {
            continue;
        }
        let tier = if title.contains(&artist) {
            MatchTier::ArtistAndTitle
        } else {
            MatchTier::TitleOnly
        };
        return Some(Selection { candidate, tier });
    }

    Some(Selection {
        candidate: first,
        tier: MatchTier::Positional,
    })
}

/// Selects the best candidate for a track.
///
/// Returns `None` only when `candidates` is empty; otherwise some element
/// of `candidates` is always returned.
pub fn select_best_match<'a>(
    track: &SourceTrack,
    candidates: &'a [CandidateResult],
) -> Option<&'a CandidateResult> {
    select_with_tier(track, candidates).map(|s| s.candidate)
}
