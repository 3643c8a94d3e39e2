//! Search query construction.

use crate::types::SourceTrack;

/// Featuring markers removed from queries. Matched literally and case-sensitively.
const FEATURING_TOKENS: [&str; 3] = ["ft.", "feat.", "featuring"];

/// Builds the search query for a track.
///
/// `"<artist> <name>"` with featuring markers removed and whitespace
/// collapsed. Case and punctuation are left alone; tolerance is the
/// selector's job.
pub fn build_query(track: &SourceTrack) -> String {
    let mut query = format!("{} {}", track.artist, track.name);
    for token in FEATURING_TOKENS {
        query = query.replace(token, "");
    }
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}
