//! Human-readable transfer reports, printed to stdout.

use std::fmt::Write as _;

use crate::types::{BatchSummary, TransferOutcome};

const NAME_WIDTH: usize = 30;

/// Renders the result of one playlist transfer.
pub fn format_outcome(outcome: &TransferOutcome) -> String {
    let rule = "=".repeat(50);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "Transfer Result: {}", outcome.playlist_name);
    let _ = writeln!(out, "Total Tracks: {}", outcome.total_tracks);
    let _ = writeln!(out, "Matched: {}", outcome.matched_count);
    let _ = writeln!(out, "Failed: {}", outcome.failed_count);
    if outcome.tiers.positional > 0 {
        let _ = writeln!(
            out,
            "Best guesses (no title match): {}",
            outcome.tiers.positional
        );
    }
    if outcome.cancelled {
        let _ = writeln!(
            out,
            "Cancelled after {} of {} tracks",
            outcome.processed(),
            outcome.total_tracks
        );
    }

    if !outcome.errors.is_empty() {
        let _ = writeln!(out, "\nErrors:");
        for error in &outcome.errors {
            let _ = writeln!(out, "  - {}", error);
        }
    }
    let _ = writeln!(out, "{}", rule);
    out
}

/// Renders one row per playlist followed by the totals line.
pub fn format_summary(summary: &BatchSummary) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "TRANSFER SUMMARY");
    let _ = writeln!(out, "{}", rule);

    for outcome in &summary.outcomes {
        let _ = writeln!(
            out,
            "{:<width$} | {}/{} | {} failed{}",
            outcome.playlist_name,
            outcome.matched_count,
            outcome.total_tracks,
            outcome.failed_count,
            if outcome.cancelled { " (cancelled)" } else { "" },
            width = NAME_WIDTH
        );
    }

    if !summary.skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped playlists:");
        for line in &summary.skipped {
            let _ = writeln!(out, "  - {}", line);
        }
    }

    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(
        out,
        "TOTAL: {} playlists, {} tracks, {} matched, {} failed",
        summary.total_playlists(),
        summary.total_tracks(),
        summary.total_matched(),
        summary.total_failed()
    );
    if summary.cancelled {
        let _ = writeln!(out, "Batch cancelled; remaining playlists were not transferred");
    }
    let _ = writeln!(out, "{}", rule);
    out
}

pub fn print_outcome(outcome: &TransferOutcome) {
    print!("{}", format_outcome(outcome));
}

pub fn print_summary(summary: &BatchSummary) {
    print!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchTier;
    use crate::types::SourceTrack;

    fn outcome() -> TransferOutcome {
        let mut outcome = TransferOutcome::new("Road Trip", 2);
        outcome.record_match(MatchTier::Positional);
        outcome.record_failure(&SourceTrack::new("Song", "Artist"), "No matching video found");
        outcome
    }

    #[test]
    fn outcome_lists_every_error() {
        let text = format_outcome(&outcome());
        assert!(text.contains("Transfer Result: Road Trip"));
        assert!(text.contains("Total Tracks: 2"));
        assert!(text.contains("Matched: 1"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains("  - Artist - Song: No matching video found"));
        assert!(text.contains("Best guesses (no title match): 1"));
        assert!(!text.contains("Cancelled"));
    }

    #[test]
    fn summary_rows_and_totals() {
        let mut summary = BatchSummary::default();
        summary.push(outcome());
        summary.skipped.push("spotify:playlist:x: HTTP 404".to_string());

        let text = format_summary(&summary);
        assert!(text.contains("Road Trip                      | 1/2 | 1 failed"));
        assert!(text.contains("  - spotify:playlist:x: HTTP 404"));
        assert!(text.contains("TOTAL: 1 playlists, 2 tracks, 1 matched, 1 failed"));
    }
}
