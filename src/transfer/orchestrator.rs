//! Playlist transfer: extraction, matching and destination mutation.
//!
//! Tracks are processed strictly in order. A failed track is recorded and
//! skipped; a failed playlist is recorded and skipped. Only errors whose code
//! is fatal (collaborator construction, done by the caller) abort a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::TransferConfig;
use crate::destination::Destination;
use crate::error::{BridgeError, Result};
use crate::extract::{extract_playlist_summary, extract_tracks};
use crate::matching::{build_query, select_with_tier, MatchTier};
use crate::source::{parse_playlist_id, MarkupSource};
use crate::types::{BatchSummary, DestinationPlaylist, SourceTrack, TransferOutcome};

/// Description given to destination playlists; the source id is appended.
pub const DESCRIPTION_PREFIX: &str = "Transferred from source playlist: ";

/// Failure reason recorded when a search returns nothing.
pub const NO_MATCH_REASON: &str = "No matching video found";

/// Shared flag asking a running transfer to stop.
///
/// Checked before each track and each playlist. Work already done is kept
/// and reported.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress of a single playlist transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Init,
    NameResolved,
    TracksFetched,
    DestinationResolved,
    Transferring,
    Done,
}

impl TransferStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStage::Init => "init",
            TransferStage::NameResolved => "name_resolved",
            TransferStage::TracksFetched => "tracks_fetched",
            TransferStage::DestinationResolved => "destination_resolved",
            TransferStage::Transferring => "transferring",
            TransferStage::Done => "done",
        }
    }
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Behaviour switches for a transfer run.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Skip every mutation; matched tracks still count as matched.
    pub dry_run: bool,
    /// Reuse a destination playlist with the same title.
    pub skip_existing: bool,
    /// Pause after each matched track.
    pub track_delay: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_existing: true,
            track_delay: Duration::from_millis(100),
        }
    }
}

impl From<&TransferConfig> for TransferOptions {
    fn from(config: &TransferConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            skip_existing: config.skip_existing,
            track_delay: Duration::from_millis(config.track_delay_ms),
        }
    }
}

/// Moves playlists from a markup source to a destination.
pub struct TransferService<S: MarkupSource, D: Destination> {
    source: S,
    destination: D,
    options: TransferOptions,
    cancel: CancellationToken,
}

impl<S: MarkupSource, D: Destination> TransferService<S, D> {
    pub fn new(source: S, destination: D, options: TransferOptions) -> Self {
        Self {
            source,
            destination,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    fn enter(&self, stage: TransferStage, source_id: &str) {
        tracing::debug!(stage = %stage, playlist = %source_id, "transfer stage");
    }

    /// Transfers one playlist.
    ///
    /// The only error is a page that could not be fetched. When no
    /// destination playlist can be looked up or created, every track is
    /// recorded as failed with that reason.
    pub fn transfer_playlist(
        &self,
        source_id: &str,
        explicit_name: Option<&str>,
    ) -> Result<TransferOutcome> {
        self.enter(TransferStage::Init, source_id);
        let markup = self.source.fetch_markup(source_id)?;

        let mut playlist = extract_playlist_summary(&markup, source_id, explicit_name);
        self.enter(TransferStage::NameResolved, source_id);

        let tracks = extract_tracks(&markup);
        playlist.set_track_count(tracks.len());
        self.enter(TransferStage::TracksFetched, source_id);
        tracing::info!(playlist = %playlist.name, tracks = tracks.len(), "transferring playlist");

        let mut outcome = TransferOutcome::new(playlist.name.clone(), tracks.len());
        if tracks.is_empty() {
            tracing::warn!(playlist = %playlist.name, "no tracks found in page, nothing to transfer");
            self.enter(TransferStage::Done, source_id);
            return Ok(outcome);
        }

        let description = format!("{}{}", DESCRIPTION_PREFIX, source_id);
        let target = match self.resolve_destination(&playlist.name, &description) {
            Ok(target) => target,
            Err(e) => {
                tracing::error!(playlist = %playlist.name, error = %e, "no destination playlist");
                for track in &tracks {
                    outcome.record_failure(track, e.short_message());
                }
                self.enter(TransferStage::Done, source_id);
                return Ok(outcome);
            }
        };
        self.enter(TransferStage::DestinationResolved, source_id);

        self.enter(TransferStage::Transferring, source_id);
        for (index, track) in tracks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    playlist = %playlist.name,
                    remaining = tracks.len() - index,
                    "transfer cancelled"
                );
                outcome.cancelled = true;
                break;
            }

            match self.transfer_track(track, &target) {
                Ok(tier) => {
                    tracing::info!(
                        index = index + 1,
                        total = tracks.len(),
                        track = %track.label(),
                        tier = %tier,
                        "matched"
                    );
                    outcome.record_match(tier);
                    if !self.options.track_delay.is_zero() {
                        thread::sleep(self.options.track_delay);
                    }
                }
                Err(reason) => {
                    tracing::warn!(
                        index = index + 1,
                        total = tracks.len(),
                        track = %track.label(),
                        reason = %reason,
                        "track failed"
                    );
                    outcome.record_failure(track, reason);
                }
            }
        }

        self.enter(TransferStage::Done, source_id);
        Ok(outcome)
    }

    /// Searches, selects and (outside dry-run) adds one track.
    ///
    /// The error is the reason recorded against the track.
    fn transfer_track(
        &self,
        track: &SourceTrack,
        target: &DestinationPlaylist,
    ) -> std::result::Result<MatchTier, String> {
        let query = build_query(track);
        tracing::debug!(query = %query, "searching");

        let candidates = self
            .destination
            .search(&query)
            .map_err(|e| e.short_message().to_string())?;

        let selection = select_with_tier(track, &candidates).ok_or_else(|| NO_MATCH_REASON.to_string())?;
        tracing::debug!(
            video = %selection.candidate.id,
            title = %selection.candidate.title,
            tier = %selection.tier,
            "selected candidate"
        );
        if !selection.tier.is_confident() {
            tracing::warn!(
                track = %track.label(),
                video = %selection.candidate.title,
                "no title match, using the first result"
            );
        }

        if !self.options.dry_run {
            self.destination
                .add_to_playlist(&target.id, &selection.candidate.id)
                .map_err(|e| e.short_message().to_string())?;
        }

        Ok(selection.tier)
    }

    /// Finds or creates the destination playlist.
    ///
    /// With `skip_existing` a playlist whose title matches (ignoring case) is
    /// reused. The lookup runs in dry-run too since it does not mutate anything.
    fn resolve_destination(&self, title: &str, description: &str) -> Result<DestinationPlaylist> {
        if self.options.skip_existing {
            if let (true, Some(existing)) = self.destination.playlist_exists(title)? {
                tracing::info!(title = %existing.title, id = %existing.id, "reusing existing playlist");
                return Ok(existing);
            }
        }

        if self.options.dry_run {
            tracing::info!(title = %title, "dry run: would create playlist");
            return Ok(DestinationPlaylist::placeholder(title, description));
        }

        self.destination.create_playlist(title, description)
    }

    /// Transfers one playlist and reports it as a single-entry summary.
    ///
    /// A playlist-level failure lands in `skipped`; only a fatal error code
    /// is returned.
    pub fn transfer_single(
        &self,
        source_id: &str,
        explicit_name: Option<&str>,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        match self.transfer_playlist(source_id, explicit_name) {
            Ok(outcome) => {
                summary.cancelled = outcome.cancelled;
                summary.push(outcome);
            }
            Err(e) if e.code.is_fatal() => return Err(e),
            Err(e) => {
                tracing::error!(playlist = %source_id, error = %e, "playlist transfer failed");
                summary.skipped.push(skip_line(source_id, &e));
            }
        }
        Ok(summary)
    }

    /// Transfers every playlist in `links`, in order.
    ///
    /// A playlist that cannot be transferred is listed in `skipped` and the
    /// batch moves on.
    pub fn transfer_all(&self, links: &[String]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for (index, link) in links.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(remaining = links.len() - index, "batch cancelled");
                summary.cancelled = true;
                break;
            }

            tracing::info!(index = index + 1, total = links.len(), link = %link, "processing playlist");

            let result = parse_playlist_id(link).and_then(|id| self.transfer_playlist(&id, None));
            match result {
                Ok(outcome) => {
                    let cancelled = outcome.cancelled;
                    summary.push(outcome);
                    if cancelled {
                        summary.cancelled = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(link = %link, error = %e, "playlist transfer failed");
                    summary.skipped.push(skip_line(link, &e));
                }
            }
        }

        summary
    }
}

fn skip_line(link: &str, error: &BridgeError) -> String {
    format!("{}: {}", link, error.short_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::CandidateResult;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeSource(HashMap<String, String>);

    impl MarkupSource for FakeSource {
        fn fetch_markup(&self, source_id: &str) -> Result<String> {
            self.0
                .get(source_id)
                .cloned()
                .ok_or_else(|| BridgeError::fetch_status(404, source_id))
        }
    }

    #[derive(Default)]
    struct FakeDestination {
        existing: Vec<DestinationPlaylist>,
        lookup_error: bool,
        create_error: bool,
        failing_queries: Vec<String>,
        empty_queries: Vec<String>,
        failing_adds: Vec<String>,
        created: RefCell<Vec<String>>,
        added: RefCell<Vec<(String, String)>>,
        searches: RefCell<Vec<String>>,
        cancel_after_searches: Option<(usize, CancellationToken)>,
    }

    impl Destination for FakeDestination {
        fn search(&self, query: &str) -> Result<Vec<CandidateResult>> {
            self.searches.borrow_mut().push(query.to_string());
            if let Some((limit, token)) = &self.cancel_after_searches {
                if self.searches.borrow().len() >= *limit {
                    token.cancel();
                }
            }
            if self.failing_queries.iter().any(|q| q == query) {
                return Err(BridgeError::search_failed("quota exceeded"));
            }
            if self.empty_queries.iter().any(|q| q == query) {
                return Ok(Vec::new());
            }
            Ok(vec![
                CandidateResult::new("other", "Unrelated Upload", "someone"),
                CandidateResult::new(format!("v-{}", query), format!("{} (Official)", query), "channel"),
            ])
        }

        fn playlist_exists(&self, title: &str) -> Result<(bool, Option<DestinationPlaylist>)> {
            if self.lookup_error {
                return Err(BridgeError::lookup_failed("HTTP 500"));
            }
            let found = crate::destination::find_by_title(&self.existing, title).cloned();
            Ok((found.is_some(), found))
        }

        fn create_playlist(&self, title: &str, description: &str) -> Result<DestinationPlaylist> {
            if self.create_error {
                return Err(BridgeError::create_failed("quota exceeded"));
            }
            self.created.borrow_mut().push(title.to_string());
            Ok(DestinationPlaylist {
                id: format!("PL-{}", title),
                title: title.to_string(),
                description: description.to_string(),
            })
        }

        fn add_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
            if self.failing_adds.iter().any(|v| v == video_id) {
                return Err(BridgeError::add_failed("forbidden"));
            }
            self.added
                .borrow_mut()
                .push((playlist_id.to_string(), video_id.to_string()));
            Ok(())
        }
    }

    const PAGE: &str = r#"<meta property="og:title" content="Road Trip | Spotify">
Daft Punk - One More Time
Ed Sheeran - Shape of You
Justice - Genesis Remix"#;

    fn source() -> FakeSource {
        FakeSource(HashMap::from([
            ("trip".to_string(), PAGE.to_string()),
            ("empty".to_string(), "<html></html>".to_string()),
        ]))
    }

    fn options(dry_run: bool) -> TransferOptions {
        TransferOptions {
            dry_run,
            skip_existing: true,
            track_delay: Duration::ZERO,
        }
    }

    #[test]
    fn one_failed_search_does_not_stop_the_playlist() {
        let destination = FakeDestination {
            failing_queries: vec!["Ed Sheeran Shape of You".to_string()],
            ..Default::default()
        };
        let service = TransferService::new(source(), &destination, options(false));

        let outcome = service.transfer_playlist("trip", None).unwrap();
        assert_eq!(outcome.playlist_name, "Road Trip");
        assert_eq!(outcome.total_tracks, 3);
        assert_eq!(outcome.matched_count, 2);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Ed Sheeran - Shape of You: "));
        assert!(outcome.errors[0].contains("quota exceeded"));
        assert!(outcome.is_complete());

        // the third track was still searched and added
        assert_eq!(destination.searches.borrow().len(), 3);
        assert_eq!(destination.added.borrow().len(), 2);
        assert_eq!(destination.created.borrow().as_slice(), ["Road Trip"]);
    }

    #[test]
    fn empty_search_and_failed_add_are_recorded() {
        let destination = FakeDestination {
            empty_queries: vec!["Daft Punk One More Time".to_string()],
            failing_adds: vec!["v-Justice Genesis Remix".to_string()],
            ..Default::default()
        };
        let service = TransferService::new(source(), &destination, options(false));

        let outcome = service.transfer_playlist("trip", None).unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.failed_count, 2);
        assert_eq!(
            outcome.errors[0],
            format!("Daft Punk - One More Time: {}", NO_MATCH_REASON)
        );
        assert!(outcome.errors[1].starts_with("Justice - Genesis Remix: "));
    }

    #[test]
    fn selection_prefers_title_match_and_tallies_tiers() {
        let destination = FakeDestination::default();
        let service = TransferService::new(source(), &destination, options(false));

        let outcome = service.transfer_playlist("trip", None).unwrap();
        // the second candidate contains both name and artist
        assert!(destination
            .added
            .borrow()
            .iter()
            .all(|(_, video)| video.starts_with("v-")));
        assert_eq!(outcome.tiers.artist_and_title, 3);
    }

    #[test]
    fn dry_run_mutates_nothing_but_counts_matches() {
        let destination = FakeDestination::default();
        let service = TransferService::new(source(), &destination, options(true));

        let outcome = service.transfer_playlist("trip", Some("My Name")).unwrap();
        assert_eq!(outcome.playlist_name, "My Name");
        assert_eq!(outcome.matched_count, 3);
        assert!(destination.created.borrow().is_empty());
        assert!(destination.added.borrow().is_empty());
    }

    #[test]
    fn existing_playlist_is_reused_case_insensitively() {
        let destination = FakeDestination {
            existing: vec![DestinationPlaylist {
                id: "PL-existing".to_string(),
                title: "ROAD TRIP".to_string(),
                description: String::new(),
            }],
            ..Default::default()
        };
        let service = TransferService::new(source(), &destination, options(false));

        service.transfer_playlist("trip", None).unwrap();
        assert!(destination.created.borrow().is_empty());
        assert!(destination
            .added
            .borrow()
            .iter()
            .all(|(playlist, _)| playlist == "PL-existing"));
    }

    #[test]
    fn skip_existing_off_always_creates() {
        let destination = FakeDestination {
            existing: vec![DestinationPlaylist {
                id: "PL-existing".to_string(),
                title: "Road Trip".to_string(),
                description: String::new(),
            }],
            ..Default::default()
        };
        let mut opts = options(false);
        opts.skip_existing = false;
        let service = TransferService::new(source(), &destination, opts);

        service.transfer_playlist("trip", None).unwrap();
        assert_eq!(destination.created.borrow().len(), 1);
    }

    #[test]
    fn empty_page_transfers_nothing() {
        let destination = FakeDestination::default();
        let service = TransferService::new(source(), &destination, options(false));

        let outcome = service.transfer_playlist("empty", None).unwrap();
        assert_eq!(outcome.total_tracks, 0);
        assert!(outcome.is_complete());
        assert!(destination.created.borrow().is_empty());
    }

    #[test]
    fn batch_skips_failed_playlists_and_keeps_order() {
        let destination = FakeDestination::default();
        let service = TransferService::new(source(), &destination, options(true));
        let links = vec![
            "spotify:playlist:missing".to_string(),
            "https://open.spotify.com/playlist/trip?si=1".to_string(),
            "https://example.com/bad".to_string(),
            "spotify:playlist:empty".to_string(),
        ];

        let summary = service.transfer_all(&links);
        assert_eq!(summary.total_playlists(), 2);
        assert_eq!(summary.outcomes[0].playlist_name, "Road Trip");
        assert_eq!(summary.total_tracks(), 3);
        assert_eq!(summary.total_matched(), 3);
        assert_eq!(summary.skipped.len(), 2);
        assert!(summary.skipped[0].starts_with("spotify:playlist:missing: "));
        assert!(!summary.cancelled);
    }

    #[test]
    fn cancellation_keeps_completed_work() {
        let token = CancellationToken::new();
        let destination = FakeDestination {
            cancel_after_searches: Some((1, token.clone())),
            ..Default::default()
        };
        let service =
            TransferService::new(source(), &destination, options(false)).with_cancellation(token);

        let summary = service.transfer_all(&["trip".to_string(), "trip".to_string()]);
        assert!(summary.cancelled);
        assert_eq!(summary.total_playlists(), 1);

        let outcome = &summary.outcomes[0];
        assert!(outcome.cancelled);
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.processed(), 1);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn fetch_failure_is_a_playlist_error() {
        let destination = FakeDestination::default();
        let service = TransferService::new(source(), &destination, options(false));
        let err = service.transfer_playlist("missing", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::FetchFailed);
    }

    #[test]
    fn failed_lookup_fails_every_track() {
        let destination = FakeDestination {
            lookup_error: true,
            ..Default::default()
        };
        let service = TransferService::new(source(), &destination, options(false));

        let outcome = service.transfer_playlist("trip", None).unwrap();
        assert_eq!(outcome.total_tracks, 3);
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.failed_count, 3);
        assert_eq!(
            outcome.errors[0],
            "Daft Punk - One More Time: Could not list playlists: HTTP 500"
        );
        assert!(destination.searches.borrow().is_empty());
        assert!(destination.created.borrow().is_empty());
    }

    #[test]
    fn failed_create_fails_every_track() {
        let destination = FakeDestination {
            create_error: true,
            ..Default::default()
        };
        let service = TransferService::new(source(), &destination, options(false));

        let outcome = service.transfer_playlist("trip", None).unwrap();
        assert_eq!(outcome.failed_count, 3);
        assert!(outcome
            .errors
            .iter()
            .all(|e| e.ends_with("Could not create playlist: quota exceeded")));
        assert!(destination.added.borrow().is_empty());
    }

    #[test]
    fn single_transfer_reports_instead_of_failing() {
        let destination = FakeDestination {
            lookup_error: true,
            ..Default::default()
        };
        let service = TransferService::new(source(), &destination, options(false));

        let summary = service.transfer_single("trip", None).unwrap();
        assert_eq!(summary.total_playlists(), 1);
        assert_eq!(summary.total_failed(), 3);

        let summary = service.transfer_single("missing", None).unwrap();
        assert_eq!(summary.total_playlists(), 0);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].starts_with("missing: Playlist request failed"));
    }

    #[test]
    fn single_transfer_propagates_fatal_errors() {
        struct RevokedSource;

        impl MarkupSource for RevokedSource {
            fn fetch_markup(&self, _source_id: &str) -> Result<String> {
                Err(BridgeError::auth_failed("token revoked"))
            }
        }

        let destination = FakeDestination::default();
        let service = TransferService::new(RevokedSource, &destination, options(false));
        let err = service.transfer_single("trip", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }

    #[test]
    fn options_from_config() {
        let config = TransferConfig {
            dry_run: true,
            track_delay_ms: 5,
            ..TransferConfig::default()
        };
        let opts = TransferOptions::from(&config);
        assert!(opts.dry_run);
        assert!(opts.skip_existing);
        assert_eq!(opts.track_delay, Duration::from_millis(5));
    }
}
