//! playlist-bridge: re-create music streaming playlists on a video platform.
//!
//! Track metadata is scraped from the public playlist page with a cascade
//! of extraction strategies, each track is turned into a search query, the
//! best video among the search results is selected, and the videos are
//! collected into a playlist on the destination account.
//!
//! # Modules
//!
//! - [`types`]: Core data types (SourceTrack, CandidateResult, TransferOutcome)
//! - [`extract`]: Markup extraction strategies and the playlist summary
//! - [`matching`]: Query building and candidate selection
//! - [`source`]: Playlist references and the page fetcher
//! - [`destination`]: Video platform client and OAuth
//! - [`transfer`]: Transfer orchestration and reports
//! - [`config`]: Runtime configuration (BridgeConfig)
//! - [`error`]: Error types and codes (BridgeError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use playlist_bridge::{
//!     config::BridgeConfig,
//!     destination::YouTubeClient,
//!     source::HttpMarkupSource,
//!     transfer::{report, TransferOptions, TransferService},
//! };
//!
//! let config = BridgeConfig::load(None)?;
//! let source = HttpMarkupSource::new(&config.source)?;
//! let destination = YouTubeClient::connect(&config)?;
//!
//! let service = TransferService::new(source, destination, TransferOptions::from(&config.transfer));
//! let outcome = service.transfer_playlist("37i9dQZF1DXcBWIGoYBM5M", None)?;
//! report::print_outcome(&outcome);
//! ```

pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod extract;
pub mod logging;
pub mod matching;
pub mod source;
pub mod transfer;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::BridgeConfig;
pub use destination::Destination;
pub use error::{BridgeError, ErrorCode, Result};
pub use extract::{extract_playlist_summary, extract_tracks};
pub use matching::{build_query, select_best_match, MatchTier};
pub use source::{parse_playlist_id, MarkupSource};
pub use transfer::{CancellationToken, TransferOptions, TransferService};
pub use types::{
    BatchSummary, CandidateResult, DestinationPlaylist, SourcePlaylist, SourceTrack,
    TransferOutcome,
};
