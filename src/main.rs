//! playlist-bridge: re-create music streaming playlists on a video platform.
//!
//! Subcommands:
//! - list: show the configured source playlists
//! - transfer: move one playlist (or all configured ones with --all)
//! - debug: show what the extractor finds on a playlist page

use anyhow::{bail, Context};

use playlist_bridge::cli::{Cli, Command, DebugArgs, TransferArgs};
use playlist_bridge::config::BridgeConfig;
use playlist_bridge::destination::YouTubeClient;
use playlist_bridge::error::BridgeError;
use playlist_bridge::extract::{extract_playlist_summary, extract_tracks_with_strategy};
use playlist_bridge::logging;
use playlist_bridge::matching::build_query;
use playlist_bridge::source::{parse_playlist_id, HttpMarkupSource, MarkupSource, SourceCatalog};
use playlist_bridge::transfer::{report, CancellationToken, TransferOptions, TransferService};
use playlist_bridge::types::SourceTrack;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let mut config =
        BridgeConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.verbose {
        config.logging.verbose = true;
    }
    if cli.dry_run {
        config.transfer.dry_run = true;
    }

    logging::init(&config.logging);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting playlist-bridge");

    if let Some(message) = config.validate() {
        return Err(BridgeError::configuration(message).into());
    }
    if cli.needs_destination() {
        config.validate_destination()?;
    }

    match &cli.command {
        Command::List => run_list(&config),
        Command::Transfer(args) => run_transfer(&config, args),
        Command::Debug(args) => run_debug(&config, args),
    }
}

/// Prints every configured playlist with its track count.
fn run_list(config: &BridgeConfig) -> anyhow::Result<()> {
    let links = &config.source.playlist_links;
    if links.is_empty() {
        println!("No playlists configured.");
        println!("Set BRIDGE_PLAYLIST_LINKS or source.playlist_links in the config file.");
        return Ok(());
    }

    let source = HttpMarkupSource::new(&config.source)?;
    let playlists = SourceCatalog::new(&source, links).playlists();

    println!("Found {} playlists:", playlists.len());
    for (index, playlist) in playlists.iter().enumerate() {
        println!(
            "{:>3}. {} ({} tracks) [{}]",
            index + 1,
            playlist.name,
            playlist.track_count,
            playlist.id
        );
    }
    Ok(())
}

/// Transfers one playlist or the whole configured batch.
fn run_transfer(config: &BridgeConfig, args: &TransferArgs) -> anyhow::Result<()> {
    let source = HttpMarkupSource::new(&config.source)?;
    let destination = YouTubeClient::connect(config).context("could not connect to the video platform")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    let options = TransferOptions::from(&config.transfer);
    let service = TransferService::new(source, destination, options).with_cancellation(cancel);

    if service.options().dry_run {
        println!("[DRY RUN] Matching only; no playlists will be created or changed.");
    }

    if args.all {
        let links = &config.source.playlist_links;
        if links.is_empty() {
            bail!(BridgeError::configuration(
                "no playlists configured for --all (set BRIDGE_PLAYLIST_LINKS or source.playlist_links)"
            ));
        }
        println!("Found {} playlists to transfer", links.len());
        let summary = service.transfer_all(links);
        report::print_summary(&summary);
    } else {
        let Some(playlist) = args.playlist.as_deref() else {
            bail!("a playlist is required unless --all is given");
        };
        let id = parse_playlist_id(playlist)?;
        let summary = service
            .transfer_single(&id, args.name.as_deref())
            .with_context(|| format!("failed to transfer playlist {}", id))?;
        match summary.outcomes.as_slice() {
            [outcome] => report::print_outcome(outcome),
            _ => report::print_summary(&summary),
        }
    }

    Ok(())
}

/// Shows the summary and tracks extracted from a playlist page.
fn run_debug(config: &BridgeConfig, args: &DebugArgs) -> anyhow::Result<()> {
    let id = parse_playlist_id(&args.playlist)?;
    let source = HttpMarkupSource::new(&config.source)?;
    let markup = source.fetch_markup(&id)?;

    let playlist = extract_playlist_summary(&markup, &id, args.name.as_deref());
    println!("Playlist: {} [{}]", playlist.name, playlist.id);
    if !playlist.description.is_empty() {
        println!("Description: {}", playlist.description);
    }
    println!("Markup size: {} bytes", markup.len());

    match extract_tracks_with_strategy(&markup) {
        Some((strategy, tracks)) => {
            println!("Strategy: {}", strategy);
            println!("Tracks: {}", tracks.len());
            for (index, track) in tracks.iter().enumerate() {
                println!("{}", track_line(index, track));
            }
        }
        None => println!("No tracks found."),
    }

    if let Some(path) = &args.save_html {
        let page = source.fetch_page(&id)?;
        std::fs::write(path, page)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Saved page markup to {}", path.display());
    }

    Ok(())
}

fn track_line(index: usize, track: &SourceTrack) -> String {
    let duration = track
        .duration_display()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default();
    format!(
        "{:>3}. {}{}\n     query: {}",
        index + 1,
        track.label(),
        duration,
        build_query(track)
    )
}

/// Trips `cancel` on the first Ctrl-C; a second one exits immediately.
fn spawn_interrupt_watcher(cancel: CancellationToken) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "interrupt handling unavailable");
                return;
            }
        };

        runtime.block_on(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("interrupt received, stopping after the current track");
            cancel.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted.");
                std::process::exit(130);
            }
        });
    });
}
