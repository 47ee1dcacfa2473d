//! Tempo - resolve and walk streaming audio sources from the terminal
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tempo_cli::{config::CliConfig, dry_run::DryRunEngine, logging};
use tempo_core::{Track, TrackId, UNKNOWN_ARTIST, UNKNOWN_TITLE};
use tempo_playback::{PlaybackSession, PlayerEngine};
use tempo_resolver::{
    filter_formats, format::rank_by_bitrate, generate_nonce, DeviceProfileKind, Encoding,
    FormatFilter, ProfileStore,
    RemoteConfigClient, RemoteConfigWorker, RetryController, SourceResolver, StreamResolver,
    REFRESH_CHANNEL_CAPACITY,
};

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Resolve streaming audio sources and drive a playback queue", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TEMPO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the best audio source for a content id
    Resolve {
        /// Upstream content id
        id: String,
        /// Preferred device profile (ios or android)
        #[arg(short, long)]
        profile: Option<String>,
        /// Override the configured attempt count
        #[arg(short, long)]
        attempts: Option<u32>,
    },
    /// List the audio encodings of a content id, best first
    Formats {
        /// Upstream content id
        id: String,
        /// Device profile (ios or android)
        #[arg(short, long)]
        profile: Option<String>,
        /// Only show audio encodings that qualify as best-audio candidates
        #[arg(long)]
        best_audio: bool,
    },
    /// Print a random nonce
    Nonce {
        /// Nonce length
        #[arg(short, long, default_value_t = 16)]
        length: usize,
    },
    /// Show the player request body a profile would send
    Profile {
        /// Device profile (ios or android)
        kind: Option<String>,
        /// Content id placed in the body
        #[arg(long, default_value = "dQw4w9WgXcQ")]
        id: String,
    },
    /// Resolve every id of a queue in order through a silent engine
    Queue {
        /// Content ids, in queue order
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.validate()?;
    logging::init(&config.log_level);

    match cli.command {
        Commands::Resolve {
            id,
            profile,
            attempts,
        } => resolve(&config, &id, profile.as_deref(), attempts).await?,
        Commands::Formats {
            id,
            profile,
            best_audio,
        } => formats(&config, &id, profile.as_deref(), best_audio).await?,
        Commands::Nonce { length } => println!("{}", generate_nonce(length)),
        Commands::Profile { kind, id } => show_profile(&config, kind.as_deref(), &id)?,
        Commands::Queue { ids } => walk_queue(&config, ids).await?,
    }

    Ok(())
}

fn profile_kind(config: &CliConfig, name: Option<&str>) -> DeviceProfileKind {
    name.map_or_else(|| config.default_profile(), DeviceProfileKind::parse)
}

/// Resolver stack shared by the network commands
///
/// The remote config worker runs for the lifetime of the process and is
/// fed by the retry controller.
fn build_resolver(config: &CliConfig) -> anyhow::Result<RetryController<StreamResolver>> {
    let resolver_config = config.resolver_config();
    let profiles = Arc::new(ProfileStore::new());

    let remote = RemoteConfigClient::new(&resolver_config, Arc::clone(&profiles))?;
    let (refresh_tx, refresh_rx) = RemoteConfigWorker::channel(REFRESH_CHANNEL_CAPACITY);
    RemoteConfigWorker::new(remote).spawn(refresh_rx);

    let resolver = StreamResolver::new(&resolver_config, profiles)?;
    Ok(RetryController::new(resolver, config.retry_policy()).with_refresh(refresh_tx))
}

async fn resolve(
    config: &CliConfig,
    id: &str,
    profile: Option<&str>,
    attempts: Option<u32>,
) -> anyhow::Result<()> {
    let controller = build_resolver(config)?;
    let kind = profile_kind(config, profile);
    let attempts = attempts.unwrap_or(config.retry.max_attempts);

    tracing::info!(id, profile = %kind, attempts, "Resolving");
    let source = controller
        .resolve_with_retries(id, attempts, kind)
        .await
        .with_context(|| format!("could not resolve {id}"))?;

    println!("{}", serde_json::to_string_pretty(&source)?);
    Ok(())
}

async fn formats(
    config: &CliConfig,
    id: &str,
    profile: Option<&str>,
    best_audio: bool,
) -> anyhow::Result<()> {
    let resolver = StreamResolver::new(&config.resolver_config(), Arc::new(ProfileStore::new()))?;
    let kind = profile_kind(config, profile);
    let encodings = resolver.formats(id, kind).await?;

    let mut shown: Vec<Encoding> = if best_audio {
        filter_formats(&encodings, &FormatFilter::best_audio())
            .into_iter()
            .cloned()
            .collect()
    } else {
        encodings.into_iter().filter(Encoding::is_audio).collect()
    };
    rank_by_bitrate(&mut shown);

    if shown.is_empty() {
        println!("No audio formats for {id}");
        return Ok(());
    }

    for encoding in shown {
        println!(
            "{:>5}  {:>8}  {}",
            encoding
                .itag
                .map_or_else(|| "-".to_string(), |itag| itag.to_string()),
            encoding.bitrate,
            encoding.mime_type
        );
    }
    Ok(())
}

fn show_profile(config: &CliConfig, kind: Option<&str>, id: &str) -> anyhow::Result<()> {
    let store = ProfileStore::new();
    let profile = store.snapshot(profile_kind(config, kind));

    println!("User-Agent: {}", profile.user_agent);
    println!("{}", serde_json::to_string_pretty(&profile.build_body(id))?);
    Ok(())
}

async fn walk_queue(config: &CliConfig, ids: Vec<String>) -> anyhow::Result<()> {
    let tracks = ids
        .into_iter()
        .map(|id| TrackId::parse(id).map(|id| Track::new(id, UNKNOWN_TITLE, UNKNOWN_ARTIST)))
        .collect::<Result<Vec<_>, _>>()?;
    let count = tracks.len();

    let engine = Arc::new(DryRunEngine::new());
    let resolver: Arc<dyn SourceResolver> = Arc::new(build_resolver(config)?);
    let session = PlaybackSession::new(
        Arc::clone(&engine) as Arc<dyn PlayerEngine>,
        resolver,
        config.playback_config(),
    );
    session.set_queue(Some(tracks));

    for index in 0..count {
        match session.play_at_index(index).await {
            Ok(outcome) => {
                let snapshot = session.snapshot();
                let title = snapshot
                    .current_track
                    .map(|track| format!("{} - {}", track.artist, track.title))
                    .unwrap_or_default();
                println!("{index:>3}  {outcome:?}  {title}");
            }
            Err(e) => println!("{index:>3}  failed: {e}"),
        }
    }

    session.shutdown().await?;
    tracing::info!(loaded = engine.loaded().len(), "Queue walk finished");
    Ok(())
}
