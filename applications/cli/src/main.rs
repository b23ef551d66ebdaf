/// Cadence - command-line player
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use cadence_core::{Track, TrackCatalog};
use cadence_cli::{directory_catalog, shell, CadenceConfig, Player};
use cadence_library::{grouping, sort_tracks, ArtworkCache, GroupingMode, TrackOrder};
use cadence_playback::LoopMode;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence local music player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./cadence.toml when present)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tracks found in a directory
    Scan {
        /// Directory to scan (default: configured library roots)
        dir: Option<PathBuf>,
        /// Sort order, e.g. title, artist_desc, duration
        #[arg(short, long, default_value = "title")]
        order: TrackOrder,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the groups of a grouping mode
    Groups {
        dir: Option<PathBuf>,
        /// tracks, artists, albums, years or genres
        #[arg(short, long, default_value = "artists")]
        mode: GroupingMode,
        /// Look up each group's artwork
        #[arg(long)]
        artwork: bool,
        #[arg(long)]
        json: bool,
    },
    /// Open the interactive player
    Play {
        dir: Option<PathBuf>,
        #[arg(short, long, default_value = "tracks")]
        mode: GroupingMode,
        /// Group key to use as the playlist (see `cadence groups`)
        #[arg(short, long)]
        group: Option<String>,
        /// none, one or all
        #[arg(short, long = "loop", value_parser = parse_loop_mode)]
        loop_mode: Option<LoopMode>,
    },
}

fn parse_loop_mode(value: &str) -> Result<LoopMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "none" | "off" => Ok(LoopMode::None),
        "one" | "track" => Ok(LoopMode::One),
        "all" | "playlist" => Ok(LoopMode::All),
        other => Err(format!("unknown loop mode '{other}' (expected none, one or all)")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CadenceConfig::load(cli.config.as_deref())?;
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Scan { dir, order, json } => {
            let mut tracks = scan(&config, dir.as_deref()).await?;
            sort_tracks(&mut tracks, order);
            if json {
                println!("{}", serde_json::to_string_pretty(&tracks)?);
            } else {
                for track in &tracks {
                    println!("{:>5}  {}", track.id.get(), shell::track_line(track));
                }
                println!("{} tracks", tracks.len());
            }
        }
        Commands::Groups {
            dir,
            mode,
            artwork,
            json,
        } => {
            let catalog = Arc::new(directory_catalog(&config, config.roots(dir.as_deref())));
            let tracks = catalog
                .enumerate()
                .await
                .context("failed to scan the library")?;
            let data = grouping::summarize(mode, &tracks);
            if json {
                println!("{}", serde_json::to_string_pretty(&data.groups)?);
            } else if data.groups.is_empty() {
                println!("no {mode} groups");
            } else {
                let cache = ArtworkCache::new(catalog, config.library.artwork_cache_size);
                for group in &data.groups {
                    let art = if artwork {
                        match cache.load_for_group(group).await {
                            Some(art) => format!("  [{} {} bytes]", art.mime_type, art.len()),
                            None => "  [no artwork]".to_string(),
                        }
                    } else {
                        String::new()
                    };
                    println!(
                        "{:<24}  {} ({} tracks){art}",
                        group.key, group.name, group.track_count
                    );
                }
            }
        }
        Commands::Play {
            dir,
            mode,
            group,
            loop_mode,
        } => {
            if let Some(loop_mode) = loop_mode {
                config.playback.loop_mode = loop_mode;
            }
            let roots = config.roots(dir.as_deref());
            let player = Player::open(&config, roots, mode, group.as_deref())
                .await
                .context("failed to open the player")?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&player, stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}

async fn scan(config: &CadenceConfig, dir: Option<&Path>) -> anyhow::Result<Vec<Track>> {
    let catalog = directory_catalog(config, config.roots(dir));
    tracing::info!(roots = ?catalog.roots(), "Scanning");
    catalog
        .enumerate()
        .await
        .context("failed to scan the library")
}
