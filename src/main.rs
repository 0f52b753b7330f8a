//! A local music library cache-and-synchronization engine: watches a
//! source tree of tagged audio files, maintains a SQLite cache of
//! releases and tracks, and derives human-readable virtual names for
//! them without ever renaming files beyond an opaque `{id=...}` suffix.
//!
//! Carries over `rose`'s FUSE mount, playlists and collages as explicit
//! non-goals (see `SPEC_FULL.md`); this binary only builds and maintains
//! the cache underneath them.

#![allow(dead_code)]

mod artiststr;
mod cache;
mod config;
mod errors;
mod identifier;
mod models;
mod sync;
mod tagger;
mod virtualname;
mod watcher;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

/// rosecache - a local music library cache and synchronizer
#[derive(Parser, Debug)]
#[command(name = "rosecache")]
#[command(author = "rosecache contributors")]
#[command(version)]
#[command(about = "Watches a tagged music library and keeps a queryable cache of it in sync")]
struct Args {
    /// Override the config file path (default: $XDG_CONFIG_HOME/rose/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synchronize a single release directory into the cache
    Sync {
        /// Path to the release directory, relative to or inside music_source_dir
        release_dir: PathBuf,
    },
    /// Sweep the entire music source directory, syncing every release and
    /// pruning cached releases that no longer exist on disk
    Sweep,
    /// Watch the music source directory and sync releases as they change
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter =
        tracing_subscriber::EnvFilter::new(format!("{log_level},sqlx=warn,lofty=error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg = config::Config::read(args.config.as_deref()).context("loading config")?;
    let engine = cache::CacheEngine::setup(&cfg)
        .await
        .context("setting up cache database")?;

    match args.command {
        Command::Sync { release_dir } => {
            let dir = resolve_release_dir(&cfg, &release_dir);
            let synced = sync::sync_release(&engine, &dir).await?;
            info!(release = %synced.display(), "sync complete");
        }
        Command::Sweep => {
            sync::sweep_all(&engine, &cfg.music_source_dir).await?;
            info!("sweep complete");
        }
        Command::Watch => {
            watcher::watch(&engine, &cfg.music_source_dir).await?;
        }
    }

    Ok(())
}

fn resolve_release_dir(cfg: &config::Config, release_dir: &std::path::Path) -> PathBuf {
    if release_dir.is_absolute() {
        release_dir.to_path_buf()
    } else {
        cfg.music_source_dir.join(release_dir)
    }
}
