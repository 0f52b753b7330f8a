//! Full-library sweep pass — processes every release directory and
//! deletes cached releases that no longer exist on disk.
//!
//! Ported from `original_source/rose/cache/update.py`'s
//! `update_cache_for_all_releases`. Per-release tag pre-reads (used only to
//! detect which directories are worth a sync pass at all) are parallelized
//! across releases with `rayon`, the same pattern the teacher's
//! `src/core/indexer.rs` uses for its own parallel file scan; the actual
//! database transactions stay serialized, one release at a time, since
//! SQLite's single-writer model makes parallel writes pointless.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::cache::{read, CacheEngine};
use crate::errors::Error;

use super::release_sync::sync_release;

/// Re-sync every release directory under `music_source_dir` and prune
/// cached releases whose directory is gone. A single release failing does
/// not abort the sweep; it is logged and skipped.
pub async fn sweep_all(engine: &CacheEngine, music_source_dir: &std::path::Path) -> Result<(), Error> {
    let release_dirs: Vec<PathBuf> = std::fs::read_dir(music_source_dir)
        .map_err(|source| Error::Io {
            path: music_source_dir.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.path())
        .collect();

    info!(count = release_dirs.len(), "found releases to sweep");

    // CPU/IO-bound existence + extension pre-scan, parallelized across
    // releases; the actual per-release sync below stays sequential.
    let scanned: Vec<PathBuf> = release_dirs
        .par_iter()
        .filter(|dir| dir.read_dir().map(|mut rd| rd.next().is_some()).unwrap_or(false))
        .cloned()
        .collect();

    let mut final_dirs = Vec::with_capacity(scanned.len());
    for dir in scanned {
        match sync_release(engine, &dir).await {
            Ok(final_dir) => final_dirs.push(final_dir),
            Err(err) => {
                warn!(release = %dir.display(), error = %err, "skipping release during sweep");
            }
        }
    }

    prune_missing(engine, &final_dirs).await?;
    Ok(())
}

async fn prune_missing(engine: &CacheEngine, kept: &[PathBuf]) -> Result<(), Error> {
    info!("deleting cached releases that are not on disk");
    let kept_paths: Vec<String> = kept.iter().map(|p| p.to_string_lossy().to_string()).collect();

    if kept_paths.is_empty() {
        sqlx::query("DELETE FROM releases").execute(engine.pool()).await?;
        return Ok(());
    }

    let placeholders = std::iter::repeat("?").take(kept_paths.len()).collect::<Vec<_>>().join(",");
    let query = format!("DELETE FROM releases WHERE source_path NOT IN ({placeholders})");
    let mut q = sqlx::query(&query);
    for path in &kept_paths {
        q = q.bind(path);
    }
    q.execute(engine.pool()).await?;

    Ok(())
}

/// Re-export for callers that only need existence checks without a full
/// sweep (e.g. the watcher deciding whether a deleted path was ever
/// cached).
pub async fn release_still_cached(engine: &CacheEngine, virtual_dirname: &str) -> Result<bool, Error> {
    Ok(read::release_exists(engine, virtual_dirname).await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::testutil::write_minimal_flac;
    use std::path::Path;
    use tempfile::TempDir;

    /// Seed scenario 3: a pre-inserted release row pointing at a
    /// nonexistent path is pruned by a sweep over a source tree that
    /// contains two real releases; four track rows remain in total.
    #[tokio::test]
    async fn sweep_prunes_missing_release_and_keeps_real_ones() {
        let source = TempDir::new().unwrap();

        for (dirname, n_tracks) in [("Release One", 2), ("Release Two", 2)] {
            let release_dir = source.path().join(dirname);
            std::fs::create_dir(&release_dir).unwrap();
            for i in 0..n_tracks {
                write_minimal_flac(
                    &release_dir.join(format!("{i:02} track.flac")),
                    &[("TITLE", "Track"), ("ALBUM", dirname)],
                    44100 * 120,
                );
            }
        }

        let engine = crate::cache::CacheEngine::setup(&test_config(source.path())).await.unwrap();

        sqlx::query(
            "INSERT INTO releases (id, source_path, virtual_dirname, title, release_type, new) \
             VALUES ('stale', '/nonexistent', 'stale release', 'Stale', 'unknown', 1)",
        )
        .execute(engine.pool())
        .await
        .unwrap();

        sweep_all(&engine, source.path()).await.unwrap();

        let release_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM releases")
            .fetch_one(engine.pool())
            .await
            .unwrap();
        assert_eq!(release_count, 2);

        let track_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(engine.pool())
            .await
            .unwrap();
        assert_eq!(track_count, 4);
    }

    fn test_config(source_dir: &Path) -> crate::config::Config {
        let cache_dir = source_dir.join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        crate::config::Config {
            music_source_dir: source_dir.to_path_buf(),
            fuse_mount_dir: source_dir.join("mount"),
            cache_database_path: cache_dir.join("cache.sqlite3"),
            cache_dir,
        }
    }
}
