//! Filesystem watcher — debounces raw `notify` events and routes them into
//! the synchronizer.
//!
//! Uses `notify-debouncer-mini` (already a teacher dependency, previously
//! unused) to coalesce bursts of events into one batch per path within a
//! 200ms window, then maps each changed path to its containing release
//! directory before re-syncing it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;
use crate::errors::Error;
use crate::identifier::parse_id_from_dir_name;
use crate::sync::sync_release;

/// Debounce window, matching spec.md §4.6's stated ceiling.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Directories whose contents are never releases, even though they sit
/// directly under the source root. Neither collages nor playlists are
/// modeled by this crate (see `SPEC_FULL.md` §9); the ignore rule is kept
/// anyway since it is a correctness requirement of the watcher itself.
const IGNORED_TOP_LEVEL_DIRS: &[&str] = &["!collages", "!playlists"];

/// Start watching `music_source_dir`, re-syncing whichever release
/// directory each debounced event falls under. Runs until the process is
/// killed or the watch channel closes.
///
/// Stray files directly under the source root (e.g. a dotfile dropped by an
/// editor) must be ignored even when they're deleted, at which point
/// `event_path.is_dir()` can no longer tell a file from a release
/// directory — so a snapshot of known release directories is kept and
/// updated as events are processed, rather than trusting the live
/// filesystem state at event time.
pub async fn watch(engine: &CacheEngine, music_source_dir: &Path) -> Result<(), Error> {
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(DEBOUNCE_WINDOW, None, tx).map_err(|source| Error::Io {
        path: music_source_dir.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source),
    })?;

    debouncer
        .watcher()
        .watch(music_source_dir, RecursiveMode::Recursive)
        .map_err(|source| Error::Io {
            path: music_source_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, source),
        })?;

    info!(root = %music_source_dir.display(), "watching for changes");

    let mut known_dirs: HashSet<PathBuf> = std::fs::read_dir(music_source_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect()
        })
        .unwrap_or_default();

    loop {
        let events = match rx.recv() {
            Ok(Ok(events)) => events,
            Ok(Err(errors)) => {
                for err in errors {
                    warn!(error = %err, "watcher error");
                }
                continue;
            }
            Err(_) => break, // channel closed, watcher dropped
        };

        let mut release_dirs = HashSet::new();
        for event in events {
            if event.kind != DebouncedEventKind::Any {
                continue;
            }
            if let Some(release_dir) = containing_release_dir(music_source_dir, &event.path, &known_dirs) {
                release_dirs.insert(release_dir);
            }
        }

        for release_dir in release_dirs {
            if release_dir.is_dir() {
                known_dirs.insert(release_dir.clone());
                debug!(release = %release_dir.display(), "re-syncing release after fs event");
                if let Err(err) = sync_release(engine, &release_dir).await {
                    warn!(release = %release_dir.display(), error = %err, "sync failed after fs event");
                }
            } else {
                known_dirs.remove(&release_dir);
                debug!(release = %release_dir.display(), "release directory removed");
                if let Err(err) = delete_release(engine, &release_dir).await {
                    warn!(release = %release_dir.display(), error = %err, "failed to prune removed release");
                }
            }
        }
    }

    Ok(())
}

/// Map an event path to the release directory it falls under: the event's
/// first path component below `root`. Returns `None` for events directly
/// on `root` itself, inside an ignored auxiliary directory, or on a stray
/// file sitting directly under `root` (neither currently a directory nor
/// previously known as one).
fn containing_release_dir(root: &Path, event_path: &Path, known_dirs: &HashSet<PathBuf>) -> Option<PathBuf> {
    let relative = event_path.strip_prefix(root).ok()?;
    let first_component = relative.components().next()?;
    let name = first_component.as_os_str().to_str()?;

    if IGNORED_TOP_LEVEL_DIRS.contains(&name) {
        return None;
    }

    let top_level = root.join(first_component);
    if relative.components().count() < 2 && !top_level.is_dir() && !known_dirs.contains(&top_level) {
        // a file directly under the source root, not inside any release
        // directory and never one itself
        return None;
    }

    Some(top_level)
}

/// Delete the cached release matching `release_dir`'s current source_path,
/// falling back to a lookup by the `{id=...}` suffix still present in the
/// (now gone) directory's old name, per spec.md §4.6.
async fn delete_release(engine: &CacheEngine, release_dir: &Path) -> Result<(), Error> {
    let by_path = sqlx::query("DELETE FROM releases WHERE source_path = ?")
        .bind(release_dir.to_string_lossy().to_string())
        .execute(engine.pool())
        .await?;

    if by_path.rows_affected() == 0 {
        if let Some(id) = parse_id_from_dir_name(release_dir) {
            sqlx::query("DELETE FROM releases WHERE id = ?")
                .bind(id)
                .execute(engine.pool())
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_events_directly_on_root() {
        let root = Path::new("/music");
        assert_eq!(
            containing_release_dir(root, Path::new("/music"), &HashSet::new()),
            None
        );
    }

    #[test]
    fn ignores_auxiliary_directories() {
        let root = Path::new("/music");
        assert_eq!(
            containing_release_dir(root, Path::new("/music/!playlists/foo.toml"), &HashSet::new()),
            None
        );
    }

    #[test]
    fn maps_nested_file_to_release_dir() {
        let root = Path::new("/music");
        assert_eq!(
            containing_release_dir(root, Path::new("/music/My Album/01. Track.mp3"), &HashSet::new()),
            Some(PathBuf::from("/music/My Album"))
        );
    }

    /// A stray file created directly under the source root (e.g. an
    /// editor's `.nfo` dropping) is ignored, per the original watcher's own
    /// test scenario of touching/renaming/deleting `hi.nfo` at the root
    /// without disturbing cache state.
    #[test]
    fn ignores_stray_file_at_root() {
        let root = Path::new("/music");
        assert_eq!(
            containing_release_dir(root, Path::new("/music/hi.nfo"), &HashSet::new()),
            None
        );
    }

    /// Once a top-level entry is known to have been a directory, a later
    /// event on that same path (its deletion, once it no longer exists on
    /// disk) still maps to it rather than being dropped as a stray file.
    #[test]
    fn maps_deleted_release_dir_using_known_dirs() {
        let root = Path::new("/music");
        let mut known = HashSet::new();
        known.insert(PathBuf::from("/music/My Album {id=A}"));
        assert_eq!(
            containing_release_dir(root, Path::new("/music/My Album {id=A}"), &known),
            Some(PathBuf::from("/music/My Album {id=A}"))
        );
    }

    #[test]
    fn parses_fallback_id_from_deleted_dir_name() {
        assert_eq!(
            parse_id_from_dir_name(Path::new("/music/My Album {id=abc123}")),
            Some("abc123".to_string())
        );
    }
}
