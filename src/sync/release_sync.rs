//! Per-release synchronization pass — the primary contract of §4.5.
//!
//! Ported from `original_source/rose/cache/update.py`'s
//! `update_cache_for_release`: reads every supported audio file in a
//! release directory inside one transaction, assigns identifiers to any
//! release or track that lacks one (renaming in place), derives virtual
//! names, and upserts the release/track/join-table rows. A single file's
//! tags failing to parse is logged and skipped; it does not abort the
//! release.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::artiststr::format_artist_string;
use crate::cache::CacheEngine;
use crate::errors::Error;
use crate::identifier::{generate_id, parse_id_from_path, rename_with_id};
use crate::models::ReleaseType;
use crate::tagger::{AudioFile, SUPPORTED_EXTENSIONS};
use crate::virtualname::{build_release_dirname, build_track_filename, sanitized_form, ReleaseNameInput, TrackNameInput};

/// Synchronize a single release directory, returning its (possibly
/// renamed) path.
pub async fn sync_release(engine: &CacheEngine, release_dir: &Path) -> Result<PathBuf, Error> {
    info!(release = %release_dir.display(), "syncing release");

    let mut release_dir = release_dir.to_path_buf();
    let release_id = match parse_id_from_path(&release_dir) {
        Some(id) => id,
        None => {
            let id = generate_id();
            debug!(id, release = %release_dir.display(), "assigning id to release");
            release_dir = rename_with_id(&release_dir, &id)?;
            id
        }
    };

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&release_dir)
        .map_err(|source| Error::Io {
            path: release_dir.clone(),
            source,
        })?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| SUPPORTED_EXTENSIONS.contains(&format!(".{}", e.to_lowercase()).as_str()))
                .unwrap_or(false)
        })
        .collect();
    entries.sort();

    let mut tx = engine.pool().begin().await?;
    let mut release_upserted = false;

    for file in entries {
        let tags = match AudioFile::from_path(&file) {
            Ok(tags) => tags,
            Err(err) => {
                warn!(file = %file.display(), error = %err, "skipping file, tags unreadable");
                continue;
            }
        };

        if !release_upserted {
            upsert_release(&mut tx, &release_id, &release_dir, &tags).await?;
            release_upserted = true;
        }

        let track_id = match parse_id_from_path(&file) {
            Some(id) => id,
            None => {
                let id = generate_id();
                debug!(id, file = %file.display(), "assigning id to track");
                let renamed = rename_with_id(&file, &id)?;
                upsert_track(&mut tx, &id, &renamed, &release_id, &tags).await?;
                continue;
            }
        };
        upsert_track(&mut tx, &track_id, &file, &release_id, &tags).await?;
    }

    tx.commit().await?;
    Ok(release_dir)
}

async fn upsert_release(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    release_id: &str,
    release_dir: &Path,
    tags: &AudioFile,
) -> Result<(), Error> {
    let release_type = match &tags.release_type {
        Some(raw) => ReleaseType::from_tag_value(Some(raw)),
        None => ReleaseType::Unknown,
    };

    let album_artists_formatted = format_artist_string(&tags.album_artists, &tags.genre);
    let virtual_dirname = build_release_dirname(ReleaseNameInput {
        album_artists_formatted: &album_artists_formatted,
        year: tags.year,
        album: tags.album.as_deref(),
        release_type,
        genres: &tags.genre,
        labels: &tags.label,
    });

    let title = tags.album.clone().unwrap_or_else(|| "Unknown Release".to_string());

    sqlx::query(
        r#"
        INSERT INTO releases (id, source_path, virtual_dirname, title, release_type, release_year, new)
        VALUES (?, ?, ?, ?, ?, ?, 1)
        ON CONFLICT (id) DO UPDATE SET
            source_path = excluded.source_path,
            virtual_dirname = excluded.virtual_dirname,
            title = excluded.title,
            release_type = excluded.release_type,
            release_year = excluded.release_year
        "#,
    )
    .bind(release_id)
    .bind(release_dir.to_string_lossy().to_string())
    .bind(&virtual_dirname)
    .bind(&title)
    .bind(release_type.as_db_str())
    .bind(tags.year)
    .execute(&mut **tx)
    .await?;

    for genre in &tags.genre {
        sqlx::query(
            r#"
            INSERT INTO releases_genres (release_id, genre, genre_sanitized) VALUES (?, ?, ?)
            ON CONFLICT (release_id, genre) DO NOTHING
            "#,
        )
        .bind(release_id)
        .bind(genre)
        .bind(sanitized_form(genre))
        .execute(&mut **tx)
        .await?;
    }

    for label in &tags.label {
        sqlx::query(
            r#"
            INSERT INTO releases_labels (release_id, label, label_sanitized) VALUES (?, ?, ?)
            ON CONFLICT (release_id, label) DO NOTHING
            "#,
        )
        .bind(release_id)
        .bind(label)
        .bind(sanitized_form(label))
        .execute(&mut **tx)
        .await?;
    }

    for relation in tags.album_artists.to_relations() {
        sqlx::query(
            r#"
            INSERT INTO releases_artists (release_id, artist, artist_sanitized, role)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (release_id, artist) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(release_id)
        .bind(&relation.name)
        .bind(sanitized_form(&relation.name))
        .bind(relation.role.as_db_str())
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn upsert_track(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    track_id: &str,
    file: &Path,
    release_id: &str,
    tags: &AudioFile,
) -> Result<(), Error> {
    let differs = tags.artists != tags.album_artists;
    let track_artists_formatted = differs.then(|| format_artist_string(&tags.artists, &tags.genre));

    let virtual_filename = build_track_filename(TrackNameInput {
        disc_number: tags.disc_number.as_deref(),
        track_number: tags.track_number.as_deref(),
        title: tags.title.as_deref(),
        duration_seconds: tags.duration_seconds,
        track_artists_formatted: track_artists_formatted.as_deref(),
    });

    let title = tags.title.clone().unwrap_or_else(|| "Unknown Title".to_string());
    let track_number = tags.track_number.clone().unwrap_or_else(|| "1".to_string());
    let disc_number = tags.disc_number.clone().unwrap_or_else(|| "1".to_string());

    sqlx::query(
        r#"
        INSERT INTO tracks
            (id, source_path, virtual_filename, title, release_id, track_number, disc_number, duration_seconds)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            source_path = excluded.source_path,
            virtual_filename = excluded.virtual_filename,
            title = excluded.title,
            release_id = excluded.release_id,
            track_number = excluded.track_number,
            disc_number = excluded.disc_number,
            duration_seconds = excluded.duration_seconds
        "#,
    )
    .bind(track_id)
    .bind(file.to_string_lossy().to_string())
    .bind(&virtual_filename)
    .bind(&title)
    .bind(release_id)
    .bind(&track_number)
    .bind(&disc_number)
    .bind(tags.duration_seconds)
    .execute(&mut **tx)
    .await?;

    for relation in tags.artists.to_relations() {
        sqlx::query(
            r#"
            INSERT INTO tracks_artists (track_id, artist, artist_sanitized, role)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (track_id, artist) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(track_id)
        .bind(&relation.name)
        .bind(sanitized_form(&relation.name))
        .bind(relation.role.as_db_str())
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::testutil::write_minimal_flac;
    use sqlx::Row;
    use tempfile::TempDir;

    #[tokio::test]
    async fn new_release_gets_id_and_renamed_directory() {
        let source = TempDir::new().unwrap();
        let release_dir = source.path().join("Boards of Canada - Geogaddi");
        std::fs::create_dir(&release_dir).unwrap();
        // No audio files: the release directory is still assigned an id,
        // even though no release row is upserted (no readable tracks).
        let engine = crate::cache::CacheEngine::setup(&test_config(source.path())).await.unwrap();

        let renamed = sync_release(&engine, &release_dir).await.unwrap();
        assert!(renamed.file_name().unwrap().to_string_lossy().contains("{id="));
        assert!(!release_dir.exists());
    }

    /// Seed scenario 1: a new release with two untagged-id FLACs gets both
    /// the directory and each file assigned an `{id=...}` suffix, and the
    /// release/genre/label/artist rows land as the first file's tags
    /// dictate.
    #[tokio::test]
    async fn new_release_populates_cache_from_first_track() {
        let source = TempDir::new().unwrap();
        let release_dir = source.path().join("Test Release 1");
        std::fs::create_dir(&release_dir).unwrap();

        for (name, title) in [("01 track.flac", "Track One"), ("02 track.flac", "Track Two")] {
            write_minimal_flac(
                &release_dir.join(name),
                &[
                    ("TITLE", title),
                    ("ALBUM", "A Cool Album"),
                    ("ARTIST", "Artist A;Artist B"),
                    ("ALBUMARTIST", "Artist A;Artist B"),
                    ("DATE", "1990"),
                    ("GENRE", "Electronic;House"),
                    ("LABEL", "A Cool Label"),
                    ("RELEASETYPE", "Album"),
                ],
                44100 * 200,
            );
        }

        let engine = crate::cache::CacheEngine::setup(&test_config(source.path())).await.unwrap();
        let renamed = sync_release(&engine, &release_dir).await.unwrap();
        assert!(renamed.file_name().unwrap().to_string_lossy().contains("{id="));

        let rows = sqlx::query("SELECT title, release_year, release_type, new FROM releases")
            .fetch_all(engine.pool())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        let title: String = row.get("title");
        let year: i64 = row.get("release_year");
        let release_type: String = row.get("release_type");
        let new: i64 = row.get("new");
        assert_eq!(title, "A Cool Album");
        assert_eq!(year, 1990);
        assert_eq!(release_type, "album");
        assert_eq!(new, 1);

        let genres: Vec<String> =
            sqlx::query_scalar("SELECT genre FROM releases_genres ORDER BY genre")
                .fetch_all(engine.pool())
                .await
                .unwrap();
        assert_eq!(genres, vec!["Electronic", "House"]);

        let tracks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(engine.pool())
            .await
            .unwrap();
        assert_eq!(tracks, 2);

        for entry in std::fs::read_dir(&renamed).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(name.contains("{id="), "track {name} missing id suffix");
        }
    }

    /// Seed scenario 2: a release directory that already carries an
    /// `{id=...}` suffix keeps that exact id as its `releases.id` row key.
    #[tokio::test]
    async fn preserves_existing_release_id() {
        let source = TempDir::new().unwrap();
        let release_dir = source.path().join("Test Release 2 {id=ilovecarly}");
        std::fs::create_dir(&release_dir).unwrap();
        write_minimal_flac(
            &release_dir.join("01 track.flac"),
            &[("TITLE", "Only Track"), ("ALBUM", "Solo Album")],
            44100 * 120,
        );

        let engine = crate::cache::CacheEngine::setup(&test_config(source.path())).await.unwrap();
        sync_release(&engine, &release_dir).await.unwrap();

        let id: String = sqlx::query_scalar("SELECT id FROM releases")
            .fetch_one(engine.pool())
            .await
            .unwrap();
        assert_eq!(id, "ilovecarly");
    }

    /// Seed scenario 4: renaming a release directory while keeping its
    /// `{id=...}` suffix intact updates `source_path` on the next sync but
    /// leaves the id unchanged.
    #[tokio::test]
    async fn rename_updates_source_path_but_not_id() {
        let source = TempDir::new().unwrap();
        let original = source.path().join("X {id=A}");
        std::fs::create_dir(&original).unwrap();
        write_minimal_flac(
            &original.join("01 track.flac"),
            &[("TITLE", "Only Track"), ("ALBUM", "An Album")],
            44100 * 120,
        );

        let engine = crate::cache::CacheEngine::setup(&test_config(source.path())).await.unwrap();
        sync_release(&engine, &original).await.unwrap();

        let renamed = source.path().join("Y {id=A}");
        std::fs::rename(&original, &renamed).unwrap();
        sync_release(&engine, &renamed).await.unwrap();

        let (id, source_path): (String, String) =
            sqlx::query_as("SELECT id, source_path FROM releases")
                .fetch_one(engine.pool())
                .await
                .unwrap();
        assert_eq!(id, "A");
        assert_eq!(source_path, renamed.to_string_lossy().to_string());
    }

    pub(crate) fn test_config(source_dir: &Path) -> crate::config::Config {
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
