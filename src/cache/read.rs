//! Read API — parameterized query functions for the (out-of-scope) FUSE
//! layer and any other external collaborator.
//!
//! Translated close to 1:1 from `original_source/rose/cache/read.py`; the
//! `GROUP_CONCAT(..., ' \\ ')` aggregation is decoded back into
//! [`ArtistRelation`] lists in Rust.

use std::path::PathBuf;

use sqlx::Row;

use super::CacheEngine;
use crate::errors::Error;
use crate::models::{ArtistRelation, ArtistRole, Release, ReleaseType, Track};

const DELIM: &str = r" \\ ";

fn decode_artists(names: &str, roles: &str) -> Vec<ArtistRelation> {
    if names.is_empty() {
        return Vec::new();
    }
    names
        .split(DELIM)
        .zip(roles.split(DELIM))
        .filter_map(|(name, role)| {
            ArtistRole::from_db_str(role).map(|role| ArtistRelation {
                name: name.to_string(),
                role,
            })
        })
        .collect()
}

fn decode_list(s: &str) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(DELIM).map(|s| s.to_string()).collect()
    }
}

/// Optional equality filters for [`list_releases`], each a sanitized-form
/// value (see [`crate::virtualname::sanitized_form`]).
#[derive(Default)]
pub struct ReleaseFilter<'a> {
    pub sanitized_artist: Option<&'a str>,
    pub sanitized_genre: Option<&'a str>,
    pub sanitized_label: Option<&'a str>,
}

pub async fn list_releases(
    engine: &CacheEngine,
    filter: ReleaseFilter<'_>,
) -> Result<Vec<Release>, Error> {
    let mut query = String::from(
        r#"
        WITH genres AS (
            SELECT release_id, GROUP_CONCAT(genre, ' \\ ') AS genres
            FROM releases_genres GROUP BY release_id
        ), labels AS (
            SELECT release_id, GROUP_CONCAT(label, ' \\ ') AS labels
            FROM releases_labels GROUP BY release_id
        ), artists AS (
            SELECT release_id,
                   GROUP_CONCAT(artist, ' \\ ') AS names,
                   GROUP_CONCAT(role, ' \\ ') AS roles
            FROM releases_artists GROUP BY release_id
        )
        SELECT
            r.id, r.source_path, r.virtual_dirname, r.title, r.release_type,
            r.release_year, r.new,
            COALESCE(g.genres, '') AS genres,
            COALESCE(l.labels, '') AS labels,
            COALESCE(a.names, '') AS artist_names,
            COALESCE(a.roles, '') AS artist_roles
        FROM releases r
        LEFT JOIN genres g ON g.release_id = r.id
        LEFT JOIN labels l ON l.release_id = r.id
        LEFT JOIN artists a ON a.release_id = r.id
        WHERE 1=1
        "#,
    );

    if filter.sanitized_artist.is_some() {
        query.push_str(
            " AND EXISTS (SELECT 1 FROM releases_artists WHERE release_id = r.id AND artist_sanitized = ?)",
        );
    }
    if filter.sanitized_genre.is_some() {
        query.push_str(
            " AND EXISTS (SELECT 1 FROM releases_genres WHERE release_id = r.id AND genre_sanitized = ?)",
        );
    }
    if filter.sanitized_label.is_some() {
        query.push_str(
            " AND EXISTS (SELECT 1 FROM releases_labels WHERE release_id = r.id AND label_sanitized = ?)",
        );
    }

    let mut q = sqlx::query(&query);
    if let Some(v) = filter.sanitized_artist {
        q = q.bind(v);
    }
    if let Some(v) = filter.sanitized_genre {
        q = q.bind(v);
    }
    if let Some(v) = filter.sanitized_label {
        q = q.bind(v);
    }

    let rows = q.fetch_all(engine.pool()).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let release_type: String = row.get("release_type");
            Release {
                id: row.get("id"),
                source_path: PathBuf::from(row.get::<String, _>("source_path")),
                virtual_dirname: row.get("virtual_dirname"),
                title: row.get("title"),
                release_type: ReleaseType::from_tag_value(Some(&release_type)),
                release_year: row.get("release_year"),
                new: row.get::<i64, _>("new") != 0,
                genres: decode_list(&row.get::<String, _>("genres")),
                labels: decode_list(&row.get::<String, _>("labels")),
                artists: decode_artists(
                    &row.get::<String, _>("artist_names"),
                    &row.get::<String, _>("artist_roles"),
                ),
            }
        })
        .collect())
}

pub async fn list_tracks(
    engine: &CacheEngine,
    release_virtual_dirname: &str,
) -> Result<Vec<Track>, Error> {
    let rows = sqlx::query(
        r#"
        WITH artists AS (
            SELECT track_id,
                   GROUP_CONCAT(artist, ' \\ ') AS names,
                   GROUP_CONCAT(role, ' \\ ') AS roles
            FROM tracks_artists GROUP BY track_id
        )
        SELECT
            t.id, t.source_path, t.virtual_filename, t.title, t.release_id,
            t.track_number, t.disc_number, t.duration_seconds,
            COALESCE(a.names, '') AS artist_names,
            COALESCE(a.roles, '') AS artist_roles
        FROM tracks t
        JOIN releases r ON r.id = t.release_id
        LEFT JOIN artists a ON a.track_id = t.id
        WHERE r.virtual_dirname = ?
        ORDER BY t.disc_number, t.track_number
        "#,
    )
    .bind(release_virtual_dirname)
    .fetch_all(engine.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Track {
            id: row.get("id"),
            source_path: PathBuf::from(row.get::<String, _>("source_path")),
            virtual_filename: row.get("virtual_filename"),
            title: row.get("title"),
            release_id: row.get("release_id"),
            track_number: row.get("track_number"),
            disc_number: row.get("disc_number"),
            duration_seconds: row.get("duration_seconds"),
            artists: decode_artists(
                &row.get::<String, _>("artist_names"),
                &row.get::<String, _>("artist_roles"),
            ),
        })
        .collect())
}

pub async fn list_artists(engine: &CacheEngine) -> Result<Vec<String>, Error> {
    Ok(sqlx::query_scalar("SELECT DISTINCT artist FROM releases_artists")
        .fetch_all(engine.pool())
        .await?)
}

pub async fn list_genres(engine: &CacheEngine) -> Result<Vec<String>, Error> {
    Ok(sqlx::query_scalar("SELECT DISTINCT genre FROM releases_genres")
        .fetch_all(engine.pool())
        .await?)
}

pub async fn list_labels(engine: &CacheEngine) -> Result<Vec<String>, Error> {
    Ok(sqlx::query_scalar("SELECT DISTINCT label FROM releases_labels")
        .fetch_all(engine.pool())
        .await?)
}

pub async fn release_exists(
    engine: &CacheEngine,
    virtual_dirname: &str,
) -> Result<Option<PathBuf>, Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT source_path FROM releases WHERE virtual_dirname = ?")
            .bind(virtual_dirname)
            .fetch_optional(engine.pool())
            .await?;
    Ok(row.map(|(p,)| PathBuf::from(p)))
}

pub async fn track_exists(
    engine: &CacheEngine,
    release_virtual_dirname: &str,
    track_virtual_filename: &str,
) -> Result<Option<PathBuf>, Error> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT t.source_path
        FROM tracks t
        JOIN releases r ON t.release_id = r.id
        WHERE r.virtual_dirname = ? AND t.virtual_filename = ?
        "#,
    )
    .bind(release_virtual_dirname)
    .bind(track_virtual_filename)
    .fetch_optional(engine.pool())
    .await?;
    Ok(row.map(|(p,)| PathBuf::from(p)))
}

pub async fn artist_exists(engine: &CacheEngine, artist_sanitized: &str) -> Result<bool, Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM releases_artists WHERE artist_sanitized = ?)",
    )
    .bind(artist_sanitized)
    .fetch_one(engine.pool())
    .await?;
    Ok(exists)
}

pub async fn genre_exists(engine: &CacheEngine, genre_sanitized: &str) -> Result<bool, Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM releases_genres WHERE genre_sanitized = ?)",
    )
    .bind(genre_sanitized)
    .fetch_one(engine.pool())
    .await?;
    Ok(exists)
}

pub async fn label_exists(engine: &CacheEngine, label_sanitized: &str) -> Result<bool, Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM releases_labels WHERE label_sanitized = ?)",
    )
    .bind(label_sanitized)
    .fetch_one(engine.pool())
    .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArtistRole;
    use crate::sync::sync_release;
    use crate::tagger::testutil::write_minimal_flac;
    use crate::virtualname::sanitized_form;
    use std::path::Path;
    use tempfile::TempDir;

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

    async fn seeded_engine(source: &TempDir) -> std::sync::Arc<CacheEngine> {
        let release_dir = source.path().join("Test Release 1");
        std::fs::create_dir(&release_dir).unwrap();
        for (name, title, track_number) in
            [("01 track.flac", "Track One", "1"), ("02 track.flac", "Track Two", "2")]
        {
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
                    ("TRACKNUMBER", track_number),
                    ("DISCNUMBER", "1"),
                ],
                44100 * 200,
            );
        }
        let engine = CacheEngine::setup(&test_config(source.path())).await.unwrap();
        sync_release(&engine, &release_dir).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn list_releases_decodes_genres_labels_and_artists() {
        let source = TempDir::new().unwrap();
        let engine = seeded_engine(&source).await;

        let releases = list_releases(&engine, ReleaseFilter::default()).await.unwrap();
        assert_eq!(releases.len(), 1);
        let release = &releases[0];
        assert_eq!(release.title, "A Cool Album");
        assert_eq!(release.release_year, Some(1990));
        assert!(release.new);

        let mut genres = release.genres.clone();
        genres.sort();
        assert_eq!(genres, vec!["Electronic".to_string(), "House".to_string()]);
        assert_eq!(release.labels, vec!["A Cool Label".to_string()]);

        let mut artist_names: Vec<&str> = release.artists.iter().map(|a| a.name.as_str()).collect();
        artist_names.sort();
        assert_eq!(artist_names, vec!["Artist A", "Artist B"]);
        assert!(release.artists.iter().all(|a| a.role == ArtistRole::Main));
    }

    #[tokio::test]
    async fn list_releases_filters_by_sanitized_genre() {
        let source = TempDir::new().unwrap();
        let engine = seeded_engine(&source).await;

        let matching = list_releases(
            &engine,
            ReleaseFilter {
                sanitized_genre: Some(&sanitized_form("House")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(matching.len(), 1);

        let empty = list_releases(
            &engine,
            ReleaseFilter {
                sanitized_genre: Some(&sanitized_form("Ambient")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn list_tracks_orders_by_disc_then_track_number() {
        let source = TempDir::new().unwrap();
        let engine = seeded_engine(&source).await;

        let releases = list_releases(&engine, ReleaseFilter::default()).await.unwrap();
        let tracks = list_tracks(&engine, &releases[0].virtual_dirname).await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_number, "1");
        assert_eq!(tracks[1].track_number, "2");
    }

    #[tokio::test]
    async fn existence_checks_resolve_source_paths() {
        let source = TempDir::new().unwrap();
        let engine = seeded_engine(&source).await;

        let releases = list_releases(&engine, ReleaseFilter::default()).await.unwrap();
        let release = &releases[0];

        let found = release_exists(&engine, &release.virtual_dirname).await.unwrap();
        assert_eq!(found, Some(release.source_path.clone()));

        let missing = release_exists(&engine, "does not exist").await.unwrap();
        assert_eq!(missing, None);

        let tracks = list_tracks(&engine, &release.virtual_dirname).await.unwrap();
        let track_found = track_exists(&engine, &release.virtual_dirname, &tracks[0].virtual_filename)
            .await
            .unwrap();
        assert_eq!(track_found, Some(tracks[0].source_path.clone()));

        assert!(artist_exists(&engine, &sanitized_form("Artist A")).await.unwrap());
        assert!(!artist_exists(&engine, &sanitized_form("Nobody")).await.unwrap());
        assert!(genre_exists(&engine, &sanitized_form("Electronic")).await.unwrap());
        assert!(label_exists(&engine, &sanitized_form("A Cool Label")).await.unwrap());
    }

    #[tokio::test]
    async fn list_artists_genres_labels_are_distinct() {
        let source = TempDir::new().unwrap();
        let engine = seeded_engine(&source).await;

        let artists = list_artists(&engine).await.unwrap();
        assert_eq!(artists.len(), 2);
        let genres = list_genres(&engine).await.unwrap();
        assert_eq!(genres.len(), 2);
        let labels = list_labels(&engine).await.unwrap();
        assert_eq!(labels, vec!["A Cool Label".to_string()]);
    }
}
