//! Versioned, reversible schema migrations
//!
//! Migrations are embedded as ordered constants rather than a directory of
//! files — the equivalent representation when migrations ship inside the
//! binary instead of being read at runtime — each with an `up` and a
//! `down` script, applied inside its own transaction, with the applied
//! version recorded in `schema_migrations`.

use tracing::info;

use super::CacheEngine;
use crate::errors::Error;

struct Migration {
    version: i64,
    description: &'static str,
    up: &'static str,
    #[allow(dead_code)] // kept for completeness/rollback tooling, not exercised by forward sync
    down: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema",
        up: r#"
            CREATE TABLE releases (
                id TEXT PRIMARY KEY,
                source_path TEXT NOT NULL UNIQUE,
                virtual_dirname TEXT NOT NULL,
                title TEXT NOT NULL,
                release_type TEXT NOT NULL,
                release_year INTEGER,
                new INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX idx_releases_virtual_dirname ON releases(virtual_dirname);

            CREATE TABLE tracks (
                id TEXT PRIMARY KEY,
                source_path TEXT NOT NULL UNIQUE,
                virtual_filename TEXT NOT NULL,
                title TEXT NOT NULL,
                release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
                track_number TEXT NOT NULL,
                disc_number TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL
            );
            CREATE INDEX idx_tracks_release_id ON tracks(release_id);
            CREATE INDEX idx_tracks_virtual_filename ON tracks(virtual_filename);

            CREATE TABLE releases_genres (
                release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
                genre TEXT NOT NULL,
                genre_sanitized TEXT NOT NULL,
                PRIMARY KEY (release_id, genre)
            );
            CREATE INDEX idx_releases_genres_sanitized ON releases_genres(genre_sanitized);

            CREATE TABLE releases_labels (
                release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
                label TEXT NOT NULL,
                label_sanitized TEXT NOT NULL,
                PRIMARY KEY (release_id, label)
            );
            CREATE INDEX idx_releases_labels_sanitized ON releases_labels(label_sanitized);

            CREATE TABLE releases_artists (
                release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
                artist TEXT NOT NULL,
                artist_sanitized TEXT NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (release_id, artist)
            );
            CREATE INDEX idx_releases_artists_sanitized ON releases_artists(artist_sanitized);

            CREATE TABLE tracks_artists (
                track_id TEXT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
                artist TEXT NOT NULL,
                artist_sanitized TEXT NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (track_id, artist)
            );
            CREATE INDEX idx_tracks_artists_sanitized ON tracks_artists(artist_sanitized);
        "#,
        down: r#"
            DROP TABLE tracks_artists;
            DROP TABLE releases_artists;
            DROP TABLE releases_labels;
            DROP TABLE releases_genres;
            DROP TABLE tracks;
            DROP TABLE releases;
        "#,
    },
];

pub(super) async fn run_migrations(engine: &CacheEngine) -> Result<(), Error> {
    let pool = engine.pool();

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_one(pool)
            .await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(version = migration.version, description = migration.description, "applying migration");
        let mut tx = pool.begin().await?;
        sqlx::query(migration.up).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}
