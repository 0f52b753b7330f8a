//! `{id=UUID}` parsing, generation, and atomic embedding via rename

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::errors::Error;

/// Matches a trailing `{id=...}` suffix on a directory name or file stem.
static ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{id=([^}]+)\}$").unwrap());

/// Generate a new time-ordered identifier (UUIDv7).
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Parse the `{id=...}` suffix from a path's name (directories) or stem
/// (files). Returns `None` if there is no suffix, and also `None` — logging
/// a warning — if a suffix is present but empty, which spec treats as a
/// malformed identifier to be regenerated rather than a hard error.
///
/// Dispatches on `path.is_dir()`, so it only gives a meaningful answer for
/// paths that still exist on disk; for a path that has already been
/// removed (e.g. a deleted release directory observed by the watcher), use
/// [`parse_id_from_dir_name`] directly on the last-known directory name.
pub fn parse_id_from_path(path: &Path) -> Option<String> {
    let name = if path.is_dir() {
        path.file_name()?.to_str()?
    } else {
        path.file_stem()?.to_str()?
    };
    parse_id_from_name(name)
}

/// Parse the `{id=...}` suffix from a bare directory name, without
/// consulting the filesystem. Use this for paths that may no longer exist.
pub fn parse_id_from_dir_name(path: &Path) -> Option<String> {
    parse_id_from_name(path.file_name()?.to_str()?)
}

fn parse_id_from_name(name: &str) -> Option<String> {
    let captured = ID_REGEX.captures(name)?.get(1)?.as_str();
    if captured.is_empty() {
        tracing::warn!(name, "malformed {{id=}} suffix, treating as absent");
        return None;
    }
    Some(captured.to_string())
}

/// Rename `src` in place to embed `{id=<id>}`, returning the new path.
///
/// For directories the suffix is appended to the whole name; for files it
/// is inserted before the extension (appended to the file stem), matching
/// the original's `with_stem`/directory-name behavior.
pub fn rename_with_id(src: &Path, id: &str) -> Result<PathBuf, Error> {
    let dst = if src.is_dir() {
        let name = src
            .file_name()
            .expect("release directory must have a name")
            .to_string_lossy();
        src.with_file_name(format!("{name} {{id={id}}}"))
    } else {
        let stem = src
            .file_stem()
            .expect("track file must have a stem")
            .to_string_lossy();
        let ext = src.extension().map(|e| e.to_string_lossy().to_string());
        let new_name = match ext {
            Some(ext) => format!("{stem} {{id={id}}}.{ext}"),
            None => format!("{stem} {{id={id}}}"),
        };
        src.with_file_name(new_name)
    };

    std::fs::rename(src, &dst).map_err(|source| Error::Io {
        path: src.to_path_buf(),
        source,
    })?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_id_from_directory_name() {
        let dir = TempDir::new().unwrap();
        let release = dir.path().join("My Album {id=0190f7e2-1c1c-7000-8000-000000000000}");
        std::fs::create_dir(&release).unwrap();
        assert_eq!(
            parse_id_from_path(&release),
            Some("0190f7e2-1c1c-7000-8000-000000000000".to_string())
        );
    }

    #[test]
    fn parses_id_from_file_stem() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("01. Track {id=abc123}.mp3");
        std::fs::write(&file, b"").unwrap();
        assert_eq!(parse_id_from_path(&file), Some("abc123".to_string()));
    }

    #[test]
    fn no_suffix_returns_none() {
        let dir = TempDir::new().unwrap();
        let release = dir.path().join("My Album");
        std::fs::create_dir(&release).unwrap();
        assert_eq!(parse_id_from_path(&release), None);
    }

    #[test]
    fn empty_suffix_is_malformed_and_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let release = dir.path().join("My Album {id=}");
        std::fs::create_dir(&release).unwrap();
        assert_eq!(parse_id_from_path(&release), None);
    }

    #[test]
    fn rename_with_id_appends_suffix_to_directory() {
        let dir = TempDir::new().unwrap();
        let release = dir.path().join("My Album");
        std::fs::create_dir(&release).unwrap();
        let renamed = rename_with_id(&release, "xyz").unwrap();
        assert_eq!(renamed.file_name().unwrap(), "My Album {id=xyz}");
        assert!(renamed.exists());
    }

    #[test]
    fn rename_with_id_inserts_suffix_before_extension() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("01. Track.mp3");
        std::fs::write(&file, b"").unwrap();
        let renamed = rename_with_id(&file, "xyz").unwrap();
        assert_eq!(renamed.file_name().unwrap(), "01. Track {id=xyz}.mp3");
        assert!(renamed.exists());
    }
}
