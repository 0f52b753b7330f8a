//! Per-container tag reader
//!
//! Dispatches on file extension: MP3 goes through [`mp3`] for exact ID3v2
//! frame access (paired TIPL/IPLS people lists in particular); every other
//! supported container goes through [`lofty_reader`].

mod lofty_reader;
mod mp3;

use std::path::Path;

use crate::artiststr::{self, ArtistStringInput};
use crate::errors::Error;
use crate::models::Artists;

/// Extensions the synchronizer will hand to [`AudioFile::from_path`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".ogg", ".opus", ".flac"];

/// Neutral tag record produced by any of the per-container readers, before
/// the synchronizer turns it into cache rows.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub track_number: Option<String>,
    pub disc_number: Option<String>,
    pub album: Option<String>,
    pub genre: Vec<String>,
    pub label: Vec<String>,
    pub release_type: Option<String>,
    pub album_artists: Artists,
    pub artists: Artists,
    pub duration_seconds: i64,
}

impl AudioFile {
    /// Read tags from `path`, dispatching on its extension.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("mp3") => mp3::read(path),
            Some("m4a") | Some("ogg") | Some("opus") | Some("flac") => lofty_reader::read(path),
            _ => Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Parse a bare four-digit year, or the leading four digits of an
/// ISO-date-prefixed string; anything else yields `None`.
pub(crate) fn parse_year(value: Option<&str>) -> Option<i64> {
    let value = value?;
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        return value.parse().ok();
    }
    if value.len() >= 10 && value.as_bytes()[4] == b'-' && value.as_bytes()[7] == b'-' {
        let prefix = &value[..4];
        if prefix.chars().all(|c| c.is_ascii_digit()) {
            return prefix.parse().ok();
        }
    }
    None
}

/// Take the substring before the first `/` in a raw track/disc number tag
/// value (the `n/total` shorthand ID3 always uses, and that other
/// containers occasionally borrow), preserving zero-padding and
/// non-numeric schemes (e.g. vinyl-style `"A1"`) that an integer accessor
/// would destroy.
pub(crate) fn parse_num(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.split('/').next().unwrap_or(s).to_string())
}

/// Build the two [`Artists`] sets (album artists, track artists) a reader
/// needs to produce, sharing the parsing logic across containers.
pub(crate) fn parse_artists(
    main_artist: Option<&str>,
    album_artist: Option<&str>,
    remixer: Option<&str>,
    composer: Option<&str>,
    conductor: Option<&str>,
    producer: Option<&str>,
    dj: Option<&str>,
) -> (Artists, Artists) {
    let album_artists = artiststr::parse_artist_string(ArtistStringInput {
        main: album_artist,
        ..Default::default()
    });
    let artists = artiststr::parse_artist_string(ArtistStringInput {
        main: main_artist,
        remixer,
        composer,
        conductor,
        producer,
        dj,
    });
    (album_artists, artists)
}
