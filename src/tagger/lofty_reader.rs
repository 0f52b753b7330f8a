//! MP4, FLAC, Ogg Vorbis, and Ogg Opus tag reading via `lofty`
//!
//! Lofty normalizes the common fields (title/album/artist/album
//! artist/genre/track/disc/year) across these containers, but the fields
//! this crate additionally needs (remixer, producer, composer, conductor,
//! label, release type) are container-specific custom atoms/comments, so
//! they're looked up by their raw per-container key, mirroring
//! `original_source/rose/tagger/__init__.py`'s own per-container key lists.

use std::path::Path;

use lofty::{Accessor, AudioFile as _, FileType, ItemKey, Probe, TaggedFileExt};

use super::{parse_artists, parse_num, parse_year, AudioFile};
use crate::artiststr::split_tag;
use crate::errors::Error;

pub(super) fn read(path: &Path) -> Result<AudioFile, Error> {
    let tagged_file = Probe::open(path)
        .and_then(|p| p.read())
        .map_err(|_| Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    let file_type = tagged_file.file_type();
    let duration_seconds = tagged_file.properties().duration().as_secs_f64().round() as i64;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    // Vorbis-comment releases conventionally store label under any of
    // these three keys; first non-empty wins, same as the original's
    // `_get_tag(..., ["organization", "label", "recordlabel"])`. MP4 only
    // ever uses the one custom atom.
    let label_keys: Vec<&str> = match file_type {
        FileType::Mp4 => vec!["----:com.apple.iTunes:LABEL"],
        _ => vec!["ORGANIZATION", "LABEL", "RECORDLABEL"],
    };

    let (release_type_key, remixer_key, producer_key, composer_key, conductor_key, dj_key) =
        match file_type {
            FileType::Mp4 => (
                "----:com.apple.iTunes:RELEASETYPE",
                "----:com.apple.iTunes:REMIXER",
                "----:com.apple.iTunes:PRODUCER",
                None, // composer uses lofty's built-in accessor on MP4 (\xa9wrt)
                "----:com.apple.iTunes:CONDUCTOR",
                "----:com.apple.iTunes:DJMIXER",
            ),
            _ => (
                "RELEASETYPE",
                "REMIXER",
                "PRODUCER",
                Some("COMPOSER"),
                "CONDUCTOR",
                "DJMIXER",
            ),
        };

    let get_unknown = |key: &str| -> Option<String> {
        tag.and_then(|t| t.get_string(&ItemKey::Unknown(key.to_string())))
            .map(|s| s.to_string())
    };

    let title = tag.and_then(|t| t.title()).map(|s| s.to_string());
    let album = tag.and_then(|t| t.album()).map(|s| s.to_string());
    let main_artist = tag.and_then(|t| t.artist()).map(|s| s.to_string());
    let album_artist = tag
        .and_then(|t| t.get_string(&ItemKey::AlbumArtist))
        .map(|s| s.to_string());
    let genre_raw = tag.and_then(|t| t.genre()).map(|s| s.to_string());
    let track_number = parse_num(
        tag.and_then(|t| t.get_string(&ItemKey::TrackNumber)),
    );
    let disc_number = parse_num(
        tag.and_then(|t| t.get_string(&ItemKey::DiscNumber)),
    );

    let year_raw = tag
        .and_then(|t| t.get_string(&ItemKey::RecordingDate))
        .map(|s| s.to_string())
        .or_else(|| tag.and_then(|t| t.year()).map(|y| y.to_string()));

    let composer = match composer_key {
        Some(key) => get_unknown(key),
        None => tag.and_then(|t| t.get_string(&ItemKey::Composer)).map(|s| s.to_string()),
    };
    let remixer = get_unknown(remixer_key);
    let producer = get_unknown(producer_key);
    let conductor = get_unknown(conductor_key);
    let dj = get_unknown(dj_key);
    let label = label_keys.iter().find_map(|key| get_unknown(key));
    let release_type = get_unknown(release_type_key);

    let (album_artists, artists) = parse_artists(
        main_artist.as_deref(),
        album_artist.as_deref(),
        remixer.as_deref(),
        composer.as_deref(),
        conductor.as_deref(),
        producer.as_deref(),
        dj.as_deref(),
    );

    Ok(AudioFile {
        title,
        year: parse_year(year_raw.as_deref()),
        track_number,
        disc_number,
        album,
        genre: split_tag(genre_raw.as_deref()),
        label: split_tag(label.as_deref()),
        release_type,
        album_artists,
        artists,
        duration_seconds,
    })
}
