//! MP3/ID3v2 tag reading
//!
//! Uses the `id3` crate for exact frame access — in particular the paired
//! `TIPL`/`IPLS` "involved people list" frames, which pair a role string
//! (`"producer"`, `"DJ-mix"`, ...) with a name, and which `lofty`'s
//! generic tag abstraction does not expose at that level of precision.
//! Audio duration still comes from `lofty`, which `id3` does not read.

use std::path::Path;

use id3::TagLike;
use lofty::{AudioFile as _, Probe};

use super::{parse_artists, parse_num, parse_year, AudioFile};
use crate::artiststr::split_tag;
use crate::errors::Error;

pub(super) fn read(path: &Path) -> Result<AudioFile, Error> {
    let tag = id3::Tag::read_from_path(path).map_err(|_| Error::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let duration_seconds = Probe::open(path)
        .and_then(|p| p.read())
        .map(|f| f.properties().duration().as_secs_f64().round() as i64)
        .unwrap_or(0);

    let title = tag.title().map(|s| s.to_string());
    let album = tag.album().map(|s| s.to_string());
    let main_artist = tag.artist().map(|s| s.to_string());
    let album_artist = tag.album_artist().map(|s| s.to_string());
    let genre_raw = tag.genre().map(|s| s.to_string());
    let track_number = parse_num(text_frame(&tag, path, "TRCK")?.as_deref());
    let disc_number = parse_num(text_frame(&tag, path, "TPOS")?.as_deref());
    let label = text_frame(&tag, path, "TPUB")?;

    let year_raw = tag
        .date_recorded()
        .map(|t| t.year.to_string())
        .or(text_frame(&tag, path, "TYER")?);

    let release_type = tag
        .extended_texts()
        .find(|t| t.description.eq_ignore_ascii_case("RELEASETYPE"))
        .map(|t| t.value.clone());

    let composer = text_frame(&tag, path, "TCOM")?;
    let conductor = text_frame(&tag, path, "TPE3")?;
    let remixer = text_frame(&tag, path, "TPE4")?;
    let producer = paired_people(&tag, "producer");
    let dj = paired_people(&tag, "DJ-mix");

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

/// Read a text frame's value by id. Returns `Ok(None)` when the frame is
/// absent, and surfaces `UnsupportedTagValueType` when the frame is present
/// but holds a non-text content type (e.g. a `TRCK` frame that somehow
/// carries a picture or binary blob) — the same shape the original raises
/// `UnsupportedTagValueTypeError` for in `_get_tag`.
fn text_frame(tag: &id3::Tag, path: &Path, id: &str) -> Result<Option<String>, Error> {
    let Some(frame) = tag.get(id) else {
        return Ok(None);
    };
    match frame.content().text() {
        Some(s) => Ok(Some(s.to_string())),
        None => Err(Error::UnsupportedTagValueType {
            path: path.to_path_buf(),
            detail: format!("{id} frame does not contain text content"),
        }),
    }
}

/// Pull every name paired with `role` out of the `TIPL`/`IPLS` involved
/// people list, joining matches the way `_split_tag`-compatible callers
/// expect (`r" \\ "`-delimited, the same separator `split_tag` splits on).
fn paired_people(tag: &id3::Tag, role: &str) -> Option<String> {
    for id in ["TIPL", "IPLS"] {
        let Some(frame) = tag.get(id) else { continue };
        let Some(raw) = frame.content().text() else { continue };
        if let Some(joined) = extract_paired_role(raw, role) {
            return Some(joined);
        }
    }
    None
}

/// Pure parsing core of [`paired_people`]: given the raw decoded text of a
/// `TIPL`/`IPLS` frame (role/name pairs, null-separated per ID3v2.4 or
/// `/`-separated per the older ID3v2.3 `IPLS` convention), return every
/// name paired with `role`, matched case-insensitively, joined with the
/// shared multi-value delimiter so the result round-trips through
/// [`crate::artiststr::split_tag`].
fn extract_paired_role(raw: &str, role: &str) -> Option<String> {
    let parts: Vec<&str> = if raw.contains('\0') {
        raw.split('\0').collect()
    } else {
        raw.split('/').collect()
    };

    let matches: Vec<&str> = parts
        .chunks(2)
        .filter(|pair| pair.len() == 2 && pair[0].eq_ignore_ascii_case(role))
        .map(|pair| pair[1])
        .collect();

    if matches.is_empty() {
        None
    } else {
        Some(matches.join(r" \\ "))
    }
}
