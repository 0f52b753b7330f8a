//! Bidirectional artist string parsing and formatting
//!
//! This is the newer, deduplicating variant of the algorithm (see
//! `DESIGN.md`'s Open Question decisions) — it is aware of `produced by`
//! and `remixed by` suffixes in addition to `feat.`/`pres.`/`performed by`,
//! and deduplicates each role bucket after splitting.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Artists;

/// Splits a single tag value on the delimiters the original recognizes as
/// joining multiple artist/genre/label names: `\\`, `/`, `;`, and `vs.`.
static TAG_SPLITTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" \\\\ | / |; ?| vs\. ").unwrap());

/// Raw fields a tag reader hands to [`parse_artist_string`], one per
/// container-specific tag frame/atom.
#[derive(Debug, Default, Clone)]
pub struct ArtistStringInput<'a> {
    pub main: Option<&'a str>,
    pub remixer: Option<&'a str>,
    pub composer: Option<&'a str>,
    pub conductor: Option<&'a str>,
    pub producer: Option<&'a str>,
    pub dj: Option<&'a str>,
}

/// Split a tag value on the shared delimiter set; `None` and empty strings
/// both yield an empty list.
pub fn split_tag(value: Option<&str>) -> Vec<String> {
    match value {
        Some(v) if !v.is_empty() => TAG_SPLITTER_REGEX
            .split(v)
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse a set of raw artist tag values into the six role buckets.
///
/// `main` is inspected for the embedded-role suffixes/prefixes the original
/// recognizes, in the fixed order: `produced by`, `remixed by`, `feat.`,
/// `pres.`, `performed by`. Each one peels its match off of `main` before
/// the next is checked, so a single value with all five happens to parse
/// correctly even though each split only fires once.
pub fn parse_artist_string(input: ArtistStringInput<'_>) -> Artists {
    let mut li_main = split_tag(input.conductor);
    let mut li_guests: Vec<String> = Vec::new();
    let mut li_remixer = split_tag(input.remixer);
    let mut li_composer = split_tag(input.composer);
    let mut li_producer = split_tag(input.producer);
    let mut li_dj = split_tag(input.dj);

    let mut main: Option<String> = input.main.map(|s| s.to_string());

    if let Some(m) = &main {
        if let Some((rest, producer)) = split_once_sep(m, "produced by") {
            main = Some(rest);
            li_producer.extend(split_tag(Some(&producer)));
        }
    }
    if let Some(m) = &main {
        if let Some((rest, remixer)) = split_once_sep(m, "remixed by") {
            main = Some(rest);
            li_remixer.extend(split_tag(Some(&remixer)));
        }
    }
    if let Some(m) = &main {
        if let Some((rest, guests)) = split_once_sep(m, "feat.") {
            main = Some(rest);
            li_guests.extend(split_tag(Some(&guests)));
        }
    }
    if let Some(m) = &main {
        if let Some((dj, rest)) = split_once_sep_dj_pres(m) {
            main = Some(rest);
            li_dj.extend(split_tag(Some(&dj)));
        }
    }
    if let Some(m) = &main {
        if let Some((composer, rest)) = split_once_sep_performed_by(m) {
            main = Some(rest);
            li_composer.extend(split_tag(Some(&composer)));
        }
    }
    if let Some(m) = &main {
        li_main.extend(split_tag(Some(m)));
    }

    Artists {
        main: deduplicate(li_main),
        guest: deduplicate(li_guests),
        remixer: deduplicate(li_remixer),
        producer: deduplicate(li_producer),
        composer: deduplicate(li_composer),
        djmixer: deduplicate(li_dj),
    }
}

/// Format an [`Artists`] set back into a single display string, given the
/// release's genres (classical releases format the composer as a
/// "X performed by Y" prefix rather than a plain bucket).
pub fn format_artist_string(artists: &Artists, genres: &[String]) -> String {
    let mut r = artists.main.join(";");
    if !artists.composer.is_empty() && genres.iter().any(|g| g == "Classical") {
        r = format!("{} performed by {}", artists.composer.join(";"), r);
    }
    if !artists.djmixer.is_empty() {
        r = format!("{} pres. {}", artists.djmixer.join(";"), r);
    }
    if !artists.guest.is_empty() {
        r.push_str(" feat. ");
        r.push_str(&artists.guest.join(";"));
    }
    if !artists.remixer.is_empty() {
        r.push_str(" remixed by ");
        r.push_str(&artists.remixer.join(";"));
    }
    if !artists.producer.is_empty() {
        r.push_str(" produced by ");
        r.push_str(&artists.producer.join(";"));
    }
    r
}

fn deduplicate(xs: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(xs.len());
    for x in xs {
        if seen.insert(x.clone()) {
            out.push(x);
        }
    }
    out
}

/// Splits `"<main> <sep> <rest>"` into `(main, rest)` on the first
/// occurrence of `sep`, tolerating an optional leading space before it
/// (mirroring the original's `" ?<sep> "` regex split, maxsplit=1).
fn split_once_sep(main: &str, sep: &str) -> Option<(String, String)> {
    let needle = format!(" {sep} ");
    if let Some(idx) = main.find(&needle) {
        let head = main[..idx].to_string();
        let tail = main[idx + needle.len()..].to_string();
        return Some((head, tail));
    }
    let needle_no_space = format!("{sep} ");
    if let Some(idx) = main.find(&needle_no_space) {
        let head = main[..idx].to_string();
        let tail = main[idx + needle_no_space.len()..].to_string();
        return Some((head, tail));
    }
    None
}

/// `"pres."` splits as `(dj, main)` — the DJ comes first in the string.
fn split_once_sep_dj_pres(main: &str) -> Option<(String, String)> {
    for needle in [" pres. ", "pres. "] {
        if let Some(idx) = main.find(needle) {
            let dj = main[..idx].to_string();
            let rest = main[idx + needle.len()..].to_string();
            return Some((dj, rest));
        }
    }
    None
}

/// `"performed by"` splits as `(composer, main)`.
fn split_once_sep_performed_by(main: &str) -> Option<(String, String)> {
    for needle in [" performed by ", "performed by "] {
        if let Some(idx) = main.find(needle) {
            let composer = main[..idx].to_string();
            let rest = main[idx + needle.len()..].to_string();
            return Some((composer, rest));
        }
    }
    None
}
