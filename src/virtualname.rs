//! Deterministic virtual directory/file name construction and sanitization

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ReleaseType;

/// Filesystem-reserved characters replaced by visually similar Unicode
/// substitutes, matching spec.md §4.3 exactly (the full-width colon is used
/// deliberately in the track duration bracket, not merely as a side effect
/// of this table).
const RESERVED_SUBSTITUTIONS: &[(char, char)] = &[
    ('/', '／'),
    ('\\', '＼'),
    (':', '：'),
    ('*', '＊'),
    ('?', '？'),
    ('"', '＂'),
    ('<', '＜'),
    ('>', '＞'),
    ('|', '｜'),
];

/// Replace reserved characters, strip control bytes, and trim trailing
/// dots/spaces (all three are illegal or awkward as trailing characters on
/// the filesystems this crate targets).
pub fn sanitize_filename(name: &str) -> String {
    let substituted: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            RESERVED_SUBSTITUTIONS
                .iter()
                .find(|(reserved, _)| *reserved == c)
                .map(|(_, replacement)| *replacement)
                .unwrap_or(c)
        })
        .collect();
    substituted.trim_end_matches(['.', ' ']).to_string()
}

/// Fold a name into its case/punctuation-insensitive "sanitized form" used
/// for taxonomy equality (the `*_sanitized` columns on the join tables).
/// Distinct from [`sanitize_filename`]: this folds for *comparison*, that
/// one substitutes for *display*.
pub fn sanitized_form(name: &str) -> String {
    static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
    let ascii = deunicode::deunicode(name).to_lowercase();
    NON_ALNUM.replace_all(ascii.trim(), "").to_string()
}

/// Inputs needed to build a release's virtual directory name.
pub struct ReleaseNameInput<'a> {
    pub album_artists_formatted: &'a str,
    pub year: Option<i64>,
    pub album: Option<&'a str>,
    pub release_type: ReleaseType,
    pub genres: &'a [String],
    pub labels: &'a [String],
}

/// Build a release's virtual directory name per spec.md §4.3, already
/// sanitized.
pub fn build_release_dirname(input: ReleaseNameInput<'_>) -> String {
    let mut name = format!("{} - ", input.album_artists_formatted);

    if let Some(year) = input.year {
        name.push_str(&format!("{year}. "));
    }
    name.push_str(input.album.unwrap_or("Unknown Release"));

    if !matches!(input.release_type, ReleaseType::Album | ReleaseType::Unknown) {
        name.push_str(" - ");
        name.push_str(&input.release_type.as_title_case());
    }
    if !input.genres.is_empty() {
        name.push_str(&format!(" [{}]", input.genres.join(";")));
    }
    if !input.labels.is_empty() {
        name.push_str(&format!(" {{{}}}", input.labels.join(";")));
    }

    sanitize_filename(&name)
}

/// Inputs needed to build a track's virtual file name.
pub struct TrackNameInput<'a> {
    pub disc_number: Option<&'a str>,
    pub track_number: Option<&'a str>,
    pub title: Option<&'a str>,
    pub duration_seconds: i64,
    /// `Some(formatted)` when the track's artists differ from the
    /// release's album artists; `None` to omit the trailing credit.
    pub track_artists_formatted: Option<&'a str>,
}

/// Build a track's virtual file name per spec.md §4.3, already sanitized.
pub fn build_track_filename(input: TrackNameInput<'_>) -> String {
    let mut name = String::new();

    if let Some(disc) = input.disc_number {
        name.push_str(&format!("{:0>2}-", disc));
    }
    if let Some(track) = input.track_number {
        name.push_str(&format!("{:0>2}. ", track));
    }
    name.push_str(input.title.unwrap_or("Unknown Title"));

    let minutes = input.duration_seconds / 60;
    let seconds = input.duration_seconds % 60;
    name.push_str(&format!(" [{minutes}：{seconds:02}]"));

    if let Some(artists) = input.track_artists_formatted {
        name.push_str(&format!(" (by {artists})"));
    }

    sanitize_filename(&name)
}
