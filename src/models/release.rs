//! Release entity

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::artist::ArtistRelation;

/// Release types the cache recognizes; anything else collapses to `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Album,
    Single,
    Ep,
    Compilation,
    Soundtrack,
    Live,
    Remix,
    Djmix,
    Mixtape,
    Other,
    Unknown,
}

impl ReleaseType {
    pub const ALL: &'static [ReleaseType] = &[
        ReleaseType::Album,
        ReleaseType::Single,
        ReleaseType::Ep,
        ReleaseType::Compilation,
        ReleaseType::Soundtrack,
        ReleaseType::Live,
        ReleaseType::Remix,
        ReleaseType::Djmix,
        ReleaseType::Mixtape,
        ReleaseType::Other,
        ReleaseType::Unknown,
    ];

    /// Parse a raw tag value case-insensitively, falling back to `Unknown`
    /// for anything unrecognized (the original treats tags outside its
    /// known set the same way).
    pub fn from_tag_value(raw: Option<&str>) -> Self {
        match raw.map(|s| s.to_lowercase()) {
            Some(s) => Self::ALL
                .iter()
                .copied()
                .find(|t| t.as_db_str() == s)
                .unwrap_or(ReleaseType::Unknown),
            None => ReleaseType::Unknown,
        }
    }

    pub fn as_db_str(self) -> &'static str {
        match self {
            ReleaseType::Album => "album",
            ReleaseType::Single => "single",
            ReleaseType::Ep => "ep",
            ReleaseType::Compilation => "compilation",
            ReleaseType::Soundtrack => "soundtrack",
            ReleaseType::Live => "live",
            ReleaseType::Remix => "remix",
            ReleaseType::Djmix => "djmix",
            ReleaseType::Mixtape => "mixtape",
            ReleaseType::Other => "other",
            ReleaseType::Unknown => "unknown",
        }
    }

    /// Title-cased form used in virtual directory names, e.g. "Djmix".
    /// Album and Unknown are never appended to the virtual name (see
    /// `virtualname::build_release_dirname`), so their casing is moot.
    pub fn as_title_case(self) -> String {
        let s = self.as_db_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

/// A release (album-equivalent directory), as held by the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    pub source_path: PathBuf,
    pub virtual_dirname: String,
    pub title: String,
    pub release_type: ReleaseType,
    pub release_year: Option<i64>,
    pub new: bool,
    pub genres: Vec<String>,
    pub labels: Vec<String>,
    pub artists: Vec<ArtistRelation>,
}
