//! Artist roles and the six-bucket artist set

use serde::{Deserialize, Serialize};

/// The role an artist plays on a release or track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistRole {
    Main,
    Guest,
    Remixer,
    Producer,
    Composer,
    #[serde(rename = "djmixer")]
    DjMixer,
}

impl ArtistRole {
    /// The role label stored in the `role` column of `releases_artists` /
    /// `tracks_artists`, matching the original's lowercase role strings.
    pub fn as_db_str(self) -> &'static str {
        match self {
            ArtistRole::Main => "main",
            ArtistRole::Guest => "guest",
            ArtistRole::Remixer => "remixer",
            ArtistRole::Producer => "producer",
            ArtistRole::Composer => "composer",
            ArtistRole::DjMixer => "djmixer",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "main" => Some(ArtistRole::Main),
            "guest" => Some(ArtistRole::Guest),
            "remixer" => Some(ArtistRole::Remixer),
            "producer" => Some(ArtistRole::Producer),
            "composer" => Some(ArtistRole::Composer),
            "djmixer" => Some(ArtistRole::DjMixer),
            _ => None,
        }
    }
}

/// A single artist credited with a role, as stored in a join table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRelation {
    pub name: String,
    pub role: ArtistRole,
}

/// The six role buckets produced by [`crate::artiststr::parse_artist_string`]
/// and consumed by [`crate::artiststr::format_artist_string`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artists {
    pub main: Vec<String>,
    pub guest: Vec<String>,
    pub remixer: Vec<String>,
    pub producer: Vec<String>,
    pub composer: Vec<String>,
    pub djmixer: Vec<String>,
}

impl Artists {
    /// Flatten into `(name, role)` relations, in bucket order, for insertion
    /// into a join table.
    pub fn to_relations(&self) -> Vec<ArtistRelation> {
        let mut out = Vec::new();
        for (names, role) in [
            (&self.main, ArtistRole::Main),
            (&self.guest, ArtistRole::Guest),
            (&self.remixer, ArtistRole::Remixer),
            (&self.producer, ArtistRole::Producer),
            (&self.composer, ArtistRole::Composer),
            (&self.djmixer, ArtistRole::DjMixer),
        ] {
            for name in names {
                out.push(ArtistRelation {
                    name: name.clone(),
                    role,
                });
            }
        }
        out
    }
}
