//! Track entity

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::artist::ArtistRelation;

/// A track (audio file), as held by the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub source_path: PathBuf,
    pub virtual_filename: String,
    pub title: String,
    pub release_id: String,
    pub track_number: String,
    pub disc_number: String,
    pub duration_seconds: i64,
    pub artists: Vec<ArtistRelation>,
}
