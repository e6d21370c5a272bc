use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// Deep links into the Plex apps for one item. `web` degrades to a
/// server-relative link when the machine identifier is unknown; `mobile`
/// requires it and is omitted otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemLinks {
    pub web: Option<String>,
    pub mobile: Option<String>,
}

/// One library item after normalization. Built once per raw upstream item
/// per request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedItem {
    pub id: String,
    pub rating_key: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub tmdb_type: String,
    pub tmdb_id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    pub added_at: i64,
    pub duration_ms: u64,
    pub leaf_count: Option<u64>,
    pub child_count: Option<u64>,
    pub section_key: String,
    pub section_title: String,
    pub thumb: Option<String>,
    pub art: Option<String>,
    /// Distinct resolution labels across all media variants, canonical
    /// order, unknown labels last.
    pub resolutions: Vec<String>,
    pub primary_resolution: Option<String>,
    pub links: ItemLinks,
}
