use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::media::MediaKind;

/// A movie or show library on the remote server, as listed by its
/// sections endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// Per-section slice of the aggregated response: how many items the
/// section contributed and how their resolutions tally up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionReport {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub count: u64,
    #[serde(rename = "resolutionCounts")]
    pub resolution_counts: BTreeMap<String, u64>,
}

impl SectionReport {
    /// An empty report for a section whose fetch failed. The section
    /// still appears in the response so the caller can see it exists.
    pub fn empty(section: &LibrarySection) -> Self {
        Self {
            key: section.key.clone(),
            title: section.title.clone(),
            kind: section.kind,
            count: 0,
            resolution_counts: BTreeMap::new(),
        }
    }
}
