use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::item::NormalizedItem;
use crate::section::SectionReport;

/// The server that ended up answering the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptor {
    pub base_url: String,
    pub machine_identifier: Option<String>,
}

/// Library-wide totals for the whole response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySummary {
    pub sections_count: u64,
    pub total_items: u64,
    pub movies_count: u64,
    pub shows_count: u64,
    pub resolution_counts: BTreeMap<String, u64>,
    pub truncated: bool,
    pub max_items: u64,
}

/// The full success payload of `GET /api/plex/library`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryResponse {
    pub available: bool,
    pub server: ServerDescriptor,
    pub summary: LibrarySummary,
    pub sections: Vec<SectionReport>,
    pub items: Vec<NormalizedItem>,
}
