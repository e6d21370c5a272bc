use anyhow::Result;
use async_trait::async_trait;
use plex_proxy_models::LibrarySection;
use serde_json::Value;

/// What the aggregation layer needs from a connected media server.
/// `PlexServer` is the real implementation; tests drive the aggregator
/// with an in-memory one.
///
/// Raw items stay `serde_json::Value` at this boundary: upstream item
/// shapes are heterogeneous, and all defensive field access happens once
/// during normalization rather than scattered across callers.
#[async_trait]
pub trait LibraryBackend: Send + Sync {
    /// The base URL that answered the probe.
    fn base_url(&self) -> &str;

    /// Stable server identifier, when one could be resolved.
    fn machine_identifier(&self) -> Option<&str>;

    /// Movie/show sections, as discovered during connection.
    fn sections(&self) -> &[LibrarySection];

    /// Every item in a section, fully paginated.
    async fn section_items(&self, section_key: &str) -> Result<Vec<Value>>;

    /// Every leaf episode in a show section, fully paginated.
    async fn section_leaves(&self, section_key: &str) -> Result<Vec<Value>>;

    /// Absolute, token-carrying URL for a server-relative image path.
    fn image_url(&self, path: &str) -> String;
}
