use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::api::PlexHttpClient;

pub const SECTIONS_PATH: &str = "/library/sections";

/// Try each candidate base URL in order until one answers the sections
/// listing. Individual failures (network error, non-2xx, timeout, bad
/// JSON) are logged at debug level and swallowed; the caller only learns
/// whether any candidate worked, never which ones did not.
pub async fn probe_candidates(
    client: &PlexHttpClient,
    candidates: &[String],
    timeout: Duration,
) -> Option<(String, Value)> {
    for candidate in candidates {
        match client.get_json(candidate, SECTIONS_PATH, timeout).await {
            Ok(sections_json) => {
                debug!("Plex probe: Candidate {} answered the sections query", candidate);
                return Some((candidate.clone(), sections_json));
            }
            Err(err) => {
                debug!("Plex probe: Candidate {} failed: {:#}", candidate, err);
            }
        }
    }
    None
}
