use anyhow::Result;
use async_trait::async_trait;
use plex_proxy_config::{FetchTuning, PlexSettings};
use plex_proxy_models::LibrarySection;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{parse_sections, PlexHttpClient};
use crate::candidates::resolve_candidates;
use crate::identity::resolve_machine_identifier;
use crate::pager::fetch_all_pages;
use crate::probe::probe_candidates;
use crate::traits::LibraryBackend;

/// Why no usable server connection could be established. Both variants
/// surface as service-unavailable at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("No Plex server address is configured")]
    NoCandidates,
    #[error("No configured Plex server is reachable")]
    Unreachable,
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}

/// A probed, identified Plex server, valid for one request.
pub struct PlexServer {
    http: PlexHttpClient,
    base_url: String,
    machine_identifier: Option<String>,
    sections: Vec<LibrarySection>,
    tuning: FetchTuning,
}

/// Establish a connection for this request: expand candidates, probe for
/// the first server that answers the sections query, then resolve the
/// machine identity best-effort.
pub async fn connect(
    settings: &PlexSettings,
    tuning: &FetchTuning,
    token: String,
) -> Result<PlexServer, ConnectError> {
    let candidates = resolve_candidates(settings);
    if candidates.is_empty() {
        return Err(ConnectError::NoCandidates);
    }

    let http = PlexHttpClient::new(token)?;

    let (base_url, sections_json) =
        probe_candidates(&http, &candidates, tuning.probe_timeout)
            .await
            .ok_or(ConnectError::Unreachable)?;

    let machine_identifier =
        match resolve_machine_identifier(&http, &base_url, tuning.identity_timeout).await {
            Some(id) => Some(id),
            None => {
                if settings.machine_id_override.is_some() {
                    debug!("Plex connect: Using configured machine identifier override");
                }
                settings.machine_id_override.clone()
            }
        };

    let sections = parse_sections(&sections_json);
    info!(
        "Plex connect: Active server with {} movie/show sections, identity {}",
        sections.len(),
        if machine_identifier.is_some() { "resolved" } else { "unknown" }
    );

    Ok(PlexServer {
        http,
        base_url,
        machine_identifier,
        sections,
        tuning: tuning.clone(),
    })
}

#[async_trait]
impl LibraryBackend for PlexServer {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn machine_identifier(&self) -> Option<&str> {
        self.machine_identifier.as_deref()
    }

    fn sections(&self) -> &[LibrarySection] {
        &self.sections
    }

    async fn section_items(&self, section_key: &str) -> Result<Vec<Value>> {
        let path = format!("/library/sections/{}/all", section_key);
        fetch_all_pages(self.tuning.page_size, self.tuning.max_pages, |start| {
            self.http.get_container_page(
                &self.base_url,
                &path,
                start,
                self.tuning.page_size,
                self.tuning.items_timeout,
            )
        })
        .await
    }

    async fn section_leaves(&self, section_key: &str) -> Result<Vec<Value>> {
        let path = format!("/library/sections/{}/allLeaves", section_key);
        fetch_all_pages(self.tuning.page_size, self.tuning.max_pages, |start| {
            self.http.get_container_page(
                &self.base_url,
                &path,
                start,
                self.tuning.page_size,
                self.tuning.leaves_timeout,
            )
        })
        .await
    }

    fn image_url(&self, path: &str) -> String {
        self.http.image_url(&self.base_url, path)
    }
}
