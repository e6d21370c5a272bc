use anyhow::{Context, Result};
use plex_proxy_models::{LibrarySection, MediaKind};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::pager::ContainerPage;

/// Thin HTTP client over the Plex server API. Carries the access token
/// as a default header; every call takes an explicit timeout so one
/// unresponsive upstream cannot hang a request indefinitely.
pub struct PlexHttpClient {
    client: Client,
    token: String,
}

impl PlexHttpClient {
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-token"),
                    reqwest::header::HeaderValue::from_str(&token)
                        .context("Invalid token format")?,
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static("shelfproxy"),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// GET a server path and parse the body as JSON. A non-2xx status is
    /// an error; callers decide whether that fails their unit of work.
    pub async fn get_json(&self, base_url: &str, path: &str, timeout: Duration) -> Result<Value> {
        let url = format!("{}{}", base_url, path);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Request to {} returned HTTP {}", path, status);
        }

        response
            .json()
            .await
            .with_context(|| format!("Response from {} was not valid JSON", path))
    }

    /// GET the raw response for a server path without requiring JSON.
    /// Used by the machine-identity resolver, which inspects headers and
    /// falls back to scanning the body text.
    pub async fn get_raw(
        &self,
        base_url: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", base_url, path);
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Request to {} returned HTTP {}", path, status);
        }
        Ok(response)
    }

    /// Fetch one pagination window of a library listing.
    pub async fn get_container_page(
        &self,
        base_url: &str,
        path: &str,
        start: u64,
        size: u64,
        timeout: Duration,
    ) -> Result<ContainerPage> {
        let url = format!("{}{}", base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("X-Plex-Container-Start", start.to_string()),
                ("X-Plex-Container-Size", size.to_string()),
            ])
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Request to {} returned HTTP {}", path, status);
        }

        let json: Value = response
            .json()
            .await
            .with_context(|| format!("Response from {} was not valid JSON", path))?;

        Ok(parse_container_page(&json))
    }

    /// Build an absolute image URL from a server-relative thumb/art path,
    /// with the access token appended so browsers can load it directly.
    pub fn image_url(&self, base_url: &str, path: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}X-Plex-Token={}",
            base_url,
            path,
            separator,
            urlencoding::encode(&self.token)
        )
    }
}

/// Pull the pagination-relevant fields out of a MediaContainer response.
/// Items live under `Metadata`; some server versions report them under
/// `Video` instead.
pub fn parse_container_page(json: &Value) -> ContainerPage {
    let container = json.get("MediaContainer").cloned().unwrap_or(Value::Null);

    let items = container
        .get("Metadata")
        .or_else(|| container.get("Video"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    ContainerPage {
        items,
        offset: container.get("offset").and_then(|v| v.as_u64()),
        size: container.get("size").and_then(|v| v.as_u64()),
        total_size: container.get("totalSize").and_then(|v| v.as_u64()),
    }
}

/// Parse the sections listing into movie/show sections, dropping every
/// other library type.
pub fn parse_sections(json: &Value) -> Vec<LibrarySection> {
    let mut sections = Vec::new();
    if let Some(directories) = json
        .get("MediaContainer")
        .and_then(|mc| mc.get("Directory"))
        .and_then(|d| d.as_array())
    {
        for dir in directories {
            let key = dir.get("key").and_then(|k| k.as_str()).unwrap_or("");
            let title = dir.get("title").and_then(|t| t.as_str()).unwrap_or("");
            let kind = dir
                .get("type")
                .and_then(|t| t.as_str())
                .and_then(MediaKind::from_plex_type);

            if key.is_empty() {
                continue;
            }
            if let Some(kind) = kind {
                sections.push(LibrarySection {
                    key: key.to_string(),
                    title: title.to_string(),
                    kind,
                });
            }
        }
    }
    debug!("Plex sections: Parsed {} movie/show sections", sections.len());
    sections
}
