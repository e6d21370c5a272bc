use std::time::Duration;

/// Where the proxy should look for a Plex server and how deep links are
/// built. All values come from the environment; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct PlexSettings {
    /// Primary server URL (`PLEX_SERVER_URL`).
    pub server_url: Option<String>,
    /// Additional candidate URLs, tried after the primary
    /// (`PLEX_EXTRA_SERVER_URLS`, comma-separated).
    pub extra_server_urls: Vec<String>,
    /// Overrides the machine identifier when the server refuses to
    /// report one (`PLEX_MACHINE_ID`).
    pub machine_id_override: Option<String>,
}

/// Service-level configuration for the proxy binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub plex: PlexSettings,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Tests pass a
    /// closure over a map instead of mutating process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("SHELFPROXY_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3900);
        let host = lookup("SHELFPROXY_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let server_url = lookup("PLEX_SERVER_URL").filter(|v| !v.trim().is_empty());
        let extra_server_urls = lookup("PLEX_EXTRA_SERVER_URLS")
            .map(|list| {
                list.split(',')
                    .map(|entry| entry.trim().to_string())
                    .filter(|entry| !entry.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let machine_id_override = lookup("PLEX_MACHINE_ID").filter(|v| !v.trim().is_empty());

        Self {
            host,
            port,
            plex: PlexSettings {
                server_url,
                extra_server_urls,
                machine_id_override,
            },
        }
    }
}

/// Tunable fetch parameters, passed explicitly into every component so
/// tests can exercise timeout and page-ceiling paths without touching
/// environment state.
#[derive(Debug, Clone)]
pub struct FetchTuning {
    /// Items requested per pagination call.
    pub page_size: u64,
    /// Hard ceiling on pagination calls per listing (200 pages at the
    /// default page size bounds a single listing to 40,000 items).
    pub max_pages: u64,
    /// Default response item cap when the request does not specify one.
    pub default_max_items: u64,
    /// Upper bound on the caller-supplied item cap.
    pub hard_max_items: u64,
    /// Timeout for each server-probe attempt (sections listing).
    pub probe_timeout: Duration,
    /// Timeout for each machine-identity attempt.
    pub identity_timeout: Duration,
    /// Timeout per pagination call when listing section items.
    pub items_timeout: Duration,
    /// Timeout per pagination call when listing leaf episodes.
    pub leaves_timeout: Duration,
    /// How many sections are fetched concurrently.
    pub section_concurrency: usize,
}

impl Default for FetchTuning {
    fn default() -> Self {
        Self {
            page_size: 200,
            max_pages: 200,
            default_max_items: 2000,
            hard_max_items: 10_000,
            probe_timeout: Duration::from_secs(8),
            identity_timeout: Duration::from_secs(5),
            items_timeout: Duration::from_secs(12),
            leaves_timeout: Duration::from_secs(20),
            section_concurrency: 3,
        }
    }
}

impl FetchTuning {
    /// Clamp a caller-supplied item limit into [1, hard_max_items],
    /// falling back to the default when absent.
    pub fn effective_max_items(&self, requested: Option<i64>) -> u64 {
        match requested {
            Some(limit) => (limit.max(1) as u64).min(self.hard_max_items),
            None => self.default_max_items,
        }
    }
}
