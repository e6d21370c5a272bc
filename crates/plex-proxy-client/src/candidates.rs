use plex_proxy_config::PlexSettings;
use tracing::debug;
use url::Url;

const LOCAL_FALLBACK_URL: &str = "http://127.0.0.1:32400";

/// Expand the configured server addresses into an ordered, deduplicated
/// candidate list. Pure function, never errors: unparseable entries are
/// dropped, and an unconfigured service falls back to the local default
/// address.
pub fn resolve_candidates(settings: &PlexSettings) -> Vec<String> {
    let mut configured: Vec<&str> = Vec::new();
    if let Some(primary) = settings.server_url.as_deref() {
        configured.push(primary);
    }
    for extra in &settings.extra_server_urls {
        configured.push(extra);
    }
    if configured.is_empty() {
        configured.push(LOCAL_FALLBACK_URL);
    }

    let mut candidates = Vec::new();
    for raw in configured {
        let Some(normalized) = normalize_base_url(raw) else {
            debug!("Plex candidates: Dropping unparseable server URL entry");
            continue;
        };

        // Local media servers often carry only a self-signed cert on
        // HTTPS; plain HTTP on the same host is the more reliable local
        // path, so probe it right after the HTTPS form.
        let http_twin = https_private_fallback(&normalized);

        candidates.push(normalized);
        if let Some(twin) = http_twin {
            candidates.push(twin);
        }
    }

    dedup_preserving_order(candidates)
}

/// Rebuild a URL as `scheme://host[:port]` plus its path with trailing
/// slashes stripped. Returns `None` when the value does not parse as an
/// absolute URL with a host.
fn normalize_base_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?;

    let mut base = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{}", port));
    }

    let path = parsed.path().trim_end_matches('/');
    if !path.is_empty() {
        base.push_str(path);
    }

    Some(base)
}

/// For an HTTPS candidate on a private or loopback host, synthesize the
/// same address over plain HTTP.
fn https_private_fallback(normalized: &str) -> Option<String> {
    let parsed = Url::parse(normalized).ok()?;
    if parsed.scheme() != "https" {
        return None;
    }
    let host = parsed.host_str()?;
    if !is_private_host(host) {
        return None;
    }
    Some(format!("http{}", normalized.strip_prefix("https")?))
}

fn is_private_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".local") {
        return true;
    }
    if host.starts_with("127.") || host.starts_with("10.") || host.starts_with("192.168.") {
        return true;
    }
    // 172.16.0.0/12
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some(second) = rest.split('.').next().and_then(|s| s.parse::<u8>().ok()) {
            return (16..=31).contains(&second);
        }
    }
    false
}

fn dedup_preserving_order(candidates: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect()
}
