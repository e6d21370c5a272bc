use std::time::Duration;
use tracing::debug;

use crate::api::PlexHttpClient;

const IDENTITY_HEADER: &str = "x-plex-machine-identifier";
const IDENTITY_PATHS: [&str; 2] = ["/identity", "/"];

/// Best-effort lookup of the server's stable machine identifier, used to
/// build deep links into the Plex apps. Tries the identity endpoint and
/// the server root; for each, prefers the identifier header and falls
/// back to scanning the body text. Returns `None` rather than failing
/// the request when nothing works.
pub async fn resolve_machine_identifier(
    client: &PlexHttpClient,
    base_url: &str,
    timeout: Duration,
) -> Option<String> {
    for path in IDENTITY_PATHS {
        let response = match client.get_raw(base_url, path, timeout).await {
            Ok(response) => response,
            Err(err) => {
                debug!("Plex identity: {} attempt failed: {:#}", path, err);
                continue;
            }
        };

        if let Some(id) = response
            .headers()
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            debug!("Plex identity: Found identifier in {} response header", path);
            return Some(id.to_string());
        }

        match response.text().await {
            Ok(body) => {
                if let Some(id) = scan_identifier(&body) {
                    debug!("Plex identity: Found identifier in {} response body", path);
                    return Some(id);
                }
            }
            Err(err) => {
                debug!("Plex identity: Could not read {} body: {:#}", path, err);
            }
        }
    }

    None
}

/// Pull a machine identifier out of a response body. Handles the JSON
/// form `"machineIdentifier":"…"` and the XML attribute form
/// `machineIdentifier="…"`.
pub fn scan_identifier(body: &str) -> Option<String> {
    for marker in ["\"machineIdentifier\":\"", "machineIdentifier=\""] {
        if let Some(start) = body.find(marker) {
            let rest = &body[start + marker.len()..];
            if let Some(end) = rest.find('"') {
                let id = rest[..end].trim();
                if !id.is_empty() {
                    return Some(id.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scans_json_style_identifier() {
        let body = r#"{"MediaContainer":{"machineIdentifier":"abc123def","version":"1.40.0"}}"#;
        assert_eq!(scan_identifier(body).as_deref(), Some("abc123def"));
    }

    #[test]
    fn test_scans_xml_attribute_identifier() {
        let body = r#"<MediaContainer size="0" machineIdentifier="xyz789" version="1.40.0">"#;
        assert_eq!(scan_identifier(body).as_deref(), Some("xyz789"));
    }

    #[test]
    fn test_missing_identifier_returns_none() {
        assert_eq!(scan_identifier("<MediaContainer size=\"0\">"), None);
        assert_eq!(scan_identifier(""), None);
    }

    #[test]
    fn test_empty_identifier_returns_none() {
        assert_eq!(scan_identifier(r#"machineIdentifier="""#), None);
    }
}
