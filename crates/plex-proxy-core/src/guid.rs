use serde_json::Value;

/// Recover a TMDb ID from a raw item's identifier fields.
///
/// Upstream items carry identifiers in several shapes depending on the
/// server version and metadata agent: a single `guid` string, a `Guid`
/// array of `{id}` / `{guid}` objects or plain strings, or a `guids`
/// field in the same shapes. Every string found is tested against the
/// known TMDb URI patterns; the first positive integer wins.
pub fn extract_tmdb_id(raw_item: &Value) -> Option<u64> {
    for candidate in collect_guid_candidates(raw_item) {
        if let Some(id) = match_tmdb_patterns(&candidate) {
            return Some(id);
        }
    }
    None
}

fn collect_guid_candidates(raw_item: &Value) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(guid) = raw_item.get("guid") {
        push_guid_value(guid, &mut candidates);
    }
    for field in ["Guid", "guids"] {
        if let Some(value) = raw_item.get(field) {
            push_guid_value(value, &mut candidates);
        }
    }
    candidates
}

/// Flatten one identifier field into candidate strings, whatever its
/// shape. Mirrors the looseness of real servers: arrays of objects,
/// arrays of strings, bare objects, bare strings.
fn push_guid_value(value: &Value, candidates: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                candidates.push(trimmed.to_string());
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                push_guid_value(entry, candidates);
            }
        }
        Value::Object(map) => {
            for key in ["id", "guid"] {
                if let Some(inner) = map.get(key) {
                    push_guid_value(inner, candidates);
                }
            }
        }
        _ => {}
    }
}

fn match_tmdb_patterns(candidate: &str) -> Option<u64> {
    if let Some(id) = match_scheme(candidate, "tmdb://") {
        return Some(id);
    }
    if let Some(id) = match_scheme(candidate, "themoviedb://") {
        return Some(id);
    }
    if let Some(id) = match_website_url(candidate) {
        return Some(id);
    }
    match_scheme(candidate, "com.plexapp.agents.themoviedb://")
}

fn match_scheme(candidate: &str, scheme: &str) -> Option<u64> {
    let pos = candidate.find(scheme)?;
    leading_positive_integer(&candidate[pos + scheme.len()..])
}

/// `themoviedb.org/movie/{id}` or `themoviedb.org/tv/{id}`, possibly
/// with a trailing slug or query string.
fn match_website_url(candidate: &str) -> Option<u64> {
    let pos = candidate.find("themoviedb.org/")?;
    let rest = &candidate[pos + "themoviedb.org/".len()..];
    let rest = rest
        .strip_prefix("movie/")
        .or_else(|| rest.strip_prefix("tv/"))?;
    leading_positive_integer(rest)
}

/// Parse the digits at the head of `rest` into a positive integer,
/// ignoring whatever follows (query strings, slugs, language tags).
fn leading_positive_integer(rest: &str) -> Option<u64> {
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().filter(|id| *id > 0)
}
