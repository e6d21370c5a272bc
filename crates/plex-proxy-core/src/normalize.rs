use plex_proxy_client::LibraryBackend;
use plex_proxy_models::{
    sort_resolution_labels, ItemLinks, LibrarySection, MediaKind, NormalizedItem,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::guid::extract_tmdb_id;
use crate::resolution::labels_from_media;

/// Everything normalization needs besides the raw item itself.
pub struct ItemContext<'a> {
    pub section: &'a LibrarySection,
    pub backend: &'a dyn LibraryBackend,
    /// For show sections: resolution labels of every fetched episode,
    /// keyed by the owning show's rating key.
    pub episode_resolutions: Option<&'a HashMap<String, Vec<String>>>,
}

/// Map one raw upstream item into the response shape. All defensive
/// optional-field access happens here, once; callers never touch the raw
/// value again. Returns `None` for items that lack the one field nothing
/// works without (a rating key).
pub fn normalize_item(raw: &Value, ctx: &ItemContext<'_>) -> Option<NormalizedItem> {
    let rating_key = string_or_number(raw.get("ratingKey"))?;

    let kind = raw
        .get("type")
        .and_then(|t| t.as_str())
        .and_then(MediaKind::from_plex_type)
        .unwrap_or(ctx.section.kind);

    let title = raw
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();
    let year = raw.get("year").and_then(|y| y.as_u64()).map(|y| y as u32);
    let added_at = raw.get("addedAt").and_then(|a| a.as_i64()).unwrap_or(0);
    let duration_ms = raw.get("duration").and_then(|d| d.as_u64()).unwrap_or(0);
    let leaf_count = raw.get("leafCount").and_then(|c| c.as_u64());
    let child_count = raw.get("childCount").and_then(|c| c.as_u64());

    let mut labels = labels_from_media(raw);
    if kind == MediaKind::Show {
        if let Some(per_show) = ctx
            .episode_resolutions
            .and_then(|map| map.get(&rating_key))
        {
            labels.extend(per_show.iter().cloned());
        }
    }
    let resolutions = sort_resolution_labels(labels);
    let primary_resolution = resolutions.first().cloned();

    let thumb = image_link(raw.get("thumb"), ctx);
    let art = image_link(raw.get("art"), ctx);

    Some(NormalizedItem {
        id: format!("plex-{}", rating_key),
        links: build_links(&rating_key, ctx),
        tmdb_type: kind.tmdb_type().to_string(),
        tmdb_id: extract_tmdb_id(raw),
        rating_key,
        kind,
        title,
        year,
        added_at,
        duration_ms,
        leaf_count,
        child_count,
        section_key: ctx.section.key.clone(),
        section_title: ctx.section.title.clone(),
        thumb,
        art,
        resolutions,
        primary_resolution,
    })
}

/// Rating keys are strings on current servers but have shown up as bare
/// numbers from older ones.
pub(crate) fn string_or_number(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn image_link(path: Option<&Value>, ctx: &ItemContext<'_>) -> Option<String> {
    path.and_then(|p| p.as_str())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| ctx.backend.image_url(p))
}

/// Deep links for one item. With a machine identifier we can link into
/// app.plex.tv and the mobile apps; without one, the web link degrades
/// to the server-relative UI and the mobile link is omitted entirely.
fn build_links(rating_key: &str, ctx: &ItemContext<'_>) -> ItemLinks {
    let metadata_key = format!("/library/metadata/{}", rating_key);
    let encoded_key = urlencoding::encode(&metadata_key).into_owned();

    match ctx.backend.machine_identifier() {
        Some(machine_id) => ItemLinks {
            web: Some(format!(
                "https://app.plex.tv/desktop/#!/server/{}/details?key={}",
                machine_id, encoded_key
            )),
            mobile: Some(format!(
                "plex://preplay/?metadataKey={}&server={}",
                encoded_key, machine_id
            )),
        },
        None => ItemLinks {
            web: Some(format!(
                "{}/web/index.html#!/details?key={}",
                ctx.backend.base_url(),
                encoded_key
            )),
            mobile: None,
        },
    }
}
