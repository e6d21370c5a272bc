use anyhow::Result;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// One pagination window as reported by the server. `offset`, `size`,
/// and `total_size` are what the server claims, not what was requested;
/// none of them is trusted on its own.
#[derive(Debug, Clone, Default)]
pub struct ContainerPage {
    pub items: Vec<Value>,
    pub offset: Option<u64>,
    pub size: Option<u64>,
    pub total_size: Option<u64>,
}

/// Why pagination stopped. Exactly one reason is recorded per listing;
/// each corresponds to one termination predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    EmptyPage,
    ReachedTotal,
    ShortPage,
    Stalled,
    PageCeiling,
}

/// Fetch every item under a listing using offset pagination, strictly in
/// increasing offset order.
///
/// Third-party servers report pagination metadata unreliably, so no
/// single signal is trusted: after every page the whole predicate list
/// is evaluated and the first one that holds ends the loop.
pub async fn fetch_all_pages<F, Fut>(page_size: u64, max_pages: u64, fetch: F) -> Result<Vec<Value>>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<ContainerPage>>,
{
    let mut items: Vec<Value> = Vec::new();
    let mut start: u64 = 0;
    let mut pages_fetched: u64 = 0;
    let mut stop: Option<StopReason> = None;

    while stop.is_none() {
        if pages_fetched >= max_pages {
            stop = Some(StopReason::PageCeiling);
            break;
        }

        // An error on any page fails the whole listing; the caller
        // records the section as unfetchable rather than silently
        // under-reporting it.
        let page = fetch(start).await?;
        pages_fetched += 1;

        let returned = page.items.len() as u64;
        let next_start = next_offset(&page, start, returned);

        let empty_page = returned == 0;
        let reached_total = page
            .total_size
            .map(|total| next_start >= total)
            .unwrap_or(false);
        let short_page = returned < page_size;
        let stalled = !empty_page && next_start <= start;

        items.extend(page.items);

        if empty_page {
            stop = Some(StopReason::EmptyPage);
        } else if stalled {
            stop = Some(StopReason::Stalled);
        } else if reached_total {
            stop = Some(StopReason::ReachedTotal);
        } else if short_page {
            stop = Some(StopReason::ShortPage);
        }

        start = next_start;
    }

    match stop {
        Some(StopReason::Stalled) => warn!(
            "Plex pager: Server reported a non-advancing offset after {} items, stopping",
            items.len()
        ),
        Some(StopReason::PageCeiling) => warn!(
            "Plex pager: Hit the {}-page ceiling with {} items, stopping",
            max_pages,
            items.len()
        ),
        _ => debug!(
            "Plex pager: Collected {} items over {} pages",
            items.len(),
            pages_fetched
        ),
    }

    Ok(items)
}

/// The offset the next request should use. Prefer the server-reported
/// window (`offset + size`) so a server that ignores the requested start
/// is caught by the stall predicate; fall back to counting items.
fn next_offset(page: &ContainerPage, requested_start: u64, returned: u64) -> u64 {
    match (page.offset, page.size) {
        (Some(offset), Some(size)) => offset + size,
        _ => requested_start + returned,
    }
}
