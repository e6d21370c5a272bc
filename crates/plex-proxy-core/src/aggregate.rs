use futures::stream::{self, StreamExt};
use plex_proxy_client::{connect, ConnectError, LibraryBackend};
use plex_proxy_config::{AccessTokenProvider, FetchTuning, PlexSettings};
use plex_proxy_models::{
    LibraryResponse, LibrarySection, LibrarySummary, MediaKind, NormalizedItem, SectionReport,
    ServerDescriptor,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::AggregateError;
use crate::normalize::{normalize_item, string_or_number, ItemContext};
use crate::resolution::labels_from_media;

/// The caller-controllable knobs of one library request.
#[derive(Debug, Clone, Default)]
pub struct LibraryQuery {
    /// Restrict the response to one section key.
    pub section: Option<String>,
    /// Response item cap; clamped into [1, hard cap], defaulted when
    /// absent.
    pub limit: Option<i64>,
}

/// The full request flow: credentials, candidate expansion, probing,
/// identity, then aggregation. Everything before aggregation can fail
/// the request; aggregation itself absorbs per-section failures.
pub async fn handle_library_request(
    settings: &PlexSettings,
    tuning: &FetchTuning,
    provider: &dyn AccessTokenProvider,
    query: &LibraryQuery,
) -> Result<LibraryResponse, AggregateError> {
    let token = provider
        .access_token()
        .await
        .filter(|token| !token.trim().is_empty())
        .ok_or(AggregateError::MissingCredentials)?;

    let server = connect(settings, tuning, token).await.map_err(|err| match err {
        ConnectError::NoCandidates => AggregateError::NotConfigured,
        ConnectError::Unreachable => AggregateError::Unreachable,
        ConnectError::Setup(cause) => AggregateError::Internal(cause),
    })?;

    Ok(build_response(&server, query, tuning).await)
}

/// Aggregate a connected server's library into one response: fetch every
/// matching section (bounded concurrency, results kept in section order
/// so repeated calls are identical), normalize, count, sort, truncate.
pub async fn build_response(
    backend: &dyn LibraryBackend,
    query: &LibraryQuery,
    tuning: &FetchTuning,
) -> LibraryResponse {
    let sections: Vec<LibrarySection> = backend
        .sections()
        .iter()
        .filter(|section| {
            query
                .section
                .as_deref()
                .map_or(true, |wanted| section.key == wanted)
        })
        .cloned()
        .collect();

    let section_fetches = sections
        .into_iter()
        .map(|section| fetch_section(backend, section));
    let outcomes: Vec<SectionOutcome> = stream::iter(section_fetches)
        .buffered(tuning.section_concurrency.max(1))
        .collect()
        .await;

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut all_items: Vec<NormalizedItem> = Vec::new();
    let mut resolution_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut movies_count: u64 = 0;
    let mut shows_count: u64 = 0;

    for outcome in outcomes {
        for item in &outcome.items {
            match item.kind {
                MediaKind::Movie => movies_count += 1,
                MediaKind::Show => shows_count += 1,
            }
            for label in &item.resolutions {
                *resolution_counts.entry(label.clone()).or_insert(0) += 1;
            }
        }
        all_items.extend(outcome.items);
        reports.push(outcome.report);
    }

    let total_items = all_items.len() as u64;

    all_items.sort_by(|a, b| {
        b.added_at
            .cmp(&a.added_at)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });

    let max_items = tuning.effective_max_items(query.limit);
    let truncated = total_items > max_items;
    if truncated {
        debug!(
            "Plex aggregate: Truncating {} items to the {}-item cap",
            total_items, max_items
        );
        all_items.truncate(max_items as usize);
    }

    LibraryResponse {
        available: true,
        server: ServerDescriptor {
            base_url: backend.base_url().to_string(),
            machine_identifier: backend.machine_identifier().map(String::from),
        },
        summary: LibrarySummary {
            sections_count: reports.len() as u64,
            total_items,
            movies_count,
            shows_count,
            resolution_counts,
            truncated,
            max_items,
        },
        sections: reports,
        items: all_items,
    }
}

struct SectionOutcome {
    report: SectionReport,
    items: Vec<NormalizedItem>,
}

/// One section's contribution. A failed item listing yields an empty
/// report rather than failing the request; a failed episode listing
/// degrades shows to their own direct resolutions.
async fn fetch_section(backend: &dyn LibraryBackend, section: LibrarySection) -> SectionOutcome {
    let raw_items = match backend.section_items(&section.key).await {
        Ok(items) => items,
        Err(err) => {
            warn!(
                "Plex aggregate: Listing section '{}' failed: {:#}",
                section.title, err
            );
            return SectionOutcome {
                report: SectionReport::empty(&section),
                items: Vec::new(),
            };
        }
    };

    let episode_resolutions = if section.kind == MediaKind::Show {
        match backend.section_leaves(&section.key).await {
            Ok(leaves) => Some(collect_episode_resolutions(&leaves)),
            Err(err) => {
                warn!(
                    "Plex aggregate: Listing episodes of '{}' failed, shows keep their direct resolutions: {:#}",
                    section.title, err
                );
                None
            }
        }
    } else {
        None
    };

    let ctx = ItemContext {
        section: &section,
        backend,
        episode_resolutions: episode_resolutions.as_ref(),
    };

    let mut items = Vec::with_capacity(raw_items.len());
    let mut skipped = 0usize;
    for raw in &raw_items {
        match normalize_item(raw, &ctx) {
            Some(item) => items.push(item),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(
            "Plex aggregate: Skipped {} unparseable items in section '{}'",
            skipped, section.title
        );
    }

    let mut resolution_counts: BTreeMap<String, u64> = BTreeMap::new();
    for item in &items {
        for label in &item.resolutions {
            *resolution_counts.entry(label.clone()).or_insert(0) += 1;
        }
    }

    SectionOutcome {
        report: SectionReport {
            key: section.key.clone(),
            title: section.title.clone(),
            kind: section.kind,
            count: items.len() as u64,
            resolution_counts,
        },
        items,
    }
}

/// Union of resolution labels across a show section's leaf episodes,
/// keyed by the owning show. A show offers a resolution if any of its
/// episodes does.
fn collect_episode_resolutions(leaves: &[serde_json::Value]) -> HashMap<String, Vec<String>> {
    let mut by_show: HashMap<String, Vec<String>> = HashMap::new();
    for leaf in leaves {
        let Some(show_key) = string_or_number(leaf.get("grandparentRatingKey")) else {
            continue;
        };
        let labels = labels_from_media(leaf);
        if !labels.is_empty() {
            by_show.entry(show_key).or_default().extend(labels);
        }
    }
    by_show
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashSet;

    struct MockBackend {
        sections: Vec<LibrarySection>,
        items: HashMap<String, Vec<Value>>,
        leaves: HashMap<String, Vec<Value>>,
        failing_sections: HashSet<String>,
        failing_leaves: HashSet<String>,
        machine_identifier: Option<String>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                sections: Vec::new(),
                items: HashMap::new(),
                leaves: HashMap::new(),
                failing_sections: HashSet::new(),
                failing_leaves: HashSet::new(),
                machine_identifier: Some("mock-machine".to_string()),
            }
        }

        fn with_section(mut self, key: &str, title: &str, kind: MediaKind, items: Vec<Value>) -> Self {
            self.sections.push(LibrarySection {
                key: key.to_string(),
                title: title.to_string(),
                kind,
            });
            self.items.insert(key.to_string(), items);
            self
        }

        fn with_leaves(mut self, key: &str, leaves: Vec<Value>) -> Self {
            self.leaves.insert(key.to_string(), leaves);
            self
        }
    }

    #[async_trait]
    impl LibraryBackend for MockBackend {
        fn base_url(&self) -> &str {
            "http://127.0.0.1:32400"
        }

        fn machine_identifier(&self) -> Option<&str> {
            self.machine_identifier.as_deref()
        }

        fn sections(&self) -> &[LibrarySection] {
            &self.sections
        }

        async fn section_items(&self, section_key: &str) -> Result<Vec<Value>> {
            if self.failing_sections.contains(section_key) {
                anyhow::bail!("section listing failed");
            }
            Ok(self.items.get(section_key).cloned().unwrap_or_default())
        }

        async fn section_leaves(&self, section_key: &str) -> Result<Vec<Value>> {
            if self.failing_leaves.contains(section_key) {
                anyhow::bail!("episode listing failed");
            }
            Ok(self.leaves.get(section_key).cloned().unwrap_or_default())
        }

        fn image_url(&self, path: &str) -> String {
            format!("http://127.0.0.1:32400{}?X-Plex-Token=mock", path)
        }
    }

    fn movie(rating_key: &str, title: &str, added_at: i64) -> Value {
        json!({
            "ratingKey": rating_key,
            "type": "movie",
            "title": title,
            "year": 2020,
            "addedAt": added_at,
            "duration": 7_200_000,
            "thumb": format!("/library/metadata/{}/thumb/1", rating_key),
            "Media": [{"videoResolution": "1080", "width": 1920, "height": 1080}]
        })
    }

    fn query() -> LibraryQuery {
        LibraryQuery::default()
    }

    fn tuning() -> FetchTuning {
        FetchTuning::default()
    }

    #[tokio::test]
    async fn test_end_to_end_movie_and_show_scenario() {
        let backend = MockBackend::new()
            .with_section(
                "1",
                "Movies",
                MediaKind::Movie,
                vec![
                    json!({
                        "ratingKey": "101",
                        "type": "movie",
                        "title": "Inception",
                        "year": 2010,
                        "addedAt": 1000,
                        "guid": "tmdb://27205",
                        "Media": [{"videoResolution": "1080"}]
                    }),
                    json!({
                        "ratingKey": "102",
                        "type": "movie",
                        "title": "Unmatched",
                        "addedAt": 900,
                        "Media": [{"width": 3840, "height": 2160}]
                    }),
                ],
            )
            .with_section(
                "2",
                "TV Shows",
                MediaKind::Show,
                vec![json!({
                    "ratingKey": "201",
                    "type": "show",
                    "title": "Some Show",
                    "addedAt": 800,
                    "leafCount": 2,
                    "childCount": 1
                })],
            )
            .with_leaves(
                "2",
                vec![
                    json!({
                        "ratingKey": "301",
                        "grandparentRatingKey": "201",
                        "Media": [{"videoResolution": "720"}]
                    }),
                    json!({
                        "ratingKey": "302",
                        "grandparentRatingKey": "201",
                        "Media": [{"videoResolution": "1080"}]
                    }),
                ],
            );

        let response = build_response(&backend, &query(), &tuning()).await;

        assert!(response.available);
        assert_eq!(response.summary.sections_count, 2);
        assert_eq!(response.summary.movies_count, 2);
        assert_eq!(response.summary.shows_count, 1);
        assert_eq!(response.summary.total_items, 3);
        assert!(!response.summary.truncated);

        let inception = response
            .items
            .iter()
            .find(|item| item.title == "Inception")
            .unwrap();
        assert_eq!(inception.tmdb_id, Some(27205));
        assert_eq!(inception.resolutions, vec!["1080p"]);

        let unmatched = response
            .items
            .iter()
            .find(|item| item.title == "Unmatched")
            .unwrap();
        assert_eq!(unmatched.tmdb_id, None);
        assert_eq!(unmatched.resolutions, vec!["4K"]);

        let show = response
            .items
            .iter()
            .find(|item| item.title == "Some Show")
            .unwrap();
        assert_eq!(show.resolutions, vec!["1080p", "720p"]);
        assert_eq!(show.primary_resolution.as_deref(), Some("1080p"));

        assert_eq!(response.summary.resolution_counts.get("1080p"), Some(&2));
        assert_eq!(response.summary.resolution_counts.get("4K"), Some(&1));
        assert_eq!(response.summary.resolution_counts.get("720p"), Some(&1));
    }

    #[tokio::test]
    async fn test_items_sort_by_added_at_then_title() {
        let backend = MockBackend::new().with_section(
            "1",
            "Movies",
            MediaKind::Movie,
            vec![
                movie("1", "zulu", 500),
                movie("2", "Alpha", 900),
                movie("3", "beta", 900),
                movie("4", "Gamma", 700),
            ],
        );

        let response = build_response(&backend, &query(), &tuning()).await;

        let titles: Vec<&str> = response.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "beta", "Gamma", "zulu"]);

        for pair in response.items.windows(2) {
            let ok = pair[0].added_at > pair[1].added_at
                || (pair[0].added_at == pair[1].added_at
                    && pair[0].title.to_lowercase() <= pair[1].title.to_lowercase());
            assert!(ok, "sort invariant violated");
        }
    }

    #[tokio::test]
    async fn test_truncation_invariant() {
        let items: Vec<Value> = (0..10i64)
            .map(|i| movie(&i.to_string(), &format!("Movie {}", i), 1000 - i))
            .collect();
        let backend = MockBackend::new().with_section("1", "Movies", MediaKind::Movie, items);

        let limited = LibraryQuery {
            section: None,
            limit: Some(4),
        };
        let response = build_response(&backend, &limited, &tuning()).await;

        assert_eq!(response.items.len(), 4);
        assert!(response.summary.truncated);
        assert_eq!(response.summary.total_items, 10);
        assert_eq!(response.summary.max_items, 4);

        // A limit above the item count must not flag truncation.
        let roomy = LibraryQuery {
            section: None,
            limit: Some(50),
        };
        let response = build_response(&backend, &roomy, &tuning()).await;
        assert_eq!(response.items.len(), 10);
        assert!(!response.summary.truncated);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let backend = MockBackend::new().with_section(
            "1",
            "Movies",
            MediaKind::Movie,
            vec![movie("1", "A", 3), movie("2", "B", 2), movie("3", "C", 1)],
        );

        let first = build_response(&backend, &query(), &tuning()).await;
        let second = build_response(&backend, &query(), &tuning()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_section_is_reported_empty_but_others_survive() {
        let mut backend = MockBackend::new()
            .with_section("1", "Movies", MediaKind::Movie, vec![movie("1", "A", 1)])
            .with_section("2", "Broken", MediaKind::Movie, vec![movie("2", "B", 2)]);
        backend.failing_sections.insert("2".to_string());

        let response = build_response(&backend, &query(), &tuning()).await;

        assert_eq!(response.summary.sections_count, 2);
        assert_eq!(response.summary.total_items, 1);
        let broken = response.sections.iter().find(|s| s.key == "2").unwrap();
        assert_eq!(broken.count, 0);
        assert!(broken.resolution_counts.is_empty());
    }

    #[tokio::test]
    async fn test_failed_episode_listing_keeps_show_direct_resolutions() {
        let mut backend = MockBackend::new().with_section(
            "2",
            "TV Shows",
            MediaKind::Show,
            vec![json!({
                "ratingKey": "201",
                "type": "show",
                "title": "Direct",
                "addedAt": 1,
                "Media": [{"videoResolution": "1080"}]
            })],
        );
        backend.failing_leaves.insert("2".to_string());

        let response = build_response(&backend, &query(), &tuning()).await;

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].resolutions, vec!["1080p"]);
    }

    #[tokio::test]
    async fn test_section_filter_limits_the_response() {
        let backend = MockBackend::new()
            .with_section("1", "Movies", MediaKind::Movie, vec![movie("1", "A", 1)])
            .with_section("2", "More Movies", MediaKind::Movie, vec![movie("2", "B", 2)]);

        let filtered = LibraryQuery {
            section: Some("2".to_string()),
            limit: None,
        };
        let response = build_response(&backend, &filtered, &tuning()).await;

        assert_eq!(response.summary.sections_count, 1);
        assert_eq!(response.sections[0].key, "2");
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].title, "B");
    }

    #[tokio::test]
    async fn test_links_and_images_carry_server_context() {
        let backend = MockBackend::new().with_section(
            "1",
            "Movies",
            MediaKind::Movie,
            vec![movie("42", "Linked", 1)],
        );

        let response = build_response(&backend, &query(), &tuning()).await;
        let item = &response.items[0];

        assert_eq!(item.id, "plex-42");
        assert_eq!(
            item.links.web.as_deref(),
            Some("https://app.plex.tv/desktop/#!/server/mock-machine/details?key=%2Flibrary%2Fmetadata%2F42")
        );
        assert_eq!(
            item.links.mobile.as_deref(),
            Some("plex://preplay/?metadataKey=%2Flibrary%2Fmetadata%2F42&server=mock-machine")
        );
        assert_eq!(
            item.thumb.as_deref(),
            Some("http://127.0.0.1:32400/library/metadata/42/thumb/1?X-Plex-Token=mock")
        );
    }

    #[tokio::test]
    async fn test_missing_machine_identifier_degrades_links() {
        let mut backend = MockBackend::new().with_section(
            "1",
            "Movies",
            MediaKind::Movie,
            vec![movie("42", "Linked", 1)],
        );
        backend.machine_identifier = None;

        let response = build_response(&backend, &query(), &tuning()).await;
        let item = &response.items[0];

        assert_eq!(
            item.links.web.as_deref(),
            Some("http://127.0.0.1:32400/web/index.html#!/details?key=%2Flibrary%2Fmetadata%2F42")
        );
        assert_eq!(item.links.mobile, None);
        assert_eq!(response.server.machine_identifier, None);
    }

    #[tokio::test]
    async fn test_missing_token_is_a_credentials_error() {
        let settings = PlexSettings::default();
        let provider = plex_proxy_config::StaticTokenProvider::missing();

        let err = handle_library_request(&settings, &tuning(), &provider, &query())
            .await
            .unwrap_err();
        assert!(matches!(err, AggregateError::MissingCredentials));
    }
}
