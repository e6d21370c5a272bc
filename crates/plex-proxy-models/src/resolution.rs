/// Canonical video quality tiers, best first. Labels outside this list
/// (fallbacks like "360p" or an uppercased raw token) sort after every
/// known label, alphabetically among themselves.
pub const CANONICAL_RESOLUTIONS: [&str; 9] = [
    "8K", "4K", "2160p", "1440p", "1080p", "720p", "576p", "480p", "SD",
];

/// Position of a label in the canonical order, or `None` for fallbacks.
pub fn resolution_rank(label: &str) -> Option<usize> {
    CANONICAL_RESOLUTIONS.iter().position(|known| *known == label)
}

/// Sort labels by canonical order, unknown labels last (alphabetical),
/// and drop duplicates.
pub fn sort_resolution_labels(mut labels: Vec<String>) -> Vec<String> {
    labels.sort_by(|a, b| {
        let rank_a = resolution_rank(a);
        let rank_b = resolution_rank(b);
        match (rank_a, rank_b) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    labels.dedup();
    labels
}
