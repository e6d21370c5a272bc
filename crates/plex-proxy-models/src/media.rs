use serde::{Deserialize, Serialize};

/// The two library item kinds this proxy surfaces. Other Plex types
/// (photos, music, collections) are filtered out upstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn from_plex_type(raw: &str) -> Option<Self> {
        match raw {
            "movie" => Some(MediaKind::Movie),
            "show" => Some(MediaKind::Show),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }

    /// The TMDb namespace that corresponds to this kind ("movie" or "tv").
    pub fn tmdb_type(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "tv",
        }
    }
}
