use serde_json::Value;

/// Map a free-text resolution token ("1080", "4k", "sd", …) onto a
/// canonical label. Unrecognized numeric tokens become `"<n>p"`;
/// unrecognized text falls back to the uppercased raw token.
pub fn label_from_token(token: &str) -> String {
    let lowered = token.trim().to_lowercase();

    if lowered.contains("8k") {
        return "8K".to_string();
    }
    if lowered.contains("4k") {
        return "4K".to_string();
    }
    if lowered == "sd" {
        return "SD".to_string();
    }

    let stripped = lowered.strip_suffix('p').unwrap_or(&lowered);
    match stripped.parse::<u64>() {
        Ok(height) => bucket_by_height(height).unwrap_or_else(|| format!("{}p", height)),
        Err(_) => token.trim().to_uppercase(),
    }
}

/// Map a pixel-dimension pair onto a canonical label. Dimensions are
/// always numeric, so anything below the lowest threshold is simply SD.
pub fn label_from_dimensions(width: u64, height: u64) -> String {
    let characteristic = width.max(height);
    bucket_by_height(characteristic).unwrap_or_else(|| "SD".to_string())
}

fn bucket_by_height(size: u64) -> Option<String> {
    let label = match size {
        s if s >= 4320 => "8K",
        s if s >= 2160 => "4K",
        s if s >= 1440 => "1440p",
        s if s >= 1080 => "1080p",
        s if s >= 720 => "720p",
        s if s >= 576 => "576p",
        s if s >= 480 => "480p",
        _ => return None,
    };
    Some(label.to_string())
}

/// Collect resolution labels across every media variant of one raw item,
/// through both the text-token and the width/height path. The result may
/// contain duplicates; callers dedup when they sort.
pub fn labels_from_media(raw_item: &Value) -> Vec<String> {
    let mut labels = Vec::new();

    let Some(variants) = raw_item.get("Media").and_then(|m| m.as_array()) else {
        return labels;
    };

    for media in variants {
        if let Some(token) = media
            .get("videoResolution")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            labels.push(label_from_token(token));
        }

        let width = media.get("width").and_then(|v| v.as_u64()).unwrap_or(0);
        let height = media.get("height").and_then(|v| v.as_u64()).unwrap_or(0);
        if width > 0 || height > 0 {
            labels.push(label_from_dimensions(width, height));
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_tokens_map_to_canonical_labels() {
        assert_eq!(label_from_token("1080"), "1080p");
        assert_eq!(label_from_token("1080p"), "1080p");
        assert_eq!(label_from_token("1080P"), "1080p");
        assert_eq!(label_from_token("720"), "720p");
        assert_eq!(label_from_token("2160"), "4K");
        assert_eq!(label_from_token("4320"), "8K");
        assert_eq!(label_from_token("576"), "576p");
        assert_eq!(label_from_token("480"), "480p");
        assert_eq!(label_from_token("1440"), "1440p");
    }

    #[test]
    fn test_named_tokens() {
        assert_eq!(label_from_token("4k"), "4K");
        assert_eq!(label_from_token("4K"), "4K");
        assert_eq!(label_from_token("8k"), "8K");
        assert_eq!(label_from_token("sd"), "SD");
        assert_eq!(label_from_token("SD"), "SD");
    }

    #[test]
    fn test_small_numeric_tokens_get_p_suffix() {
        assert_eq!(label_from_token("360"), "360p");
        assert_eq!(label_from_token("240p"), "240p");
    }

    #[test]
    fn test_unrecognized_text_uppercases_the_raw_token() {
        assert_eq!(label_from_token("FHD"), "FHD");
        assert_eq!(label_from_token("hdtv"), "HDTV");
    }

    #[test]
    fn test_dimension_path() {
        assert_eq!(label_from_dimensions(1920, 1080), "1080p");
        assert_eq!(label_from_dimensions(3840, 2160), "4K");
        assert_eq!(label_from_dimensions(1080, 1920), "1080p");
        assert_eq!(label_from_dimensions(7680, 4320), "8K");
        assert_eq!(label_from_dimensions(640, 360), "SD");
        assert_eq!(label_from_dimensions(0, 0), "SD");
    }

    #[test]
    fn test_labels_from_media_scans_all_variants() {
        let raw = json!({
            "Media": [
                {"videoResolution": "4k", "width": 3840, "height": 2160},
                {"videoResolution": "1080", "width": 1920, "height": 1080}
            ]
        });

        let labels = labels_from_media(&raw);
        assert_eq!(labels, vec!["4K", "4K", "1080p", "1080p"]);
    }

    #[test]
    fn test_labels_from_media_without_media_array() {
        assert!(labels_from_media(&json!({"title": "x"})).is_empty());
    }

    #[test]
    fn test_labels_from_media_dimension_only_variant() {
        let raw = json!({"Media": [{"width": 1280, "height": 720}]});
        assert_eq!(labels_from_media(&raw), vec!["720p"]);
    }
}
