use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiError, Payload};

// ============================================================================
// Curated List
// ============================================================================

/// One operator-maintained entry of the curated list.
///
/// Deserialized leniently: only `uuid` is required, `sensitive` defaults to
/// `false`, unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CuratedEntry {
    /// Opaque catalog identifier
    pub uuid: String,
    /// Hide the cover until the visitor reveals it
    #[serde(default)]
    pub sensitive: bool,
    /// Free-text notes shown under the description (may contain markup)
    #[serde(default)]
    pub notes: Option<String>,
    /// Catalog `updated_at` value recorded at the last manual sync
    #[serde(default)]
    pub last_synced_at: Option<String>,
}

impl CuratedEntry {
    /// Placeholder entry for an allow-listed identifier missing from the curated data.
    pub fn placeholder(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            sensitive: false,
            notes: None,
            last_synced_at: None,
        }
    }
}

// ============================================================================
// Catalog Metadata
// ============================================================================

/// Catalog fields consumed by the gallery.
///
/// Every field is optional. [`PodcastMetadata::from_value`] never fails:
/// missing, empty or non-string fields become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PodcastMetadata {
    pub uuid: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub official_site: Option<String>,
    pub updated_at: Option<String>,
}

/// Cover fields in priority order; the first present one wins.
const COVER_FIELDS: [&str; 3] = ["cover_image_url", "cover", "image"];

impl PodcastMetadata {
    /// Builds metadata from an untrusted catalog JSON value.
    pub fn from_value(uuid: &str, value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Self {
            uuid: uuid.to_owned(),
            title: field("title"),
            description: field("description"),
            cover: COVER_FIELDS.iter().find_map(|name| field(*name)),
            official_site: field("official_site"),
            updated_at: field("updated_at"),
        }
    }

    /// Converts a raw API payload into metadata.
    ///
    /// Only JSON objects carry fields; an empty (204) or text body yields
    /// metadata with every field unset, which renders with fallbacks.
    pub fn from_payload(uuid: &str, payload: &Payload) -> Self {
        match payload {
            Payload::Json(value) => Self::from_value(uuid, value),
            Payload::Empty | Payload::Text(_) => {
                tracing::debug!(uuid = %uuid, "Catalog returned no JSON body, using defaults");
                Self {
                    uuid: uuid.to_owned(),
                    ..Self::default()
                }
            }
        }
    }
}

// ============================================================================
// Fetch Outcomes
// ============================================================================

/// Result of fetching one curated identifier.
///
/// Correlated by `uuid`, never by completion order.
#[derive(Debug)]
pub enum FetchOutcome {
    Fulfilled { uuid: String, data: PodcastMetadata },
    Rejected { uuid: String, error: ApiError },
}

impl FetchOutcome {
    pub fn uuid(&self) -> &str {
        match self {
            FetchOutcome::Fulfilled { uuid, .. } | FetchOutcome::Rejected { uuid, .. } => uuid,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, FetchOutcome::Fulfilled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_curated_entry_defaults() {
        let entry: CuratedEntry = serde_json::from_str(r#"{"uuid": "abc"}"#).unwrap();
        assert_eq!(entry, CuratedEntry::placeholder("abc"));
    }

    #[test]
    fn test_curated_entry_ignores_unknown_keys() {
        let entry: CuratedEntry =
            serde_json::from_str(r#"{"uuid": "abc", "sensitive": true, "color": "red"}"#).unwrap();
        assert!(entry.sensitive);
    }

    #[test]
    fn test_metadata_cover_priority() {
        let value = json!({
            "title": "Show",
            "image": "https://cdn.example.com/image.jpg",
            "cover": "https://cdn.example.com/cover.jpg"
        });
        let meta = PodcastMetadata::from_value("u1", &value);
        assert_eq!(meta.cover.as_deref(), Some("https://cdn.example.com/cover.jpg"));

        let value = json!({ "cover_image_url": "https://cdn.example.com/a.jpg", "cover": "b" });
        let meta = PodcastMetadata::from_value("u1", &value);
        assert_eq!(meta.cover.as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_metadata_malformed_fields_degrade() {
        let value = json!({ "title": 42, "description": null, "cover": "", "official_site": ["x"] });
        let meta = PodcastMetadata::from_value("u1", &value);
        assert_eq!(
            meta,
            PodcastMetadata {
                uuid: "u1".into(),
                ..PodcastMetadata::default()
            }
        );
    }

    #[test]
    fn test_metadata_from_non_object() {
        let meta = PodcastMetadata::from_value("u1", &json!("just a string"));
        assert!(meta.title.is_none());
    }

    #[test]
    fn test_metadata_from_empty_payload() {
        let meta = PodcastMetadata::from_payload("u1", &Payload::Empty);
        assert_eq!(meta.uuid, "u1");
        assert!(meta.title.is_none());
    }
}
