use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::types::CuratedEntry;

/// SEC-014: Maximum curated list size (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Reads the curated list from disk.
///
/// The file is re-read on every call; nothing is cached between builds.
///
/// # Errors
///
/// Returns an error if the file is missing, too large, not JSON, or not a
/// JSON array. Individual malformed entries are skipped, not fatal.
pub async fn load_curated(path: &Path) -> Result<Vec<CuratedEntry>> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read curated list: {}", path.display()))?;
    if meta.len() > MAX_FILE_SIZE {
        bail!(
            "Curated list is {} bytes (max {} bytes): {}",
            meta.len(),
            MAX_FILE_SIZE,
            path.display()
        );
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read curated list: {}", path.display()))?;
    parse_curated(&content).with_context(|| format!("Invalid curated list: {}", path.display()))
}

/// Parses curated list JSON.
///
/// Expects an array of `{uuid, sensitive?, notes?}` objects. Elements that
/// fail to deserialize or have a blank `uuid` are dropped with a warning.
pub fn parse_curated(content: &str) -> Result<Vec<CuratedEntry>> {
    let value: Value = serde_json::from_str(content).context("Curated list is not valid JSON")?;
    let Value::Array(items) = value else {
        bail!("Expected the curated list to contain an array");
    };

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<CuratedEntry>(item) {
            Ok(mut entry) => {
                entry.uuid = entry.uuid.trim().to_owned();
                if entry.uuid.is_empty() {
                    tracing::warn!(index = index, "Curated entry has a blank uuid, skipping");
                    continue;
                }
                entries.push(entry);
            }
            Err(e) => {
                tracing::warn!(index = index, error = %e, "Malformed curated entry, skipping");
            }
        }
    }

    Ok(entries)
}

/// Splits a comma-separated identifier allow-list.
///
/// Blank items are ignored and duplicates keep their first position.
pub fn parse_allow_list(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_owned());
        }
    }
    ids
}

/// Reorders and restricts the curated list to the allow-list.
///
/// The result follows the allow-list order. Identifiers missing from the
/// curated data get a non-sensitive placeholder entry; curated entries not in
/// the allow-list are dropped. An empty allow-list leaves the list unchanged.
pub fn apply_allow_list(entries: Vec<CuratedEntry>, allow_list: &[String]) -> Vec<CuratedEntry> {
    if allow_list.is_empty() {
        return entries;
    }

    let mut by_uuid: HashMap<String, CuratedEntry> = HashMap::with_capacity(entries.len());
    for entry in entries {
        by_uuid.entry(entry.uuid.clone()).or_insert(entry);
    }

    allow_list
        .iter()
        .map(|uuid| {
            by_uuid.remove(uuid).unwrap_or_else(|| {
                tracing::debug!(uuid = %uuid, "Allow-listed id not in curated list, using placeholder");
                CuratedEntry::placeholder(uuid.as_str())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn uuids(entries: &[CuratedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.uuid.as_str()).collect()
    }

    #[test]
    fn test_parse_curated_list() {
        let entries = parse_curated(
            r#"[
                {"uuid": "A", "sensitive": true, "notes": "<b>Pick</b>"},
                {"uuid": "B"}
            ]"#,
        )
        .unwrap();
        assert_eq!(uuids(&entries), vec!["A", "B"]);
        assert!(entries[0].sensitive);
        assert!(!entries[1].sensitive);
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let entries =
            parse_curated(r#"[{"uuid": "A"}, {"sensitive": true}, 42, {"uuid": "  "}, {"uuid": "B"}]"#)
                .unwrap();
        assert_eq!(uuids(&entries), vec!["A", "B"]);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_curated(r#"{"uuid": "A"}"#).is_err());
        assert!(parse_curated("not json").is_err());
    }

    #[test]
    fn test_parse_allow_list() {
        assert_eq!(parse_allow_list(" C, A ,,C"), vec!["C", "A"]);
        assert!(parse_allow_list("").is_empty());
        assert!(parse_allow_list(" , ").is_empty());
    }

    #[test]
    fn test_allow_list_reorders_and_filters() {
        let entries = vec![
            CuratedEntry::placeholder("A"),
            CuratedEntry::placeholder("B"),
            CuratedEntry::placeholder("C"),
        ];
        let result = apply_allow_list(entries, &["C".to_string(), "A".to_string()]);
        assert_eq!(uuids(&result), vec!["C", "A"]);
    }

    #[test]
    fn test_allow_list_synthesizes_missing_entries() {
        let mut sensitive = CuratedEntry::placeholder("A");
        sensitive.sensitive = true;
        let result = apply_allow_list(vec![sensitive], &["Z".to_string(), "A".to_string()]);

        assert_eq!(uuids(&result), vec!["Z", "A"]);
        assert!(!result[0].sensitive);
        // Curated overrides survive reordering
        assert!(result[1].sensitive);
    }

    #[test]
    fn test_empty_allow_list_is_noop() {
        let entries = vec![CuratedEntry::placeholder("A"), CuratedEntry::placeholder("B")];
        assert_eq!(apply_allow_list(entries.clone(), &[]), entries);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        let result = load_curated(Path::new("/tmp/podcast_gallery_no_such_list.json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = std::env::temp_dir().join("podcast_gallery_curated_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("podcasts.json");
        std::fs::write(&path, r#"[{"uuid": "A"}]"#).unwrap();

        let entries = load_curated(&path).await.unwrap();
        assert_eq!(uuids(&entries), vec!["A"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
