//! Catalog metadata audit.
//!
//! Fetches every curated entry one at a time and records whether the catalog
//! answered, what it answered with, and whether the entry changed upstream
//! since it was last synced. The report is written as pretty JSON to
//! `{dir}/metadata-audit-{timestamp}.json`.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, ApiError, Payload};
use crate::gallery::{CuratedEntry, PodcastMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// Catalog answered with a 2xx
    Success,
    /// Catalog answered with a non-2xx status
    Error,
    /// No answer: timeout, network or configuration failure
    Failed,
}

impl AuditStatus {
    fn icon(self) -> &'static str {
        match self {
            AuditStatus::Success => "✓",
            AuditStatus::Error => "⚠",
            AuditStatus::Failed => "✗",
        }
    }
}

/// Audit result for one curated entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub uuid: String,
    pub sensitive: bool,
    pub fetched_at: String,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Catalog `updated_at` differs from the curated `last_synced_at`;
    /// `None` unless both are known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub generated_at: String,
    pub results: Vec<AuditRecord>,
}

/// Audits `entries` and writes the report into `dir`.
///
/// Returns the report path, or `None` when there was nothing to audit.
pub async fn run_audit(
    client: &ApiClient,
    entries: &[CuratedEntry],
    dir: &Path,
) -> Result<Option<PathBuf>> {
    if entries.is_empty() {
        tracing::info!("No podcasts configured; audit skipped");
        return Ok(None);
    }

    tracing::info!(count = entries.len(), "Auditing curated podcasts");
    let report = audit_entries(client, entries).await;
    let path = write_report(&report, dir).await?;
    Ok(Some(path))
}

/// Fetches each entry sequentially and collects the records.
pub async fn audit_entries(client: &ApiClient, entries: &[CuratedEntry]) -> AuditReport {
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let record = audit_entry(client, entry).await;
        tracing::info!(
            uuid = %record.uuid,
            status = ?record.status,
            "{} {}",
            record.status.icon(),
            record.uuid
        );
        results.push(record);
    }

    AuditReport {
        generated_at: timestamp(),
        results,
    }
}

async fn audit_entry(client: &ApiClient, entry: &CuratedEntry) -> AuditRecord {
    let mut record = AuditRecord {
        uuid: entry.uuid.clone(),
        sensitive: entry.sensitive,
        fetched_at: timestamp(),
        status: AuditStatus::Failed,
        status_code: None,
        title: None,
        updated_at: None,
        delta_detected: None,
        error: None,
    };

    match client.fetch_one(&entry.uuid).await {
        Ok(payload) => {
            let meta = PodcastMetadata::from_payload(&entry.uuid, &payload);
            record.status = AuditStatus::Success;
            if payload == Payload::Empty {
                record.status_code = Some(204);
            }
            record.delta_detected = match (&meta.updated_at, &entry.last_synced_at) {
                (Some(updated), Some(synced)) => Some(updated != synced),
                _ => None,
            };
            record.title = meta.title;
            record.updated_at = meta.updated_at;
        }
        Err(ApiError::Status { status, detail }) => {
            record.status = AuditStatus::Error;
            record.status_code = Some(status);
            record.error = Some(match detail {
                Some(Payload::Json(value)) => value.to_string(),
                Some(Payload::Text(text)) => text,
                Some(Payload::Empty) | None => format!("HTTP {status}"),
            });
        }
        Err(e) => {
            record.error = Some(e.to_string());
        }
    }

    record
}

/// Writes `report` as pretty JSON into `dir`, creating it if needed.
pub async fn write_report(report: &AuditReport, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create audit directory: {}", dir.display()))?;

    let path = dir.join(report_file_name(&report.generated_at));
    let json = serde_json::to_string_pretty(report).context("Failed to serialize audit report")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write audit report: {}", path.display()))?;

    tracing::info!(path = %path.display(), "Audit results saved");
    Ok(path)
}

/// `metadata-audit-{timestamp}.json`, with colons made filename-safe.
pub fn report_file_name(generated_at: &str) -> String {
    format!("metadata-audit-{}.json", generated_at.replace(':', "-"))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url: Some(base.to_string()),
            max_attempts: 1,
            retry_backoff: Duration::ZERO,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    fn entry(uuid: &str, last_synced_at: Option<&str>) -> CuratedEntry {
        CuratedEntry {
            last_synced_at: last_synced_at.map(str::to_owned),
            ..CuratedEntry::placeholder(uuid)
        }
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name("2024-05-01T12:30:45.123Z"),
            "metadata-audit-2024-05-01T12-30-45.123Z.json"
        );
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = AuditRecord {
            uuid: "a".into(),
            sensitive: true,
            fetched_at: "2024-05-01T00:00:00.000Z".into(),
            status: AuditStatus::Error,
            status_code: Some(404),
            title: None,
            updated_at: None,
            delta_detected: None,
            error: Some("not found".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fetchedAt"], "2024-05-01T00:00:00.000Z");
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["status"], "error");
        assert!(json.get("title").is_none());
    }

    #[tokio::test]
    async fn test_audit_records_each_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/podcast/episode/fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Fresh", "updated_at": "2024-06-01"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/podcast/episode/same"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Same", "updated_at": "2024-01-01"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/podcast/episode/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let entries = vec![
            entry("fresh", Some("2024-01-01")),
            entry("same", Some("2024-01-01")),
            entry("gone", None),
        ];
        let report = audit_entries(&client(&server.uri()), &entries).await;

        assert_eq!(report.results.len(), 3);
        let fresh = &report.results[0];
        assert_eq!(fresh.status, AuditStatus::Success);
        assert_eq!(fresh.title.as_deref(), Some("Fresh"));
        assert_eq!(fresh.delta_detected, Some(true));

        assert_eq!(report.results[1].delta_detected, Some(false));

        let gone = &report.results[2];
        assert_eq!(gone.status, AuditStatus::Error);
        assert_eq!(gone.status_code, Some(404));
        assert_eq!(gone.error.as_deref(), Some("missing"));
        assert_eq!(gone.delta_detected, None);
    }

    #[tokio::test]
    async fn test_unconfigured_client_marks_failed() {
        let client = ApiClient::new(ApiConfig::default()).unwrap();
        let report = audit_entries(&client, &[entry("a", None)]).await;
        let record = &report.results[0];
        assert_eq!(record.status, AuditStatus::Failed);
        assert!(record.status_code.is_none());
        assert!(record.error.as_deref().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_empty_list_skips_audit() {
        let dir = std::env::temp_dir().join("podcast_gallery_audit_empty");
        std::fs::remove_dir_all(&dir).ok();

        let client = ApiClient::new(ApiConfig::default()).unwrap();
        assert_eq!(run_audit(&client, &[], &dir).await.unwrap(), None);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_report_written_to_disk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join("podcast_gallery_audit_write");
        std::fs::remove_dir_all(&dir).ok();

        let path = run_audit(&client(&server.uri()), &[entry("a", None)], &dir)
            .await
            .unwrap()
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("metadata-audit-"));
        assert!(!name.contains(':'));

        let report: AuditReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].status, AuditStatus::Success);
        assert_eq!(report.results[0].status_code, Some(204));

        std::fs::remove_dir_all(&dir).ok();
    }
}
