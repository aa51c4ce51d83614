//! End-to-end gallery builds: curated list on disk, catalog behind wiremock,
//! cards rendered into the default HTML page.
//!
//! Each test writes its own curated list under the temp directory and starts
//! its own mock server.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use podcast_gallery::api::{ApiClient, ApiConfig};
use podcast_gallery::gallery::{Bootstrap, GalleryStatus, StatusKind};
use podcast_gallery::render::{HtmlPage, RenderError, Surface};

fn curated_list(name: &str, json: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("podcast_gallery_it_build")
        .join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("podcasts.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig {
        base_url: Some(server.uri()),
        timeout: Duration::from_millis(500),
        retry_backoff: Duration::ZERO,
        ..ApiConfig::default()
    })
    .unwrap()
}

async fn mount_podcast(server: &MockServer, uuid: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/podcast/episode/{uuid}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Successful and Partial Builds
// ============================================================================

#[tokio::test]
async fn test_build_renders_cards_in_curated_order() {
    let server = MockServer::start().await;
    mount_podcast(
        &server,
        "b",
        json!({"title": "Second", "description": "<p>Talk &amp; news</p>",
               "cover": "https://cdn.example.com/b.jpg"}),
    )
    .await;
    mount_podcast(
        &server,
        "a",
        json!({"title": "First", "official_site": "https://first.example.com"}),
    )
    .await;

    let list = curated_list(
        "order",
        r#"[{"uuid": "b", "notes": "Weekly <em>favourite</em>"}, {"uuid": "a", "sensitive": true}]"#,
    );
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap();

    assert_eq!(state.status(), GalleryStatus::Ready);
    assert_eq!(state.message().body, "Loaded 2 podcasts.");

    let html = page.to_html();
    let second = html.find(r#"data-uuid="b""#).unwrap();
    let first = html.find(r#"data-uuid="a""#).unwrap();
    assert!(second < first, "cards should follow curated order");

    assert!(html.contains("Talk &amp; news"));
    assert!(html.contains("Weekly favourite"));
    assert!(html.contains(r#"href="https://first.example.com/""#));
    assert!(html.contains("Reveal cover"));
    assert!(html.contains(r#"data-state="ready""#));
    assert!(!html.contains("{{gallery}}"));
}

#[tokio::test]
async fn test_partial_failure_renders_successful_subset() {
    let server = MockServer::start().await;
    mount_podcast(&server, "ok-1", json!({"title": "One"})).await;
    mount_podcast(&server, "ok-2", json!({"title": "Two"})).await;
    Mock::given(method("GET"))
        .and(path("/podcast/episode/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let list = curated_list(
        "partial",
        r#"[{"uuid": "ok-1"}, {"uuid": "missing"}, {"uuid": "ok-2"}]"#,
    );
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap();

    assert_eq!(state.status(), GalleryStatus::Ready);
    assert_eq!(state.podcasts().len(), 2);
    assert_eq!(state.message().kind, StatusKind::Warning);
    assert_eq!(
        state.message().body,
        "Loaded 2 of 3 podcasts; 1 could not be fetched."
    );

    let html = page.to_html();
    assert_eq!(html.matches("data-uuid=").count(), 2);
    assert!(html.contains("status--warning"));
}

#[tokio::test]
async fn test_transient_error_is_retried_within_build() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/podcast/episode/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_podcast(&server, "flaky", json!({"title": "Eventually"})).await;

    let list = curated_list("retry", r#"[{"uuid": "flaky"}]"#);
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap();

    assert_eq!(state.status(), GalleryStatus::Ready);
    assert!(page.to_html().contains("Eventually"));
}

#[tokio::test]
async fn test_allow_list_restricts_requests() {
    let server = MockServer::start().await;
    mount_podcast(&server, "keep", json!({"title": "Kept"})).await;
    Mock::given(method("GET"))
        .and(path("/podcast/episode/drop"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let list = curated_list("allow", r#"[{"uuid": "drop"}, {"uuid": "keep"}]"#);
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client(&server))
        .with_allow_list(vec!["keep".into()])
        .run(&mut page)
        .await
        .unwrap();

    assert_eq!(state.podcasts().len(), 1);
    assert_eq!(state.podcasts()[0].title.as_deref(), Some("Kept"));
}

#[tokio::test]
async fn test_token_sent_on_gallery_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/podcast/episode/private"))
        .and(header("authorization", "Bearer build-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Private"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(ApiConfig {
        base_url: Some(server.uri()),
        token: Some("build-token".to_string().into()),
        retry_backoff: Duration::ZERO,
        ..ApiConfig::default()
    })
    .unwrap();

    let list = curated_list("token", r#"[{"uuid": "private"}]"#);
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client).run(&mut page).await.unwrap();
    assert_eq!(state.status(), GalleryStatus::Ready);
}

// ============================================================================
// Failure Modes
// ============================================================================

#[tokio::test]
async fn test_total_failure_shows_error_and_no_cards() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let list = curated_list("total", r#"[{"uuid": "x"}, {"uuid": "y"}]"#);
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap();

    assert_eq!(state.status(), GalleryStatus::Error);
    assert_eq!(state.message().title, "NeoDB is unavailable");
    let html = page.to_html();
    assert!(!html.contains("data-uuid="));
    assert!(html.contains(r#"data-state="error""#));
}

#[tokio::test]
async fn test_unconfigured_client_degrades_to_error_state() {
    let list = curated_list("unconfigured", r#"[{"uuid": "a"}]"#);
    let client = ApiClient::new(ApiConfig::default()).unwrap();
    let mut page = HtmlPage::with_default_template();

    let state = Bootstrap::new(&list, client).run(&mut page).await.unwrap();

    assert_eq!(state.status(), GalleryStatus::Error);
    assert_eq!(state.message().title, "Unable to load podcasts");
    assert!(state.message().body.contains("NEODB_API_BASE"));
}

#[tokio::test]
async fn test_empty_curated_list_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let list = curated_list("empty", "[]");
    let mut page = HtmlPage::with_default_template();
    let state = Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap();

    assert_eq!(state.status(), GalleryStatus::Empty);
    assert!(page.to_html().contains("No podcasts to show"));
}

#[tokio::test]
async fn test_template_without_card_template_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let list = curated_list("no_template", r#"[{"uuid": "a"}]"#);
    let mut page = HtmlPage::new("<main>{{status}}<div>{{gallery}}</div></main>");
    assert!(!page.has_region(podcast_gallery::render::Region::CardTemplate));

    let err = Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingRegion(_)));
}

#[tokio::test]
async fn test_page_written_to_output_dir() {
    let server = MockServer::start().await;
    mount_podcast(&server, "a", json!({"title": "Written"})).await;

    let list = curated_list("write", r#"[{"uuid": "a"}]"#);
    let out_dir = std::env::temp_dir().join("podcast_gallery_it_build_out");
    std::fs::remove_dir_all(&out_dir).ok();

    let mut page = HtmlPage::with_default_template();
    Bootstrap::new(&list, client(&server))
        .run(&mut page)
        .await
        .unwrap();
    let index = out_dir.join("index.html");
    page.write_to(&index).await.unwrap();

    let html = std::fs::read_to_string(&index).unwrap();
    assert!(html.contains("Written"));
    assert!(!out_dir.join("index.html.tmp").exists());

    std::fs::remove_dir_all(&out_dir).ok();
}
