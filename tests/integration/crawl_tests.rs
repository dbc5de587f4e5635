//! Integration tests for collection sessions
//!
//! These tests use wiremock to serve watch pages and caption tracks and run
//! full sessions end-to-end through the coordinator. A few scenarios use
//! in-process fetchers to control the frontier precisely.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use vidcollector::config::{parse_config, Config};
use vidcollector::crawler::{ContentFetcher, Coordinator};
use vidcollector::ingest::{read_mapping, SubtitleFetcher};
use vidcollector::models::{CaptionKind, FetchedCaption, PageMetadata};
use vidcollector::output::{export, ExportFormat, ExportTable};
use vidcollector::storage::{lock_store, share, SessionStatus, SqliteStore, Store};
use vidcollector::{FetchError, FetchResult, RelatedCandidate};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VTT: &str = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nسلام دوستان\n\n00:00:02.000 --> 00:00:04.000\nبه کانال ما خوش آمدید\n";

/// Creates a test configuration pointing at `base_url`
fn create_test_config(base_url: &str, dir: &Path, max_items: usize, per_seed: bool) -> Config {
    let toml = format!(
        r#"
[crawler]
max-items = {max_items}
max-queue-size = 50
rate-limit-delay = 0
per-seed = {per_seed}

[classifier]
use-detector = false

[ingest]
concurrency = 2
caption-languages = ["fa", "en"]

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[source]
base-url = "{base_url}"
request-timeout = 5

[output]
database-path = "{dir}/collector.db"
mapping-path = "{dir}/mapping.txt"
download-dir = "{dir}/downloads"
"#,
        dir = dir.display()
    );
    parse_config(&toml).expect("test config is valid")
}

/// Renders a watch page with related links
fn watch_page(title: &str, related: &[(&str, &str)]) -> String {
    let links: String = related
        .iter()
        .map(|(id, title)| format!(r#"<a href="/watch?v={}" title="{}">thumb</a>"#, id, title))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"<html><head><title>{}</title>
        <meta name="description" content="">
        <link itemprop="name" content="کانال تست"></head>
        <body>{}</body></html>"#,
        title, links
    )
}

async fn mount_page(server: &MockServer, id: &str, html: String) {
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_farsi_captions(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .and(query_param("v", id))
        .and(query_param("lang", "fa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VTT))
        .mount(server)
        .await;
}

async fn mount_missing_captions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

fn seed(base_url: &str, id: &str) -> String {
    format!("{}/watch?v={}", base_url, id)
}

#[tokio::test]
async fn test_full_session_single_seed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "aaaaaaaaaaa",
        watch_page(
            "آموزش آشپزی ایرانی",
            &[("bbbbbbbbbbb", "قسمت دوم آشپزی"), ("ccccccccccc", "English cooking")],
        ),
    )
    .await;
    mount_page(&mock_server, "bbbbbbbbbbb", watch_page("قسمت دوم آشپزی", &[])).await;

    // Rejected by the pre-filter, never fetched
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", "ccccccccccc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_farsi_captions(&mock_server, "aaaaaaaaaaa").await;
    mount_farsi_captions(&mock_server, "bbbbbbbbbbb").await;
    mount_missing_captions(&mock_server).await;

    let config = create_test_config(&base_url, dir.path(), 10, false);
    let coordinator =
        Coordinator::new(config, "test_hash".to_string()).expect("Failed to create coordinator");
    let summary = coordinator
        .run(&[seed(&base_url, "aaaaaaaaaaa")])
        .await
        .expect("Session failed");

    let stats = summary.stats;
    assert!(!summary.timed_out);
    assert_eq!(stats.found, 2);
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.downloaded, 2);
    // Manual and automatic Farsi tracks for both items
    assert_eq!(stats.subtitles_extracted, 4);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.steps, 2);

    let store = SqliteStore::new(&dir.path().join("collector.db")).expect("Failed to open DB");
    assert_eq!(store.count_items().unwrap(), 2);
    assert_eq!(store.count_captions_by_language("fa").unwrap(), 4);

    let session = store.get_latest_session().unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.config_hash, "test_hash");
    assert_eq!(session.found, 2);

    let records = read_mapping(&dir.path().join("mapping.txt")).unwrap();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(record.artifact.is_some());
        assert!(record.primary_caption.is_some());
        assert!(record.secondary_caption.is_none());
    }

    let caption_file = dir
        .path()
        .join("downloads")
        .join("aaaaaaaaaaa.fa.manual.txt");
    let text = std::fs::read_to_string(caption_file).unwrap();
    assert_eq!(text, "سلام دوستان\nبه کانال ما خوش آمدید");
}

#[tokio::test]
async fn test_second_session_skips_stored_items() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "aaaaaaaaaaa",
        watch_page("ویدیو اول", &[("bbbbbbbbbbb", "ویدیو دوم")]),
    )
    .await;
    mount_page(&mock_server, "bbbbbbbbbbb", watch_page("ویدیو دوم", &[])).await;
    mount_missing_captions(&mock_server).await;

    let seeds = [seed(&base_url, "aaaaaaaaaaa")];

    let first = Coordinator::new(
        create_test_config(&base_url, dir.path(), 10, false),
        "test_hash".to_string(),
    )
    .unwrap()
    .run(&seeds)
    .await
    .unwrap();

    let second = Coordinator::new(
        create_test_config(&base_url, dir.path(), 10, false),
        "test_hash".to_string(),
    )
    .unwrap()
    .run(&seeds)
    .await
    .unwrap();

    assert_eq!(first.stats.skipped_existing, 0);
    assert_eq!(second.stats.skipped_existing, first.stats.found);
    assert_eq!(second.stats.downloaded, 0);
    assert!(second.session_id > first.session_id);

    // Only the first session wrote mapping lines
    let records = read_mapping(&dir.path().join("mapping.txt")).unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_failed_seed_does_not_abort_session() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", "aaaaaaaaaaa"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "bbbbbbbbbbb", watch_page("ویدیو دوم", &[])).await;
    mount_page(&mock_server, "ccccccccccc", watch_page("ویدیو سوم", &[])).await;
    mount_missing_captions(&mock_server).await;

    let coordinator = Coordinator::new(
        create_test_config(&base_url, dir.path(), 10, false),
        "test_hash".to_string(),
    )
    .unwrap();
    let summary = coordinator
        .run(&[
            seed(&base_url, "aaaaaaaaaaa"),
            seed(&base_url, "bbbbbbbbbbb"),
            seed(&base_url, "ccccccccccc"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.processed, 2);
    assert_eq!(summary.stats.steps, 3);
}

#[tokio::test]
async fn test_export_after_session() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "aaaaaaaaaaa", watch_page("ویدیو فارسی", &[])).await;
    mount_farsi_captions(&mock_server, "aaaaaaaaaaa").await;
    mount_missing_captions(&mock_server).await;

    let coordinator = Coordinator::new(
        create_test_config(&base_url, dir.path(), 10, false),
        "test_hash".to_string(),
    )
    .unwrap();
    coordinator
        .run(&[seed(&base_url, "aaaaaaaaaaa")])
        .await
        .unwrap();

    let export_path = dir.path().join("export.json");
    let guard = lock_store(coordinator.store()).unwrap();
    let summary = export(&*guard, ExportFormat::Json, ExportTable::All, &export_path).unwrap();
    drop(guard);

    assert_eq!(summary.items, 1);
    assert_eq!(summary.captions, 2);

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(value["items"][0]["title"], "ویدیو فارسی");
    assert_eq!(value["items"][0]["channel"], "کانال تست");
}

// ===== In-process fetchers =====

/// Serves canned pages and records every fetch
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, PageMetadata>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn with_page(mut self, id: &str, title: &str, related: &[&str]) -> Self {
        self.pages.insert(
            id.to_string(),
            PageMetadata {
                id: id.to_string(),
                url: fake_locator(id),
                title: title.to_string(),
                related: related
                    .iter()
                    .map(|rid| RelatedCandidate {
                        id: rid.to_string(),
                        locator: fake_locator(rid),
                        title: "ویدیو مرتبط".to_string(),
                        channel: String::new(),
                    })
                    .collect(),
                ..Default::default()
            },
        );
        self
    }

    fn fetch_count(&self, id: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|fetched| fetched.as_str() == id)
            .count()
    }
}

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn fetch(&self, locator: &str) -> FetchResult<PageMetadata> {
        let id = vidcollector::extract_video_id(locator)
            .ok_or_else(|| FetchError::InvalidLocator(locator.to_string()))?;
        self.fetched.lock().unwrap().push(id.clone());
        self.pages.get(&id).cloned().ok_or(FetchError::Status {
            url: locator.to_string(),
            status: 404,
        })
    }
}

/// Returns one automatic English track with a Farsi line
struct FakeSubtitles;

#[async_trait]
impl SubtitleFetcher for FakeSubtitles {
    async fn fetch_captions(
        &self,
        _content_id: &str,
        _languages: &[String],
    ) -> FetchResult<Vec<FetchedCaption>> {
        Ok(vec![FetchedCaption {
            language: "en".to_string(),
            kind: CaptionKind::Automatic,
            text: "welcome\nسلام دوستان".to_string(),
        }])
    }
}

fn fake_locator(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

fn fake_coordinator(fetcher: Arc<FakeFetcher>, config: Config) -> Coordinator {
    Coordinator::with_components(
        config,
        "test_hash".to_string(),
        share(SqliteStore::in_memory().unwrap()),
        fetcher,
        Arc::new(FakeSubtitles),
    )
}

#[tokio::test]
async fn test_max_items_stops_session() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(
        FakeFetcher::default()
            .with_page(
                "seed0000000",
                "ویدیو اصلی",
                &["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc", "ddddddddddd", "eeeeeeeeeee"],
            )
            .with_page("aaaaaaaaaaa", "ویدیو یک", &[])
            .with_page("bbbbbbbbbbb", "ویدیو دو", &[])
            .with_page("ccccccccccc", "ویدیو سه", &[]),
    );
    let config = create_test_config("https://www.youtube.com", dir.path(), 2, false);
    let coordinator = fake_coordinator(fetcher.clone(), config);

    let summary = coordinator.run(&[fake_locator("seed0000000")]).await.unwrap();

    assert_eq!(summary.stats.found, 2);
    assert_eq!(summary.stats.processed, 2);
    assert_eq!(summary.stats.steps, 2);
    assert_eq!(fetcher.fetch_count("bbbbbbbbbbb"), 0);
    assert_eq!(
        lock_store(coordinator.store()).unwrap().count_items().unwrap(),
        2
    );
}

#[tokio::test]
async fn test_inferred_captions_are_stored() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::default().with_page("aaaaaaaaaaa", "ویدیو یک", &[]));
    let config = create_test_config("https://www.youtube.com", dir.path(), 5, false);
    let coordinator = fake_coordinator(fetcher, config);

    let summary = coordinator.run(&[fake_locator("aaaaaaaaaaa")]).await.unwrap();

    assert_eq!(summary.stats.subtitles_extracted, 2);
    let captions = lock_store(coordinator.store()).unwrap().list_captions().unwrap();
    let inferred = captions
        .iter()
        .find(|c| c.kind == CaptionKind::Inferred)
        .expect("inferred track stored");
    assert_eq!(inferred.language, "fa");
    assert_eq!(inferred.text, "سلام دوستان");
}

#[tokio::test]
async fn test_per_seed_crawlers_share_store() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(
        FakeFetcher::default()
            .with_page("aaaaaaaaaaa", "ویدیو یک", &["ccccccccccc"])
            .with_page("bbbbbbbbbbb", "ویدیو دو", &["ccccccccccc"])
            .with_page("ccccccccccc", "ویدیو سه", &[]),
    );
    let config = create_test_config("https://www.youtube.com", dir.path(), 10, true);
    let coordinator = fake_coordinator(fetcher.clone(), config);

    let summary = coordinator
        .run(&[fake_locator("aaaaaaaaaaa"), fake_locator("bbbbbbbbbbb")])
        .await
        .unwrap();

    // Each crawler has its own frontier, so the shared candidate is found twice
    assert_eq!(fetcher.fetch_count("ccccccccccc"), 2);
    assert_eq!(summary.stats.found, 4);
    assert_eq!(summary.stats.skipped_existing, 1);
    assert_eq!(
        lock_store(coordinator.store()).unwrap().count_items().unwrap(),
        3
    );
}

#[tokio::test]
async fn test_resume_captions_after_metadata_only_session() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(
        FakeFetcher::default()
            .with_page("aaaaaaaaaaa", "ویدیو یک", &["bbbbbbbbbbb"])
            .with_page("bbbbbbbbbbb", "ویدیو دو", &[]),
    );
    let mut config = create_test_config("https://www.youtube.com", dir.path(), 10, false);
    config.ingest.download_content = false;
    let coordinator = fake_coordinator(fetcher, config);

    let first = coordinator.run(&[fake_locator("aaaaaaaaaaa")]).await.unwrap();
    assert_eq!(first.stats.subtitles_extracted, 0);

    let resumed = coordinator.resume_captions(10).await;

    assert_eq!(resumed.processed, 2);
    assert_eq!(resumed.downloaded, 2);
    assert_eq!(resumed.subtitles_extracted, 4);
    assert!(lock_store(coordinator.store())
        .unwrap()
        .items_missing_caption("fa")
        .unwrap()
        .is_empty());
}
