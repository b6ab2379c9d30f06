//! Integration tests for full collection runs
//!
//! These tests use wiremock to stand in for every source group and run the
//! complete pipeline: job construction, dispatch, persistence, archiving and
//! the report file.

use global_harvester::collector::CollectionRun;
use global_harvester::config::{parse_config, Config};
use global_harvester::storage::is_archive_file;
use global_harvester::HarvestError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
  <title>World News</title>
  <item>
    <title>Markets rally</title>
    <description>Stocks closed higher.</description>
    <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
    <link>https://news.example/markets</link>
    <dc:creator>Jane Reporter</dc:creator>
  </item>
  <item>
    <title>Storm warning</title>
    <description>Heavy rain expected.</description>
    <link>https://news.example/storm</link>
  </item>
</channel>
</rss>"#;

/// Creates a test configuration with every source group empty
fn create_test_config(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.collector.max_concurrency = 3;
    config.collector.request_timeout_ms = 2000;
    config.collector.user_agent = "TestHarvester/1.0".to_string();
    config.output.data_dir = data_dir.to_string_lossy().into_owned();
    config.sources.pages.clear();
    config.sources.apis.clear();
    config.sources.feeds.clear();
    config.sources.news.clear();
    config.sources.datasets.clear();
    config.sources.government.clear();
    config.sources.social.clear();
    config
}

async fn mount_html(server: &MockServer, route: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    "<html><head><title>{}</title></head><body><h1>{}</h1>\
                     <script>var hidden = 1;</script><p>Visible text</p></body></html>",
                    title, title
                ))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_mixed_sources(server: &MockServer) {
    mount_html(server, "/home", "Home").await;
    mount_html(server, "/about", "About").await;
    mount_html(server, "/ministry", "Ministry").await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/rates"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"base":"USD","rates":{"EUR":0.92}}"#)
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/world/rss.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
        .expect(1)
        .mount(server)
        .await;
}

/// Seven jobs where the second and fifth fail at fetch
fn mixed_config(data_dir: &Path, base: &str) -> Config {
    let mut config = create_test_config(data_dir);
    config.sources.pages = vec![
        format!("{}/home", base),
        format!("{}/gone", base),
        format!("{}/about", base),
    ];
    config.sources.apis = vec![format!("{}/v1/rates", base), format!("{}/v1/down", base)];
    config.sources.news = vec![format!("{}/world/rss.xml", base)];
    config.sources.government = vec![format!("{}/ministry", base)];
    config.sources.social = vec!["twitter".to_string()];
    config
}

/// Shared in-memory sink for formatted log lines
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn archive_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, is_archive_file)
        })
        .collect()
}

#[tokio::test]
async fn test_full_run_with_failing_sources() {
    let server = MockServer::start().await;
    mount_mixed_sources(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("collection");
    let run = CollectionRun::new(mixed_config(&data_dir, &server.uri())).unwrap();
    assert_eq!(run.jobs().len(), 7);

    let summary = run.execute_with_summary().await.unwrap();

    assert_eq!(summary.dispatch.len(), 7);
    assert_eq!(summary.dispatch.succeeded(), 5);
    assert_eq!(summary.dispatch.failed(), 2);
    let failed: Vec<_> = summary
        .dispatch
        .failures()
        .map(|r| r.job.source_url().to_string())
        .collect();
    assert!(failed[0].ends_with("/gone"));
    assert!(failed[1].ends_with("/v1/down"));

    let report = &summary.report;
    assert_eq!(report.data_sources.web_scraping, 3);
    assert_eq!(report.data_sources.api_data, 1);
    assert_eq!(report.data_sources.news_articles, 2);
    assert_eq!(report.file_count, 4);
    assert!(report.storage_size_bytes > 0);

    assert_eq!(archive_files(&data_dir).len(), 4);
    assert!(data_dir.join("global_data.db").exists());
    assert_eq!(run.sink().database_path(), data_dir.join("global_data.db"));
}

// Runs on the current-thread runtime so every worker logs through the
// thread-local subscriber installed below.
#[tokio::test]
async fn test_fetch_failures_are_logged_with_their_sources() {
    let server = MockServer::start().await;
    mount_mixed_sources(&server).await;

    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = tempfile::tempdir().unwrap();
    let base = server.uri();
    let run = CollectionRun::new(mixed_config(dir.path(), &base)).unwrap();
    run.execute().await.unwrap();

    let output = logs.contents();
    let fetch_errors: Vec<&str> = output
        .lines()
        .filter(|line| line.contains("FetchError for"))
        .collect();

    assert_eq!(fetch_errors.len(), 2, "log was:\n{}", output);
    assert!(fetch_errors
        .iter()
        .any(|line| line.contains(&format!("FetchError for {}/gone", base))));
    assert!(fetch_errors
        .iter()
        .any(|line| line.contains(&format!("FetchError for {}/v1/down", base))));
    assert!(fetch_errors.iter().all(|line| line.contains("ERROR")));
    assert!(!output.contains("ParseError for"));
}

#[tokio::test]
async fn test_report_file_contents() {
    let server = MockServer::start().await;
    mount_mixed_sources(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let run = CollectionRun::new(mixed_config(dir.path(), &server.uri())).unwrap();
    let summary = run.execute_with_summary().await.unwrap();

    let text = std::fs::read_to_string(&summary.report_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["data_sources"]["web_scraping"], 3);
    assert_eq!(json["data_sources"]["api_data"], 1);
    assert_eq!(json["data_sources"]["news_articles"], 2);
    assert_eq!(json["file_count"], 4);
    assert!(json["storage_size"].as_str().unwrap().ends_with(" MB"));
    assert!(json["timestamp"].is_string());
    assert_eq!(
        summary.report_path.file_name().unwrap(),
        "collection_report.json"
    );
}

#[tokio::test]
async fn test_stored_rows_match_sources() {
    let server = MockServer::start().await;
    mount_mixed_sources(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let run = CollectionRun::new(mixed_config(dir.path(), &server.uri())).unwrap();
    run.execute().await.unwrap();

    let conn = rusqlite::Connection::open(dir.path().join("global_data.db")).unwrap();

    let mut stmt = conn
        .prepare("SELECT title, content, source FROM web_data ORDER BY title")
        .unwrap();
    let pages: Vec<(String, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].0, "About");
    assert!(pages.iter().all(|p| p.2 == "web_scraping"));
    assert!(pages.iter().all(|p| !p.1.contains("hidden")));

    let (title, authors, published): (String, String, String) = conn
        .query_row(
            "SELECT title, authors, published_date FROM news_articles WHERE title = 'Markets rally'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(title, "Markets rally");
    assert_eq!(authors, "Jane Reporter");
    assert_eq!(published, "Mon, 06 Jan 2025 10:00:00 GMT");

    let missing_date: String = conn
        .query_row(
            "SELECT published_date FROM news_articles WHERE title = 'Storm warning'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(missing_date, "");

    let data_json: String = conn
        .query_row("SELECT data_json FROM api_data", [], |row| row.get(0))
        .unwrap();
    assert_eq!(data_json, r#"{"base":"USD","rates":{"EUR":0.92}}"#);
}

#[tokio::test]
async fn test_repeated_runs_accumulate_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/world/rss.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.sources.news = vec![format!("{}/world/rss.xml", server.uri())];

    let first = CollectionRun::new(config.clone()).unwrap().execute().await.unwrap();
    let second = CollectionRun::new(config).unwrap().execute().await.unwrap();

    assert_eq!(first.data_sources.news_articles, 2);
    assert_eq!(second.data_sources.news_articles, 4);
    assert_eq!(second.file_count, 0);
}

#[tokio::test]
async fn test_news_sources_are_routed_by_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"articles":[]}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.sources.news = vec![
        format!("{}/v2/top-headlines", server.uri()),
        format!("{}/feeds/rss", server.uri()),
    ];

    let report = CollectionRun::new(config).unwrap().execute().await.unwrap();

    assert_eq!(report.data_sources.api_data, 1);
    assert_eq!(report.data_sources.news_articles, 2);
    assert_eq!(report.file_count, 1);
}

#[tokio::test]
async fn test_run_from_toml_config() {
    let server = MockServer::start().await;
    mount_html(&server, "/home", "Home").await;

    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        r#"
[collector]
max-concurrency = 2
request-timeout-ms = 2000

[output]
data-dir = "{}"
report-name = "summary.json"

[sources]
pages = ["{}/home"]
apis = []
news = []
datasets = []
government = []
"#,
        dir.path().display(),
        server.uri()
    );
    let config = parse_config(&toml).unwrap();

    let summary = CollectionRun::new(config)
        .unwrap()
        .execute_with_summary()
        .await
        .unwrap();

    assert_eq!(summary.report.data_sources.web_scraping, 1);
    assert_eq!(summary.report_path, dir.path().join("summary.json"));
    assert!(summary.report_path.exists());
}

#[tokio::test]
async fn test_unreachable_source_is_isolated() {
    let server = MockServer::start().await;
    mount_html(&server, "/home", "Home").await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.sources.pages = vec![
        "http://127.0.0.1:9/".to_string(),
        format!("{}/home", server.uri()),
    ];

    let result = CollectionRun::new(config).unwrap().execute().await;

    match result {
        Ok(report) => assert_eq!(report.data_sources.web_scraping, 1),
        Err(HarvestError::Interrupted) => panic!("run was not cancelled"),
        Err(e) => panic!("unexpected run failure: {}", e),
    }
}
