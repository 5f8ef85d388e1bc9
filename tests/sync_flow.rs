//! End-to-end sync tests against a mock wallabag instance.
//!
//! Covers the token handshake, paginated aggregation, partial-failure
//! degradation, and query behavior over the published snapshot.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wallabag_search::auth::TokenManager;
use wallabag_search::config::{Config, ConfigKey, NullConfigStore};
use wallabag_search::fetcher::ArticleFetcher;
use wallabag_search::index::{IndexBuilder, IndexStore};
use wallabag_search::plugin::WallabagPlugin;
use wallabag_search::scheduler::RefreshScheduler;

fn test_config(instance_url: &str) -> Config {
    let mut config = Config::default();
    config.set(ConfigKey::InstanceUrl, instance_url).unwrap();
    config.set(ConfigKey::Username, "reader").unwrap();
    config.set(ConfigKey::Password, "hunter2").unwrap();
    config.set(ConfigKey::ClientId, "client-id").unwrap();
    config.set(ConfigKey::ClientSecret, "client-secret").unwrap();
    config
}

fn article(id: u64, title: &str, url: &str, tags: &[&str]) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "url": url,
        "tags": tags.iter().map(|t| json!({"label": t})).collect::<Vec<_>>(),
    })
}

fn entries_page(pages: u32, items: Vec<serde_json::Value>) -> serde_json::Value {
    json!({"pages": pages, "_embedded": {"items": items}})
}

async fn mount_token_endpoint(server: &MockServer, expected_requests: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("username=reader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc",
            "refresh_token": "def",
            "expires_in": 3600
        })))
        .expect(expected_requests)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_drains_all_pages_in_order() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    // Three pages; each request must carry the right page number.
    for (page, ids) in [(1u32, [1u64, 2]), (2, [3, 4]), (3, [5, 6])] {
        let items = vec![
            article(ids[0], &format!("Article {}", ids[0]), "https://example.com/a", &[]),
            article(ids[1], &format!("Article {}", ids[1]), "https://example.com/b", &[]),
        ];
        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .and(query_param("page", page.to_string()))
            .and(query_param("perPage", "250"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(3, items)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();
    let count = plugin.rebuild_once().await.unwrap();
    assert_eq!(count, 6);

    // Aggregated in page order.
    let results = plugin.handle_query("article");
    assert_eq!(results.len(), 6);
    assert_eq!(results[0].text, "Article 1");
    assert_eq!(results[5].text, "Article 6");
}

#[tokio::test]
async fn test_failed_page_yields_partial_index() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(
            3,
            vec![article(1, "Survivor", "https://example.com/one", &[])],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();

    // Page 1 survives, page 3 is never requested, and no error escapes.
    let count = plugin.rebuild_once().await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(plugin.handle_query("survivor").len(), 1);
}

#[tokio::test]
async fn test_token_is_reused_while_valid() {
    let server = MockServer::start().await;
    // Two full cycles, but the 3600 s lifetime keeps the first token valid:
    // exactly one token request overall.
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(
            1,
            vec![article(1, "Cached", "https://example.com/cached", &[])],
        )))
        .expect(2)
        .mount(&server)
        .await;

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();
    plugin.rebuild_once().await.unwrap();
    plugin.rebuild_once().await.unwrap();
}

#[tokio::test]
async fn test_expired_token_renews_once_per_cycle() {
    let server = MockServer::start().await;

    // A zero lifetime makes every issued token immediately invalid, so each
    // cycle must perform exactly one renewal.
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc",
            "refresh_token": "def",
            "expires_in": 0
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(
            1,
            vec![article(1, "Short lived", "https://example.com/short", &[])],
        )))
        .expect(2)
        .mount(&server)
        .await;

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();
    plugin.rebuild_once().await.unwrap();
    plugin.rebuild_once().await.unwrap();
}

#[tokio::test]
async fn test_auth_failure_keeps_previous_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .expect(1)
        .mount(&server)
        .await;

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();

    // The cycle aborts with an error and nothing is published.
    assert!(plugin.rebuild_once().await.is_err());
    assert!(plugin.handle_query("anything").is_empty());
}

#[tokio::test]
async fn test_empty_query_skips_network() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(
            1,
            vec![article(1, "Only", "https://example.com/only", &["Tagged"])],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();
    plugin.rebuild_once().await.unwrap();

    // Empty and substring queries are answered from the snapshot alone; the
    // mock expectations above would fail on any extra request.
    assert_eq!(plugin.handle_query("").len(), 1);
    assert_eq!(plugin.handle_query("tagged").len(), 1);
    assert_eq!(plugin.handle_query("ONLY").len(), 1);
}

#[tokio::test]
async fn test_refresh_now_rebuilds_out_of_band() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(
            1,
            vec![article(1, "Fresh", "https://example.com/fresh", &[])],
        )))
        .expect(2)
        .mount(&server)
        .await;

    let plugin = WallabagPlugin::new(test_config(&server.uri()), Box::new(NullConfigStore)).unwrap();
    plugin.rebuild_once().await.unwrap();

    // Manual refresh runs on its own task and performs a second full cycle.
    plugin.refresh_now();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(plugin.handle_query("fresh").len(), 1);
}

#[tokio::test]
async fn test_reconfigure_runs_exactly_one_loop() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries_page(
            1,
            vec![article(1, "Looped", "https://example.com/loop", &[])],
        )))
        // One cold-start build per loop start: the original loop and its
        // replacement. A duplicate loop would produce extra fetches.
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let client = reqwest::Client::new();
    let tokens = Arc::new(TokenManager::new(client.clone(), config.connection.clone()));
    let fetcher = ArticleFetcher::new(
        client,
        config.connection.instance_url.clone(),
        tokens,
    );
    let store = Arc::new(IndexStore::new());
    let builder = Arc::new(IndexBuilder::new(
        fetcher,
        Arc::clone(&store),
        config.connection.instance_url.clone(),
    ));

    let mut scheduler = RefreshScheduler::new(builder);
    scheduler.start(Duration::from_secs(900));
    // Let the cold-start build land, then swap the interval mid-wait.
    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.reconfigure(Duration::from_secs(60)).await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(!store.snapshot().is_empty());
    scheduler.stop().await;
    scheduler.stop().await;
}
