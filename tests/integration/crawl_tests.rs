//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small catalog over HTTP and drive the
//! full pipeline - paginator, bounded runner, extractor set - through the
//! bundled HTTP engine.

use vancian::config::{CatalogConfig, Config, CrawlerConfig, UserAgentConfig};
use vancian::crawler::crawl;
use vancian::output::write_records;
use vancian::VancianError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, allowed_origins: Vec<String>, retry_limit: u32) -> Config {
    Config {
        catalog: CatalogConfig {
            base_url: base_url.to_string(),
            index_path: "/spells?page=1".to_string(),
            allowed_origins,
        },
        crawler: CrawlerConfig {
            max_concurrent_fetches: 4,
            retry_limit,
            headless: true,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            harvester_name: "VancianTest".to_string(),
            harvester_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

/// Renders one catalog index page from `(href, name, origin)` rows
fn catalog_html(rows: &[(&str, &str, &str)], next_href: Option<&str>) -> String {
    let mut html = String::from("<html><body><ul class=\"spell-index\">\n");
    for (href, name, origin) in rows {
        html.push_str(&format!(
            "<li class=\"spell-entry\"><a class=\"spell-link\" href=\"{}\">{}</a>\
             <span class=\"spell-origin\">{}</span></li>\n",
            href, name, origin
        ));
    }
    html.push_str("</ul>\n");
    if let Some(href) = next_href {
        html.push_str(&format!("<a class=\"pager\" href=\"{}\">Next</a>\n", href));
    }
    html.push_str("</body></html>");
    html
}

/// Renders a detail page with a name and a few representative fields
fn spell_html(name: &str) -> String {
    format!(
        r#"<html><body><article class="spell">
            <h1 class="spell-name">{}</h1>
            <p class="spell-source"><span class="origin">Core Rulebook</span> pg.
               <span class="page">242</span></p>
            <ul class="spell-schools"><li>evocation</li></ul>
            <ul class="spell-levels">
                <li data-category="sorcerer/wizard" data-level="3">sorcerer/wizard 3</li>
            </ul>
            <ul class="spell-components"><li>V</li><li>S</li></ul>
            <dl class="spell-stats">
                <dt>Casting Time</dt><dd class="casting-time">1 standard action</dd>
                <dt>Duration</dt><dd class="duration">instantaneous</dd>
            </dl>
            <div class="spell-description"><p>{} detonates with a low roar.</p></div>
        </article></body></html>"#,
        name, name
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_two_pages() {
    let mock_server = MockServer::start().await;

    // Page 1: three matching rows, two filtered out. Page 2: one matching
    // row and no further next control.
    Mock::given(method("GET"))
        .and(path("/spells"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[
                ("/spells/alarm-1", "Alarm", "Core Rulebook"),
                ("/spells/bane-2", "Bane", "Third Party Codex"),
                ("/spells/bless-3", "Bless", "Core Rulebook"),
                ("/spells/calm-4", "Calm", "Homebrew Annex"),
                ("/spells/doom-5", "Doom", "Core Rulebook"),
            ],
            Some("/spells?page=2"),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[("/spells/erase-6", "Erase", "Core Rulebook")],
            None,
        )))
        .mount(&mock_server)
        .await;

    for (page_path, name) in [
        ("/spells/alarm-1", "Alarm"),
        ("/spells/bless-3", "Bless"),
        ("/spells/doom-5", "Doom"),
        ("/spells/erase-6", "Erase"),
    ] {
        mount_page(&mock_server, page_path, spell_html(name)).await;
    }

    let config = create_test_config(&mock_server.uri(), vec!["Core Rulebook".to_string()], 3);
    let records = crawl(config).await.expect("harvest failed");

    assert_eq!(records.len(), 4);

    let mut names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Alarm", "Bless", "Doom", "Erase"]);

    // Records carry parsed fields and reference-derived identifiers.
    let alarm = records.iter().find(|r| r.name == "Alarm").unwrap();
    assert_eq!(alarm.id, "1");
    assert_eq!(alarm.source.as_ref().unwrap().origin, "Core Rulebook");
    assert_eq!(alarm.source.as_ref().unwrap().page, 242);
    assert_eq!(alarm.schools, vec!["evocation"]);
    assert_eq!(alarm.levels[0].category, "sorcerer/wizard");
    assert_eq!(alarm.casting_time.as_deref(), Some("1 standard action"));

    // The whole harvest serializes as one JSON array.
    let mut buffer = Vec::new();
    write_records(&mut buffer, &records).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_index_navigation_failure_is_retried() {
    let mock_server = MockServer::start().await;

    // The index page fails twice before serving; mounted first so it
    // consumes the first two requests, then expires.
    Mock::given(method("GET"))
        .and(path("/spells"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[("/spells/alarm-1", "Alarm", "Core Rulebook")],
            None,
        )))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/spells/alarm-1", spell_html("Alarm")).await;

    let config = create_test_config(&mock_server.uri(), vec!["Core Rulebook".to_string()], 3);
    let records = crawl(config).await.expect("harvest failed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Alarm");
}

#[tokio::test]
async fn test_detail_load_fails_twice_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[("/spells/haste-12", "Haste", "Core Rulebook")],
            None,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/spells/haste-12"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/spells/haste-12", spell_html("Haste")).await;

    let config = create_test_config(&mock_server.uri(), vec!["Core Rulebook".to_string()], 10);
    let records = crawl(config).await.expect("harvest failed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Haste");
    assert_eq!(records[0].id, "12");

    // Two failures plus the success: three detail loads in total.
    let detail_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/spells/haste-12")
        .count();
    assert_eq!(detail_requests, 3);
}

#[tokio::test]
async fn test_persistent_detail_failure_fails_whole_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[
                ("/spells/alarm-1", "Alarm", "Core Rulebook"),
                ("/spells/haste-12", "Haste", "Core Rulebook"),
            ],
            None,
        )))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/spells/alarm-1", spell_html("Alarm")).await;

    // The second detail page never loads.
    Mock::given(method("GET"))
        .and(path("/spells/haste-12"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec!["Core Rulebook".to_string()], 2);
    let result = crawl(config).await;

    // No partial output: the run fails outright, naming the entry.
    match result {
        Err(VancianError::Run(error)) => {
            assert_eq!(error.reference.as_str(), "/spells/haste-12");
        }
        other => panic!("expected run failure, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn test_nothing_found_performs_no_detail_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[
                ("/spells/bane-2", "Bane", "Third Party Codex"),
                ("/spells/calm-4", "Calm", "Homebrew Annex"),
            ],
            None,
        )))
        .mount(&mock_server)
        .await;

    // Any detail fetch would be a bug.
    Mock::given(method("GET"))
        .and(path("/spells/bane-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), vec!["Core Rulebook".to_string()], 3);
    let records = crawl(config).await.expect("harvest failed");

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_pagination_is_idempotent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[
                ("/spells/alarm-1", "Alarm", "Core Rulebook"),
                ("/spells/bless-3", "Bless", "Core Rulebook"),
            ],
            Some("/spells?page=2"),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/spells"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(
            &[("/spells/erase-6", "Erase", "Core Rulebook")],
            None,
        )))
        .mount(&mock_server)
        .await;

    for (page_path, name) in [
        ("/spells/alarm-1", "Alarm"),
        ("/spells/bless-3", "Bless"),
        ("/spells/erase-6", "Erase"),
    ] {
        mount_page(&mock_server, page_path, spell_html(name)).await;
    }

    let config = create_test_config(&mock_server.uri(), vec!["Core Rulebook".to_string()], 3);

    let first = crawl(config.clone()).await.expect("first harvest failed");
    let second = crawl(config).await.expect("second harvest failed");

    let mut first_ids: Vec<String> = first.iter().map(|record| record.id.clone()).collect();
    let mut second_ids: Vec<String> = second.iter().map(|record| record.id.clone()).collect();
    first_ids.sort_unstable();
    second_ids.sort_unstable();
    assert_eq!(first_ids, second_ids);
    assert_eq!(first.len(), 3);
}
