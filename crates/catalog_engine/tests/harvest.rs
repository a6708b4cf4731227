use std::sync::Arc;
use std::time::Duration;

use catalog_core::{StatusBoard, COMPLETED};
use catalog_engine::{
    HarvestConfig, HarvestError, HarvestMode, Harvester, PageLimits, ReqwestFetcher,
};
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn config() -> HarvestConfig {
    HarvestConfig {
        politeness_delay: Duration::from_millis(1),
        clock: Arc::new(fixed_time),
        ..HarvestConfig::default()
    }
}

fn harvester(config: HarvestConfig, status: StatusBoard) -> Harvester {
    Harvester::new(config, Arc::new(ReqwestFetcher::default()), None, status)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_collection(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/collections/hair"))
        .and(query_param_is_missing("page"))
        .respond_with(html(
            r#"<ul id="product-grid">
                <li><a href="/products/a">Alpha</a></li>
                <li><a href="/products/b">Beta</a></li>
                <li><a href="/products/c">Gamma</a></li>
            </ul>"#,
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/hair"))
        .and(query_param("page", "2"))
        .respond_with(html(r#"<ul id="product-grid"></ul>"#))
        .mount(server)
        .await;
}

async fn mount_products(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/products/a.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"variants": [{"option1": "100ml", "price": 1900}]}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/b"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/c"))
        .respond_with(html(r#"<div class="price__container">$7.00</div>"#))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_failing_product_does_not_abort_the_batch() {
    catalog_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_collection(&server).await;
    mount_products(&server).await;

    let status = StatusBoard::new();
    let harvester = harvester(config(), status.clone());
    let urls = vec![format!("{}/collections/hair", server.uri())];

    let result = harvester.harvest(&urls).await.expect("harvest ok");

    assert_eq!(result.status, COMPLETED);
    assert_eq!(result.total_collections, 1);
    assert_eq!(result.total_products, 3);
    assert_eq!(result.scraped_at, fixed_time());
    let names: Vec<&str> = result.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);

    let failed: Vec<&str> = result
        .products
        .iter()
        .filter(|p| p.is_failed())
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(failed, vec!["Beta"]);
    assert!(result.products[1].size_price_combinations.is_empty());
    assert_eq!(result.products[0].size_price_combinations[0].price, "$19,00");
    assert_eq!(result.products[2].size_price_combinations[0].price, "$7,00");
    assert_eq!(result.products_with_prices(), 2);

    let snapshot = status.snapshot();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.last_run, Some(fixed_time()));
    assert_eq!(snapshot.last_result, Some(result));
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test]
async fn empty_collection_is_skipped() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    mount_products(&server).await;

    let harvester = harvester(
        HarvestConfig {
            limits: PageLimits {
                max_pages: None,
                max_products: Some(1),
            },
            ..config()
        },
        StatusBoard::new(),
    );
    let urls = vec![
        format!("{}/collections/missing", server.uri()),
        format!("{}/collections/hair", server.uri()),
    ];

    let result = harvester.harvest(&urls).await.expect("harvest ok");

    assert_eq!(result.total_collections, 2);
    assert_eq!(result.total_products, 1);
    assert_eq!(result.products[0].name, "Alpha");
}

#[tokio::test]
async fn invalid_input_fails_and_releases_the_guard() {
    let status = StatusBoard::new();
    let harvester = harvester(config(), status.clone());

    let err = harvester.harvest(&[]).await.unwrap_err();
    assert!(matches!(err, HarvestError::InvalidInput(_)));

    let err = harvester
        .harvest(&["file:///etc/passwd".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::InvalidInput(_)));

    let snapshot = status.snapshot();
    assert!(!snapshot.is_running);
    assert!(snapshot.last_error.is_some());
    assert_eq!(snapshot.last_result, None);
}

#[tokio::test]
async fn rendered_mode_without_launcher_fails_to_start() {
    let status = StatusBoard::new();
    let harvester = harvester(
        HarvestConfig {
            mode: HarvestMode::Rendered,
            ..config()
        },
        status.clone(),
    );

    let err = harvester
        .harvest(&["https://shop.example/collections/all".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::SessionStart(_)));
    assert!(!status.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_harvest_is_rejected_while_one_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/slow"))
        .respond_with(
            html(r#"<ul id="product-grid"></ul>"#).set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let status = StatusBoard::new();
    let harvester = Arc::new(harvester(config(), status.clone()));
    let urls = vec![format!("{}/collections/slow", server.uri())];

    let first = {
        let harvester = Arc::clone(&harvester);
        let urls = urls.clone();
        tokio::spawn(async move { harvester.harvest(&urls).await })
    };
    while !status.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let started_at = status.snapshot().started_at;

    let err = harvester.harvest(&urls).await.unwrap_err();
    assert!(matches!(err, HarvestError::AlreadyRunning(_)));
    let during = status.snapshot();
    assert!(during.is_running);
    assert_eq!(during.started_at, started_at);
    assert_eq!(during.last_error, None);

    let result = first.await.unwrap().expect("first harvest completes");
    assert_eq!(result.total_products, 0);
    assert!(!status.is_running());
    assert_eq!(status.snapshot().last_result, Some(result));
}
