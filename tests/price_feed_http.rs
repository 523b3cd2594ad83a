//! Integration tests for the CoinGecko-backed price feed
//!
//! A wiremock server stands in for the `simple/price` endpoint.

use std::sync::Arc;
use std::time::Duration;

use vault_metrics_sdk::coingecko_price_source::CoinGeckoPriceSource;
use vault_metrics_sdk::price_feeds::{PriceFeed, PriceSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn source(server: &MockServer) -> CoinGeckoPriceSource {
    CoinGeckoPriceSource::new(server.uri(), Duration::from_secs(2)).expect("client")
}

#[tokio::test]
async fn parses_usd_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "sonic-3"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sonic-3": { "usd": 0.4213 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let price = source(&server).await.fetch_usd_price("sonic-3").await.unwrap();
    assert_eq!(price, 0.4213);
}

#[tokio::test]
async fn rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = source(&server).await.fetch_usd_price("sonic-3").await.unwrap_err();
    assert!(err.to_string().contains("429"), "got: {}", err);
}

#[tokio::test]
async fn missing_asset_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    assert!(source(&server).await.fetch_usd_price("sonic-3").await.is_err());
}

#[tokio::test]
async fn feed_without_cache_is_unavailable_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feed = PriceFeed::new(Arc::new(source(&server).await), Duration::from_secs(15));
    assert!(feed.get_price("sonic-3").await.is_none());
}

#[tokio::test]
async fn feed_keeps_last_price_when_server_starts_failing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sonic-3": { "usd": 0.5 }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let feed = PriceFeed::new(Arc::new(source(&server).await), Duration::from_secs(15));
    assert_eq!(feed.get_price("sonic-3").await.map(|p| p.value_usd), Some(0.5));
    assert_eq!(feed.refresh("sonic-3").await.map(|p| p.value_usd), Some(0.5));
    assert_eq!(feed.fetch_count(), 2);
}

#[tokio::test]
async fn concurrent_callers_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "sonic-3": { "usd": 1.5 } }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let feed = PriceFeed::new(Arc::new(source(&server).await), Duration::from_secs(15));
    let (a, b, c) = tokio::join!(
        feed.get_price("sonic-3"),
        feed.get_price("sonic-3"),
        feed.get_price("sonic-3"),
    );
    assert_eq!(a.map(|p| p.value_usd), Some(1.5));
    assert_eq!(a, b);
    assert_eq!(b, c);
}
