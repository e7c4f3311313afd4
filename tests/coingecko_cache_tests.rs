//! Caching behaviour observed through the HTTP API and CoinGecko call counts

mod support;

use axum::http::StatusCode;
use axum_test::TestServer;
use mockito::{Matcher, Server};
use std::sync::Arc;

use crypto_market_insight::application::{MarketService, MarketServiceImpl};
use crypto_market_insight::config::CacheConfig;
use crypto_market_insight::domain::Timeframe;
use crypto_market_insight::infrastructure::api_clients::{CoinGeckoClient, MarketDataClient};
use crypto_market_insight::infrastructure::cache::{CachingMarketDataClient, MarketCaches};
use support::{COINS_MARKETS_BODY, OHLC_BODY, build_app, test_config};

#[tokio::test]
async fn test_repeated_listing_hits_coingecko_once() {
    let mut coingecko = Server::new_async().await;
    let mock = coingecko
        .mock("GET", "/coins/markets")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("vs_currency".into(), "usd".into()),
            Matcher::UrlEncoded("per_page".into(), "10".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COINS_MARKETS_BODY)
        .expect(1)
        .create_async()
        .await;

    let app = build_app(&test_config(&coingecko.url(), "http://127.0.0.1:9"));
    let caches = app.caches.clone();
    let server = TestServer::new(app.router).unwrap();

    for _ in 0..3 {
        let response = server.get("/api/market/coins?page=1&size=10").await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
    // keyword filtering runs on the cached page
    let response = server.get("/api/market/coins?keyword=btc").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    mock.assert_async().await;
    let stats = caches.coin_markets.stats().await;
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
}

#[tokio::test]
async fn test_different_pages_are_cached_separately() {
    let mut coingecko = Server::new_async().await;
    let page_one = coingecko
        .mock("GET", "/coins/markets")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COINS_MARKETS_BODY)
        .expect(1)
        .create_async()
        .await;
    let page_two = coingecko
        .mock("GET", "/coins/markets")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let app = build_app(&test_config(&coingecko.url(), "http://127.0.0.1:9"));
    let server = TestServer::new(app.router).unwrap();

    server.get("/api/market/coins?page=1").await;
    server.get("/api/market/coins?page=2").await;
    server.get("/api/market/coins?page=1").await;
    server.get("/api/market/coins?page=2").await;

    page_one.assert_async().await;
    page_two.assert_async().await;
}

#[tokio::test]
async fn test_ohlc_cached_per_days() {
    let mut coingecko = Server::new_async().await;
    // 1h and 4h both map to days=1 and share an entry
    let one_day = coingecko
        .mock("GET", "/coins/bitcoin/ohlc")
        .match_query(Matcher::UrlEncoded("days".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(OHLC_BODY)
        .expect(1)
        .create_async()
        .await;
    let thirty_days = coingecko
        .mock("GET", "/coins/bitcoin/ohlc")
        .match_query(Matcher::UrlEncoded("days".into(), "30".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(OHLC_BODY)
        .expect(1)
        .create_async()
        .await;

    let client: Arc<dyn MarketDataClient> =
        Arc::new(CoinGeckoClient::with_base_url(coingecko.url()).unwrap());
    let caches = Arc::new(MarketCaches::new(&CacheConfig {
        coin_markets_ttl_seconds: 60,
        ohlc_ttl_seconds: 300,
        max_entries: 1000,
    }));
    let service = MarketServiceImpl::new(Arc::new(CachingMarketDataClient::new(
        client,
        caches.clone(),
    )));

    let hourly = service.get_ohlcv("bitcoin", Timeframe::OneHour).await.unwrap();
    let four_hourly = service
        .get_ohlcv("bitcoin", Timeframe::FourHours)
        .await
        .unwrap();
    service.get_ohlcv("bitcoin", Timeframe::OneDay).await.unwrap();
    service.get_ohlcv("bitcoin", Timeframe::OneDay).await.unwrap();

    assert_eq!(hourly, four_hourly);
    assert_eq!(hourly.len(), 2);
    one_day.assert_async().await;
    thirty_days.assert_async().await;
    assert_eq!(caches.ohlc.len().await, 2);
}

#[tokio::test]
async fn test_failed_calls_are_retried() {
    let mut coingecko = Server::new_async().await;
    let mock = coingecko
        .mock("GET", "/coins/markets")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let app = build_app(&test_config(&coingecko.url(), "http://127.0.0.1:9"));
    let server = TestServer::new(app.router).unwrap();

    for _ in 0..2 {
        let response = server.get("/api/market/coins").await;
        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_null_coin_id_does_not_blank_the_listing() {
    let mut coingecko = Server::new_async().await;
    let by_null_id = coingecko
        .mock("GET", "/coins/markets")
        .match_query(Matcher::UrlEncoded("ids".into(), "null".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let listing = coingecko
        .mock("GET", "/coins/markets")
        .match_query(Matcher::Regex(
            "^vs_currency=usd&per_page=100&page=1$".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COINS_MARKETS_BODY)
        .expect(1)
        .create_async()
        .await;

    let app = build_app(&test_config(&coingecko.url(), "http://127.0.0.1:9"));
    let server = TestServer::new(app.router).unwrap();

    let response = server.get("/api/market/coins/null").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/market/coins?page=1&size=100").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["coins"].as_array().map(Vec::len), Some(2));

    by_null_id.assert_async().await;
    listing.assert_async().await;
}
