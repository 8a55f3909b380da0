// tests/oracle_test.rs

use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use eyre::Result;
use std::time::Duration;

use mockswap_deployer::config::OracleConfig;
use mockswap_deployer::oracle::{
    feed_id_for_pair, parse_price_feeds, HermesClient, KNOWN_PRICE_FEEDS, USDC_USD_FEED,
    USDT_USD_FEED,
};
use mockswap_deployer::PriceFeedError;

fn feed_json(id: &str, price: &str, expo: i32) -> String {
    format!(
        r#"{{"id":"{id}","price":{{"price":"{price}","conf":"4210","expo":{expo},"publish_time":1718000000}},
            "ema_price":{{"price":"{price}","conf":"4000","expo":{expo},"publish_time":1718000000}}}}"#
    )
}

async fn spawn_hermes(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

fn client_for(url: String) -> Result<HermesClient> {
    Ok(HermesClient::new(&OracleConfig { hermes_url: url, timeout: Duration::from_secs(5) })?)
}

#[test]
fn known_feeds_are_valid_ids() {
    assert_eq!(KNOWN_PRICE_FEEDS["USDC/USD"], USDC_USD_FEED);
    assert_eq!(KNOWN_PRICE_FEEDS["USDT/USD"], USDT_USD_FEED);
    for id in KNOWN_PRICE_FEEDS.values() {
        assert_eq!(hex::decode(id).unwrap().len(), 32);
    }
}

#[test]
fn parse_reports_missing_ids_as_partial() {
    let body = format!("[{}]", feed_json(USDT_USD_FEED, "100012345", -8));
    let requested = vec![USDT_USD_FEED.to_string(), USDC_USD_FEED.to_string()];

    let parsed = parse_price_feeds(&body, &requested).unwrap();

    assert!(parsed.is_partial());
    assert_eq!(parsed.missing, vec![USDC_USD_FEED.to_string()]);
    let quote = parsed.get(&format!("0x{USDT_USD_FEED}")).unwrap();
    assert_eq!(quote.price, 100_012_345);
    assert_eq!(quote.exponent, -8);
    assert_eq!(quote.confidence, 4210);
    assert_eq!(quote.timestamp, 1_718_000_000);
    assert!(quote.published_at().is_some());
}

#[test]
fn pair_symbols_resolve_through_known_feeds() {
    assert_eq!(feed_id_for_pair("USDC/USD").unwrap(), USDC_USD_FEED);
    assert_eq!(feed_id_for_pair(" usdt/usd ").unwrap(), USDT_USD_FEED);
    assert_eq!(
        feed_id_for_pair("DOGE/USD").unwrap_err(),
        PriceFeedError::UnknownPair("DOGE/USD".to_string())
    );
}

#[test]
fn repeated_ids_are_not_reported_missing() {
    let body = format!("[{}]", feed_json(USDC_USD_FEED, "100000000", -8));
    let requested = vec![USDC_USD_FEED.to_string(), USDC_USD_FEED.to_string()];

    let parsed = parse_price_feeds(&body, &requested).unwrap();

    assert!(!parsed.is_partial());
    assert_eq!(parsed.quotes.len(), 1);
    assert_eq!(parsed.quotes[0].id, USDC_USD_FEED);
}

#[test]
fn parse_rejects_malformed_payloads() {
    let requested = vec![USDC_USD_FEED.to_string()];
    assert!(matches!(
        parse_price_feeds("{\"oops\":1}", &requested),
        Err(PriceFeedError::Malformed(_))
    ));

    let bad_price = format!("[{}]", feed_json(USDC_USD_FEED, "one dollar", -8));
    assert!(matches!(parse_price_feeds(&bad_price, &requested), Err(PriceFeedError::Malformed(_))));
}

#[tokio::test]
async fn fetch_prices_from_mock_service() -> Result<()> {
    let app = Router::new().route(
        "/api/latest_price_feeds",
        get(|RawQuery(query): RawQuery| async move {
            // Only the USDT feed is "known" upstream.
            let query = query.unwrap_or_default();
            if query.contains(USDT_USD_FEED) {
                format!("[{}]", feed_json(USDT_USD_FEED, "99980000", -8))
            } else {
                "[]".to_string()
            }
        }),
    );
    let client = client_for(spawn_hermes(app).await?)?;

    let prices = client.fetch_stablecoin_prices().await?;

    assert_eq!(prices.quotes.len(), 1);
    assert_eq!(prices.quotes[0].id, USDT_USD_FEED);
    assert!((prices.quotes[0].scaled_price() - 0.9998).abs() < 1e-9);
    assert_eq!(prices.missing, vec![USDC_USD_FEED.to_string()]);
    Ok(())
}

#[tokio::test]
async fn repeated_ids_are_requested_once() -> Result<()> {
    let app = Router::new().route(
        "/api/latest_price_feeds",
        get(|RawQuery(query): RawQuery| async move {
            let query = query.unwrap_or_default();
            if query.matches(USDC_USD_FEED).count() != 1 {
                return (StatusCode::BAD_REQUEST, format!("unexpected query {query}"));
            }
            (StatusCode::OK, format!("[{}]", feed_json(USDC_USD_FEED, "100010000", -8)))
        }),
    );
    let client = client_for(spawn_hermes(app).await?)?;
    let ids = vec![USDC_USD_FEED.to_string(), format!("0x{}", USDC_USD_FEED.to_uppercase())];

    let prices = client.fetch_prices(&ids).await?;

    assert_eq!(prices.quotes.len(), 1);
    assert!(prices.missing.is_empty());
    Ok(())
}

#[tokio::test]
async fn upstream_http_error_is_typed() -> Result<()> {
    let app = Router::new().route(
        "/api/latest_price_feeds",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let client = client_for(spawn_hermes(app).await?)?;

    let err = client.fetch_prices(&[USDC_USD_FEED.to_string()]).await.unwrap_err();

    assert_eq!(err, PriceFeedError::Status { status: 503, body: "maintenance".to_string() });
    Ok(())
}

#[tokio::test]
async fn unreachable_service_is_typed() -> Result<()> {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let client = client_for(format!("http://{addr}"))?;

    let err = client.fetch_prices(&[USDC_USD_FEED.to_string()]).await.unwrap_err();

    assert!(matches!(err, PriceFeedError::Unreachable(_)));
    Ok(())
}

#[tokio::test]
async fn invalid_ids_and_empty_requests() -> Result<()> {
    let client = client_for("http://127.0.0.1:9".to_string())?;

    let err = client.fetch_prices(&["0xabc".to_string()]).await.unwrap_err();
    assert_eq!(err, PriceFeedError::InvalidId("0xabc".to_string()));

    let empty = client.fetch_prices(&[]).await?;
    assert!(empty.quotes.is_empty());
    assert!(!empty.is_partial());
    Ok(())
}
