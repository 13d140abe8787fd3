//! CoinGecko client against a mocked API

use crypto_price_bot::{BotError, CoinGeckoClient, PriceDataSource, PricePoint};
use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, api_key: Option<&str>) -> CoinGeckoClient {
    CoinGeckoClient::new(
        &server.uri(),
        api_key.map(|k| k.to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn currencies() -> Vec<String> {
    vec!["usd".into(), "idr".into(), "eur".into()]
}

#[tokio::test]
async fn test_quotes_parsed_per_currency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "bitcoin,manta-network,dogecoin"))
        .and(query_param("vs_currencies", "usd,idr,eur"))
        .and(query_param("include_24hr_change", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": {
                "usd": 67000.5, "usd_24h_change": 1.5,
                "idr": 1050000000.0, "idr_24h_change": 1.7,
                "eur": 61000.0, "eur_24h_change": null
            },
            "manta-network": { "usd": 1.25, "usd_24h_change": -4.2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cg = client(&server, None);
    let ids = vec![
        "bitcoin".to_string(),
        "manta-network".to_string(),
        "dogecoin".to_string(),
    ];
    let quotes = cg.fetch_quotes(&ids, &currencies()).await.unwrap();

    assert_eq!(quotes.len(), 2);
    let btc = &quotes["bitcoin"];
    assert_eq!(btc.quotes.len(), 3);
    assert_eq!(btc.get("usd").unwrap().price, 67000.5);
    assert_eq!(btc.get("usd").unwrap().change_24h, Some(1.5));
    assert_eq!(btc.get("eur").unwrap().change_24h, None);

    let manta = &quotes["manta-network"];
    assert_eq!(manta.quotes.len(), 1);
    assert_eq!(manta.get("usd").unwrap().change_24h, Some(-4.2));
    assert!(!quotes.contains_key("dogecoin"));
}

#[tokio::test]
async fn test_api_key_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(header("x-cg-pro-api-key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": { "usd": 1.0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cg = client(&server, Some("secret-key"));
    let quotes = cg
        .fetch_quotes(&["bitcoin".to_string()], &["usd".to_string()])
        .await;
    assert_ok!(quotes);
}

#[tokio::test]
async fn test_rate_limit_is_surfaced_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let cg = client(&server, None);
    let err = cg
        .fetch_quotes(&["bitcoin".to_string()], &currencies())
        .await
        .unwrap_err();

    match err {
        BotError::RateLimited {
            source_name,
            retry_after,
        } => {
            assert_eq!(source_name, "coingecko");
            assert_eq!(retry_after, Some(30));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!cg.health().await.is_healthy);
}

#[tokio::test]
async fn test_server_error_and_bad_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let cg = client(&server, None);

    let err = cg
        .fetch_quotes(&["bitcoin".to_string()], &currencies())
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::Upstream(ref msg) if msg.contains("500")));
    assert!(err.is_upstream());

    let err = cg.fetch_history("bitcoin", "usd", 7).await.unwrap_err();
    assert!(matches!(err, BotError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_history_rows_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/solana/market_chart"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prices": [
                [1704067200000_i64, 101.5],
                [1704070800000_i64, null],
                [1704074400000_i64, -3.0],
                [1704078000000_i64, 99.25]
            ],
            "market_caps": [],
            "total_volumes": []
        })))
        .mount(&server)
        .await;

    let cg = client(&server, None);
    let history = cg.fetch_history("solana", "USD", 7).await.unwrap();

    assert_eq!(
        history,
        vec![
            PricePoint::new(1_704_067_200_000, 101.5),
            PricePoint::new(1_704_078_000_000, 99.25),
        ]
    );

    let health = cg.health().await;
    assert!(health.is_healthy);
    assert!(health.last_success.is_some());
    assert_eq!(health.success_rate, 1.0);
}

#[tokio::test]
async fn test_unreachable_host_is_upstream_error() {
    // Nothing listens on this port once the server is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let cg = CoinGeckoClient::new(&uri, None, Duration::from_secs(2)).unwrap();
    let result = cg.fetch_history("bitcoin", "usd", 1).await;
    let err = assert_err!(result);
    assert!(err.is_upstream());
}
