use optchain_spider::stock::ingest::QuoteProvider;
use optchain_spider::stock::tickers::scrape;
use optchain_spider::stock::yahoo_finance::YahooFinance;
use optchain_spider::{Config, SpiderError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const CONSTITUENTS: &str = include_str!("fixtures/sp500_constituents.html");

// stub server
// ----------------------------------------------------------------------------

/// Loopback HTTP/1.1 server answering canned routes; anything else is a 404.
struct Stub {
    base_url: String,
    heads: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    async fn serve(routes: Vec<(String, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let heads = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let seen = heads.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&buf).to_string();
                    let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                    seen.lock().unwrap().push(head);

                    let (status, body) = routes
                        .iter()
                        .find(|(path, _, _)| *path == target)
                        .map(|(_, status, body)| (*status, body.clone()))
                        .unwrap_or((404, String::new()));
                    let reason = if status == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\ncontent-length: {}\r\n\
                         connection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base_url, heads }
    }

    /// Request targets in arrival order.
    fn targets(&self) -> Vec<String> {
        self.heads
            .lock()
            .unwrap()
            .iter()
            .filter_map(|head| head.split_whitespace().nth(1).map(str::to_string))
            .collect()
    }

    /// Lower-cased request heads, for header checks.
    fn heads(&self) -> Vec<String> {
        self.heads.lock().unwrap().iter().map(|h| h.to_ascii_lowercase()).collect()
    }
}

fn route(target: &str, status: u16, body: impl Into<String>) -> (String, u16, String) {
    (target.to_string(), status, body.into())
}

fn config(stub: &Stub) -> Config {
    Config {
        ticker_source_url: format!("{}/wiki/constituents", stub.base_url),
        provider_url: format!("{}/v7/finance/options", stub.base_url),
        http_timeout: std::time::Duration::from_secs(5),
        ..Config::default()
    }
}

fn contract(symbol: String, expiration: i64, in_the_money: bool) -> Value {
    json!({
        "contractSymbol": symbol,
        "strike": 100.0,
        "currency": "USD",
        "lastPrice": 6.1,
        "change": 0.4,
        "percentChange": 7.01,
        "volume": 120,
        "openInterest": 3400,
        "bid": 6.0,
        "ask": 6.2,
        "contractSize": "REGULAR",
        "expiration": expiration,
        "lastTradeDate": 1718898659,
        "impliedVolatility": 0.31,
        "inTheMoney": in_the_money
    })
}

/// One expiry of the `symbol` chain, listing `all` expiration dates.
fn page(symbol: &str, expiration: i64, all: &[i64]) -> String {
    json!({
        "optionChain": {
            "result": [{
                "underlyingSymbol": symbol,
                "expirationDates": all,
                "quote": { "symbol": symbol, "regularMarketPrice": 105.0 },
                "options": [{
                    "expirationDate": expiration,
                    "calls": [contract(format!("{symbol}{expiration}C100"), expiration, true)],
                    "puts": [contract(format!("{symbol}{expiration}P100"), expiration, false)]
                }]
            }],
            "error": null
        }
    })
    .to_string()
}

const EXPIRIES: [i64; 3] = [1718928000, 1719532800, 1720137600];

fn dated(date: i64) -> String {
    format!("/v7/finance/options/AAPL?date={date}")
}

// tickers
// ----------------------------------------------------------------------------

#[tokio::test]
async fn ticker_page_error_status_is_a_fetch_error() {
    let stub = Stub::serve(vec![route("/wiki/constituents", 503, "unavailable")]).await;
    let config = config(&stub);
    let http_client = optchain_spider::std_client_build(&config).unwrap();

    let err = scrape(&http_client, &config).await.unwrap_err();
    assert!(matches!(err, SpiderError::Fetch(_)), "{err}");
    assert!(err.to_string().contains("503"), "{err}");
}

#[tokio::test]
async fn ticker_page_is_requested_with_browser_user_agent() {
    let stub = Stub::serve(vec![route("/wiki/constituents", 200, CONSTITUENTS)]).await;
    let config = config(&stub);
    let http_client = optchain_spider::std_client_build(&config).unwrap();

    let tickers = scrape(&http_client, &config).await.unwrap();

    assert_eq!(tickers, vec!["MMM", "AOS", "BRK.B", "ZTS"]);
    let heads = stub.heads();
    assert_eq!(heads.len(), 1);
    assert!(heads[0].contains("\r\nuser-agent: mozilla/5.0\r\n"), "{}", heads[0]);
}

// provider
// ----------------------------------------------------------------------------

#[tokio::test]
async fn fetches_every_remaining_expiry() {
    let [first, second, third] = EXPIRIES;
    let stub = Stub::serve(vec![
        route("/v7/finance/options/AAPL", 200, page("AAPL", first, &EXPIRIES)),
        route(&dated(second), 200, page("AAPL", second, &EXPIRIES)),
        route(&dated(third), 200, page("AAPL", third, &EXPIRIES)),
    ])
    .await;
    let config = config(&stub);
    let provider = YahooFinance::new(optchain_spider::std_client_build(&config).unwrap(), &config);

    let entries = provider.option_chain("AAPL").await.unwrap();

    // the first page already carries the nearest expiry, it is not asked for again
    assert_eq!(
        stub.targets(),
        vec!["/v7/finance/options/AAPL".to_string(), dated(second), dated(third)]
    );
    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(|e| e.underlying == "AAPL" && e.underlying_price == 105.0));
    let expirations: Vec<Option<i64>> = entries.iter().map(|e| e.contract.expiration).collect();
    assert_eq!(
        expirations,
        vec![Some(first), Some(first), Some(second), Some(second), Some(third), Some(third)]
    );
    assert!(stub.heads().iter().all(|h| h.contains("user-agent: mozilla/5.0")));
}

#[tokio::test]
async fn failing_later_expiry_fails_the_ticker() {
    let [first, second, third] = EXPIRIES;
    let stub = Stub::serve(vec![
        route("/v7/finance/options/AAPL", 200, page("AAPL", first, &EXPIRIES)),
        route(&dated(second), 200, page("AAPL", second, &EXPIRIES)),
        route(&dated(third), 500, "internal error"),
    ])
    .await;
    let config = config(&stub);
    let provider = YahooFinance::new(optchain_spider::std_client_build(&config).unwrap(), &config);

    let err = provider.option_chain("AAPL").await.unwrap_err();

    assert!(matches!(err, SpiderError::Provider(_)), "{err}");
    assert!(err.to_string().contains("500"), "{err}");
    assert_eq!(stub.targets().len(), 3);
}

#[tokio::test]
async fn share_classes_are_requested_with_a_dash() {
    let [first, ..] = EXPIRIES;
    let stub = Stub::serve(vec![route(
        "/v7/finance/options/BRK-B",
        200,
        page("BRK-B", first, &[first]),
    )])
    .await;
    let config = config(&stub);
    let provider = YahooFinance::new(optchain_spider::std_client_build(&config).unwrap(), &config);

    let entries = provider.option_chain("BRK.B").await.unwrap();

    assert_eq!(stub.targets(), vec!["/v7/finance/options/BRK-B"]);
    assert_eq!(entries.len(), 2);
}
