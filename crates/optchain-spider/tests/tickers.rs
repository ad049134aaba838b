use optchain_spider::stock::tickers::{parse_tickers, scrape};
use optchain_spider::{Config, SpiderError};

const CONSTITUENTS: &str = include_str!("fixtures/sp500_constituents.html");

#[test]
fn constituents_table_in_row_order() {
    let tickers = parse_tickers(CONSTITUENTS, "table.wikitable.sortable").unwrap();
    assert_eq!(tickers, vec!["MMM", "AOS", "BRK.B", "ZTS"]);
}

#[test]
fn selector_picks_the_table() {
    let changes = parse_tickers(CONSTITUENTS, "table#changes").unwrap();
    assert_eq!(changes, vec!["June 24, 2024"]);

    let err = parse_tickers(CONSTITUENTS, "table#constituents-2023").unwrap_err();
    assert!(matches!(err, SpiderError::Parse(_)));
}

#[tokio::test]
async fn unreachable_source_is_a_fetch_error() {
    let config = Config {
        // nothing listens on port 1
        ticker_source_url: "http://127.0.0.1:1/".to_string(),
        http_timeout: std::time::Duration::from_millis(200),
        ..Config::default()
    };
    let http_client = optchain_spider::std_client_build(&config).unwrap();

    let err = scrape(&http_client, &config).await.unwrap_err();
    assert!(matches!(err, SpiderError::Fetch(_)), "{err}");
}

#[tokio::test]
#[ignore] // Requires network
async fn scrape_live_constituents() {
    let config = Config::default();
    let http_client = optchain_spider::std_client_build(&config).unwrap();

    let tickers = scrape(&http_client, &config).await.unwrap();
    println!("scraped {} tickers", tickers.len());
    assert!(tickers.len() > 400);
    assert!(tickers.iter().any(|t| t == "MMM"));
}
