use crate::config::Config;
use crate::error::SpiderError;
use crate::http::*;
use scraper::{Html, Selector};
use tracing::{debug, error, trace};

/// A stock symbol as listed by the ticker source; duplicates are kept.
pub type Ticker = String;

// scrape
// ----------------------------------------------------------------------------

/// Fetch the ticker page and return the first cell of every row of the ticker table, in row
/// order.
pub async fn scrape(http_client: &HttpClient, config: &Config) -> Result<Vec<Ticker>, SpiderError> {
    let time = std::time::Instant::now();
    let url = &config.ticker_source_url;

    debug!("fetching ticker list from {url}");
    let response = http_client.get(url).send().await.map_err(|err| {
        error!("failed to fetch ticker list, error({err})");
        SpiderError::fetch(format!("GET {url} failed, {err}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        error!("failed to fetch ticker list, error(status {status})");
        return Err(SpiderError::fetch(format!("GET {url} returned {status}")));
    }

    let body = response.text().await.map_err(|err| {
        error!("failed to read ticker list body, error({err})");
        SpiderError::fetch(format!("reading body of {url} failed, {err}"))
    })?;

    let tickers = parse_tickers(&body, &config.ticker_table_selector)?;
    debug!("{} tickers scraped. {}", tickers.len(), crate::time_elapsed(time));

    Ok(tickers)
}

// de
// ----------------------------------------------------------------------------

/// Extract tickers from an HTML document.
///
/// The first element matching `table_selector` is the ticker table; each `tr` holding at least
/// one `td` yields the trimmed text of its first `td`. Header rows (`th` only) are skipped.
pub fn parse_tickers(html: &str, table_selector: &str) -> Result<Vec<Ticker>, SpiderError> {
    let table_selector = Selector::parse(table_selector).map_err(|err| {
        SpiderError::parse(format!("invalid table selector \"{table_selector}\", {err}"))
    })?;
    // both selectors are static and valid
    let row_selector = Selector::parse("tr").map_err(|err| SpiderError::parse(err.to_string()))?;
    let cell_selector = Selector::parse("td").map_err(|err| SpiderError::parse(err.to_string()))?;

    let document = Html::parse_document(html);
    let table = document.select(&table_selector).next().ok_or_else(|| {
        error!("ticker table not found in page");
        SpiderError::parse("ticker table not found in page")
    })?;

    let tickers: Vec<Ticker> = table
        .select(&row_selector)
        .filter_map(|row| row.select(&cell_selector).next())
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect();
    trace!("parsed tickers: {tickers:?}");

    Ok(tickers)
}
