use super::ingest::QuoteProvider;
use super::quotes::{ChainEntry, ContractQuote};
use crate::config::Config;
use crate::error::SpiderError;
use crate::http::*;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, trace};

// provider
// ----------------------------------------------------------------------------

/// Options chains from the Yahoo Finance `v7/finance/options` endpoint.
pub struct YahooFinance {
    http_client: HttpClient,
    base_url: String,
}

impl YahooFinance {
    pub fn new(http_client: HttpClient, config: &Config) -> Self {
        Self {
            http_client,
            base_url: config.provider_url.clone(),
        }
    }

    /// Fetch one expiry of the chain; `None` returns the nearest expiry along with the list of
    /// all expiration dates.
    async fn fetch(
        &self,
        symbol: &str,
        expiration: Option<i64>,
    ) -> Result<ChainResult, SpiderError> {
        let url = format!("{}/{symbol}", self.base_url);
        let mut request = self.http_client.get(&url);
        if let Some(date) = expiration {
            request = request.query(&[("date", date)]);
        }

        trace!("fetching option chain page for [{symbol}], expiration({expiration:?})");
        let response = request
            .send()
            .await
            .map_err(|err| SpiderError::provider(format!("GET {url} failed, {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpiderError::provider(format!("GET {url} returned {status}")));
        }

        let response: OptionsResponse = response
            .json()
            .await
            .map_err(|err| SpiderError::provider(format!("failed to deserialize {url}, {err}")))?;

        response.into_result(symbol)
    }
}

#[async_trait]
impl QuoteProvider for YahooFinance {
    async fn option_chain(&self, ticker: &str) -> Result<Vec<ChainEntry>, SpiderError> {
        let symbol = provider_symbol(ticker);
        let first = self.fetch(&symbol, None).await.map_err(|err| {
            error!("failed to fetch option chain for [{ticker}], error({err})");
            err
        })?;

        let fetched: Vec<i64> = first.options.iter().filter_map(|o| o.expiration_date).collect();
        let remaining: Vec<i64> = first
            .expiration_dates
            .iter()
            .copied()
            .filter(|date| !fetched.contains(date))
            .collect();

        let mut entries = first.into_entries()?;
        for date in remaining {
            let page = self.fetch(&symbol, Some(date)).await.map_err(|err| {
                error!("failed to fetch option chain for [{ticker}] expiring {date}, error({err})");
                err
            })?;
            entries.extend(page.into_entries()?);
        }

        debug!("[{ticker}] option chain fetched, {} contracts", entries.len());
        Ok(entries)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// Yahoo writes share classes with a dash (`BRK-B`) where listings use a dot (`BRK.B`).
pub fn provider_symbol(ticker: &str) -> String {
    ticker.trim().replace('.', "-")
}

// de
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionChain,
}

#[derive(Debug, Deserialize)]
struct OptionChain {
    result: Option<Vec<ChainResult>>,
    error: Option<ProviderFault>,
}

#[derive(Debug, Deserialize)]
struct ProviderFault {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainResult {
    underlying_symbol: Option<String>,
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: UnderlyingQuote,
    #[serde(default)]
    options: Vec<Expiry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnderlyingQuote {
    symbol: String,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Expiry {
    expiration_date: Option<i64>,
    #[serde(default)]
    calls: Vec<ContractQuote>,
    #[serde(default)]
    puts: Vec<ContractQuote>,
}

impl OptionsResponse {
    fn into_result(self, symbol: &str) -> Result<ChainResult, SpiderError> {
        if let Some(fault) = self.option_chain.error {
            return Err(SpiderError::provider(format!(
                "{symbol}: {} ({})",
                fault.description.unwrap_or_default(),
                fault.code.unwrap_or_default()
            )));
        }

        self.option_chain
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| {
                SpiderError::provider(format!("{symbol}: no results found within http response"))
            })
    }
}

impl ChainResult {
    /// Join every call and put with the underlying quote of the same response.
    fn into_entries(self) -> Result<Vec<ChainEntry>, SpiderError> {
        let underlying = self.underlying_symbol.unwrap_or(self.quote.symbol);
        let underlying_price = self.quote.regular_market_price.ok_or_else(|| {
            SpiderError::provider(format!("{underlying}: missing regularMarketPrice"))
        })?;

        Ok(self
            .options
            .into_iter()
            .flat_map(|expiry| expiry.calls.into_iter().chain(expiry.puts))
            .map(|contract| ChainEntry {
                underlying: underlying.clone(),
                underlying_price,
                contract,
            })
            .collect())
    }
}
