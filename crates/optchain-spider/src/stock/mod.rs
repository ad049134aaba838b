mod common;
mod sql;

pub use common::{format_timestamp, parse_timestamp, DATETIME_FORMAT};

/// Option quote rows: table columns, provider entries, and the normalisation between them.
pub mod quotes;

/// Ticker list scraped from the [S&P 500 constituents] table.
///
/// [S&P 500 constituents]: https://en.wikipedia.org/wiki/List_of_S%26P_500_companies
pub mod tickers;

/// Options chains from the Yahoo Finance API; inspiration from Python's [yfinance] library.
///
/// [yfinance]: https://github.com/ranaroussi/yfinance/
pub mod yahoo_finance;

/// Sequential per-ticker ingestion of option chains into a [`ingest::QuoteSink`].
pub mod ingest;

/// PostgreSQL [`ingest::QuoteSink`].
pub mod sink;
