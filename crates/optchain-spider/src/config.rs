use crate::error::SpiderError;
use crate::http::var;
use crate::stock::quotes::{parse_columns, Column, FULL_COLUMNS};
use std::time::Duration;

pub const DEFAULT_TICKER_SOURCE_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";
pub const DEFAULT_TICKER_TABLE_SELECTOR: &str = "table.wikitable.sortable";
pub const DEFAULT_MARKET: &str = "yahoo";
pub const DEFAULT_PROVIDER_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Quote providers the spider can talk to.
pub const SUPPORTED_MARKETS: [&str; 1] = [DEFAULT_MARKET];

/// When the ingestor commits its inserts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommitMode {
    /// Commit after every ticker that was fully inserted.
    PerTicker,
    /// A single transaction for the whole run.
    #[default]
    EndOfRun,
}

impl std::str::FromStr for CommitMode {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "per-ticker" => Ok(CommitMode::PerTicker),
            "end-of-run" => Ok(CommitMode::EndOfRun),
            other => Err(SpiderError::config(format!(
                "unknown commit mode \"{other}\", expected per-ticker or end-of-run"
            ))),
        }
    }
}

/// Everything a run needs, resolved once at start-up and passed down explicitly.
#[derive(Clone, Debug)]
pub struct Config {
    /// PostgreSQL connection string; only required by commands that touch the database.
    pub database_url: Option<String>,
    pub ticker_source_url: String,
    pub ticker_table_selector: String,
    pub market: String,
    pub provider_url: String,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub commit_mode: CommitMode,
    pub columns: Vec<Column>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            ticker_source_url: DEFAULT_TICKER_SOURCE_URL.to_string(),
            ticker_table_selector: DEFAULT_TICKER_TABLE_SELECTOR.to_string(),
            market: DEFAULT_MARKET.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            commit_mode: CommitMode::default(),
            columns: FULL_COLUMNS.to_vec(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, SpiderError> {
        Self::from_lookup(|key| var(key).ok())
    }

    /// Build a configuration from any key lookup; unset keys fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SpiderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        config.database_url = lookup("OPTIONS_DB_URL");
        if let Some(url) = lookup("TICKER_SOURCE_URL") {
            config.ticker_source_url = url;
        }
        if let Some(selector) = lookup("TICKER_TABLE_SELECTOR") {
            config.ticker_table_selector = selector;
        }
        if let Some(market) = lookup("QUOTE_MARKET") {
            config.market = market.trim().to_ascii_lowercase();
        }
        if let Some(url) = lookup("QUOTE_PROVIDER_URL") {
            config.provider_url = url.trim_end_matches('/').to_string();
        }
        if let Some(user_agent) = lookup("USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|err| {
                SpiderError::config(format!("invalid HTTP_TIMEOUT_SECS \"{secs}\", {err}"))
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = lookup("COMMIT_MODE") {
            config.commit_mode = mode.parse()?;
        }
        if let Some(columns) = lookup("QUOTE_COLUMNS") {
            config.columns = parse_columns(&columns)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SpiderError> {
        if !SUPPORTED_MARKETS.contains(&self.market.as_str()) {
            return Err(SpiderError::config(format!(
                "unsupported quote market \"{}\", expected one of {SUPPORTED_MARKETS:?}",
                self.market
            )));
        }
        if self.http_timeout.is_zero() {
            return Err(SpiderError::config("HTTP timeout must be positive"));
        }
        if self.columns.is_empty() {
            return Err(SpiderError::config("column list is empty"));
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str, SpiderError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| SpiderError::config("environment variable OPTIONS_DB_URL is not set"))
    }
}
