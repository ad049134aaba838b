pub mod config;
pub mod error;
pub mod stock;
pub mod tui;

pub use config::{CommitMode, Config};
pub use error::{ErrorKind, SpiderError};

/// Shortcut for required API elements.
pub mod http {
    pub use dotenv::var;
    pub use reqwest::Client as HttpClient;
    pub use tokio_postgres::Client as PgClient;
}

/// Build the shared HTTP client from the run configuration.
///
/// Both the ticker page and the quote provider are queried with the configured `User-Agent`;
/// the ticker source refuses requests without a browser-like agent.
pub fn std_client_build(config: &Config) -> Result<http::HttpClient, SpiderError> {
    reqwest::ClientBuilder::new()
        .user_agent(&config.user_agent)
        .timeout(config.http_timeout)
        .build()
        .map_err(|err| SpiderError::config(format!("failed to build reqwest client, {err}")))
}

/// Pretty-print the elapsed time since `time`.
pub fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:?}", time.elapsed())
}
