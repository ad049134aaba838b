use thiserror::Error;

/// Every failure the spider can raise.
///
/// `Fetch`, `Parse` and `Persistence` abort a run; `Provider` and `Transform` are scoped to a
/// single ticker and only recorded in the [`IngestSummary`](crate::stock::ingest::IngestSummary).
#[derive(Error, Debug)]
pub enum SpiderError {
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Tag of a [`SpiderError`], kept in run summaries where the error itself is not cloneable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Parse,
    Provider,
    Transform,
    Persistence,
    Config,
}

impl SpiderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpiderError::Fetch(_) => ErrorKind::Fetch,
            SpiderError::Parse(_) => ErrorKind::Parse,
            SpiderError::Provider(_) => ErrorKind::Provider,
            SpiderError::Transform(_) => ErrorKind::Transform,
            SpiderError::Persistence(_) => ErrorKind::Persistence,
            SpiderError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the error ends the whole run rather than a single ticker.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Provider | ErrorKind::Transform)
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<tokio_postgres::Error> for SpiderError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Fetch => "fetch",
            ErrorKind::Parse => "parse",
            ErrorKind::Provider => "provider",
            ErrorKind::Transform => "transform",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}
