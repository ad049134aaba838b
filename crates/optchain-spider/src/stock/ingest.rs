use super::quotes::{ChainEntry, Column, ColumnValue, QuoteRecord};
use super::tickers::Ticker;
use crate::config::{CommitMode, Config};
use crate::error::{ErrorKind, SpiderError};
use crate::tui::RunProgress;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, trace, warn};

/// Source of options chains, keyed by ticker.
///
/// Implementations return entries already joined with their underlying, so no caller ever
/// matches parallel collections by position.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn option_chain(&self, ticker: &str) -> Result<Vec<ChainEntry>, SpiderError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// INSERT-only destination of `OptionQuotes` rows.
///
/// Rows are handed over in the ingestor's column order.
#[async_trait]
pub trait QuoteSink: Send {
    async fn begin(&mut self) -> Result<(), SpiderError>;

    async fn insert(&mut self, row: &[ColumnValue]) -> Result<(), SpiderError>;

    async fn commit(&mut self) -> Result<(), SpiderError>;

    async fn rollback(&mut self) -> Result<(), SpiderError>;
}

// summary
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerSuccess {
    pub ticker: Ticker,
    pub rows: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerFailure {
    pub ticker: Ticker,
    pub kind: ErrorKind,
    pub reason: String,
}

/// How a run ended, as far as the tickers are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to ingest.
    Empty,
    Complete,
    Partial,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub succeeded: Vec<TickerSuccess>,
    pub failed: Vec<TickerFailure>,
    pub rows_inserted: usize,
}

impl IngestSummary {
    pub fn successes(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failures(&self) -> usize {
        self.failed.len()
    }

    pub fn outcome(&self) -> RunOutcome {
        match (self.successes(), self.failures()) {
            (0, 0) => RunOutcome::Empty,
            (_, 0) => RunOutcome::Complete,
            (0, _) => RunOutcome::Failed,
            _ => RunOutcome::Partial,
        }
    }

    fn record_success(&mut self, ticker: &str, rows: usize) {
        self.rows_inserted += rows;
        self.succeeded.push(TickerSuccess {
            ticker: ticker.to_string(),
            rows,
        });
    }

    fn record_failure(&mut self, ticker: &str, err: &SpiderError) {
        self.failed.push(TickerFailure {
            ticker: ticker.to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        });
    }
}

// ingest
// ----------------------------------------------------------------------------

/// Sequential fetch, transform and insert of option chains, one ticker at a time.
pub struct Ingestor<P> {
    provider: P,
    columns: Vec<Column>,
    commit_mode: CommitMode,
    progress: RunProgress,
}

impl<P: QuoteProvider> Ingestor<P> {
    pub fn new(provider: P, columns: Vec<Column>, commit_mode: CommitMode) -> Self {
        Self {
            provider,
            columns,
            commit_mode,
            progress: RunProgress::hidden(),
        }
    }

    pub fn from_config(provider: P, config: &Config) -> Self {
        Self::new(provider, config.columns.clone(), config.commit_mode)
    }

    pub fn with_progress(mut self, progress: RunProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ingest the option chains of `tickers` into `sink`.
    ///
    /// Provider and transform failures are recorded against their ticker and the run moves on.
    /// Any sink failure, or a fatal error out of the provider, rolls back the open transaction
    /// and ends the run with the error.
    pub async fn ingest<S>(
        &self,
        tickers: &[Ticker],
        sink: &mut S,
    ) -> Result<IngestSummary, SpiderError>
    where
        S: QuoteSink + ?Sized,
    {
        let time = std::time::Instant::now();
        let mut summary = IngestSummary::default();

        if tickers.is_empty() {
            info!("no tickers to ingest");
            return Ok(summary);
        }

        info!(
            "ingesting option chains for {} tickers from {} ...",
            tickers.len(),
            self.provider.name()
        );

        if self.commit_mode == CommitMode::EndOfRun {
            sink.begin().await?;
        }

        for ticker in tickers {
            let records = match self.collect(ticker).await {
                Ok(records) => records,
                Err(err) if err.is_fatal() => {
                    error!("failed to update [{ticker}], aborting run, error({err})");
                    self.progress.finish();
                    return Err(abort(sink, err).await);
                }
                Err(err) => {
                    error!("failed to update [{ticker}], error({err})");
                    summary.record_failure(ticker, &err);
                    self.progress.failed();
                    continue;
                }
            };

            if let Err(err) = self.insert(ticker, &records, sink).await {
                self.progress.finish();
                return Err(abort(sink, err).await);
            }

            trace!("[{ticker}] {} option quotes inserted", records.len());
            summary.record_success(ticker, records.len());
            self.progress.succeeded();
        }

        if self.commit_mode == CommitMode::EndOfRun {
            if let Err(err) = sink.commit().await {
                error!("failed to commit option quotes, error({err})");
                self.progress.finish();
                return Err(abort(sink, err).await);
            }
        }
        self.progress.finish();

        info!(
            "option chains ingested: {} succeeded, {} failed, {} rows. {}",
            summary.successes(),
            summary.failures(),
            summary.rows_inserted,
            crate::time_elapsed(time)
        );
        for failure in &summary.failed {
            warn!("[{}] skipped, {} error: {}", failure.ticker, failure.kind, failure.reason);
        }

        Ok(summary)
    }

    /// Fetch and transform a ticker's whole chain before anything of it is written.
    async fn collect(&self, ticker: &str) -> Result<Vec<QuoteRecord>, SpiderError> {
        let entries = self.provider.option_chain(ticker).await?;

        let pricing_time = Utc::now();
        let records = entries
            .iter()
            .map(|entry| QuoteRecord::from_entry(entry, pricing_time))
            .collect::<Result<Vec<QuoteRecord>, SpiderError>>()?;

        debug!("[{ticker}] {} option quotes transformed", records.len());
        Ok(records)
    }

    async fn insert<S>(
        &self,
        ticker: &str,
        records: &[QuoteRecord],
        sink: &mut S,
    ) -> Result<(), SpiderError>
    where
        S: QuoteSink + ?Sized,
    {
        if self.commit_mode == CommitMode::PerTicker {
            sink.begin().await?;
        }

        for record in records {
            let row = record.row(&self.columns);
            sink.insert(&row).await.map_err(|err| {
                error!(
                    "failed to insert option quote {} for [{ticker}], error({err})",
                    record.contract_symbol
                );
                err
            })?;
        }

        if self.commit_mode == CommitMode::PerTicker {
            sink.commit().await.map_err(|err| {
                error!("failed to commit option quotes for [{ticker}], error({err})");
                err
            })?;
        }

        Ok(())
    }
}

/// Roll back whatever is uncommitted and hand back the error that caused it.
async fn abort<S>(sink: &mut S, err: SpiderError) -> SpiderError
where
    S: QuoteSink + ?Sized,
{
    if let Err(rollback_err) = sink.rollback().await {
        error!("failed to roll back option quotes, error({rollback_err})");
    }
    err
}
