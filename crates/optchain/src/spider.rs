use crate::cli::CommitArg;
use optchain_spider::http::*;
use optchain_spider::stock::ingest::{IngestSummary, Ingestor, RunOutcome};
use optchain_spider::stock::quotes::parse_columns;
use optchain_spider::stock::{sink, tickers, yahoo_finance::YahooFinance};
use optchain_spider::tui::RunProgress;
use optchain_spider::{CommitMode, Config};
use std::process::ExitCode;
use tokio_postgres::{self as pg, NoTls};
use tracing::{debug, error, info, trace};

/// Command line overrides of the environment configuration.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub commit_mode: Option<CommitArg>,
    pub columns: Option<String>,
}

pub(crate) fn load_config(overrides: Overrides) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(mode) = overrides.commit_mode {
        config.commit_mode = match mode {
            CommitArg::PerTicker => CommitMode::PerTicker,
            CommitArg::EndOfRun => CommitMode::EndOfRun,
        };
    }
    if let Some(columns) = overrides.columns {
        config.columns = parse_columns(&columns)?;
    }
    config.validate()?;
    trace!("configuration loaded: {config:?}");
    Ok(config)
}

/// Open the single database connection of the run; the connection task ends when the client
/// is dropped.
async fn connect(config: &Config) -> anyhow::Result<PgClient> {
    trace!("connecting to the options database ...");
    let (pg_client, pg_conn) = pg::connect(config.database_url()?, NoTls)
        .await
        .map_err(|err| {
            error!("options database connection error: {}", err);
            err
        })?;

    tokio::spawn(async move {
        if let Err(err) = pg_conn.await {
            error!("options database connection error: {}", err);
        }
    });
    debug!("options database connection established");

    Ok(pg_client)
}

/// Scrape the tickers and ingest their option chains.
pub(crate) async fn run(
    config: Config,
    limit: Option<usize>,
    tui: bool,
) -> anyhow::Result<ExitCode> {
    let time = std::time::Instant::now();
    let http_client = optchain_spider::std_client_build(&config)?;
    let pg_client = connect(&config).await?;

    // ticker failures are fatal; nothing to ingest without them
    let mut tickers = tickers::scrape(&http_client, &config).await?;
    if let Some(limit) = limit {
        tickers.truncate(limit);
    }
    info!("{} tickers to collect", tickers.len());

    let mut sink = sink::PgSink::prepare(&pg_client, &config.columns).await?;

    let provider = YahooFinance::new(http_client, &config);
    let ingestor = Ingestor::from_config(provider, &config)
        .with_progress(RunProgress::for_run(tickers.len(), tui));
    let summary = ingestor.ingest(&tickers, &mut sink).await?;

    info!(
        "spider finished collecting option chains, time elapsed: {:?}",
        time.elapsed()
    );
    if tui {
        report(&summary);
    }

    Ok(exit_code(&summary))
}

/// Print the scraped tickers, one per line.
pub(crate) async fn list_tickers(config: Config) -> anyhow::Result<()> {
    let http_client = optchain_spider::std_client_build(&config)?;
    for ticker in tickers::scrape(&http_client, &config).await? {
        println!("{ticker}");
    }
    Ok(())
}

/// Create the `OptionQuotes` table for the configured columns.
pub(crate) async fn init(config: Config) -> anyhow::Result<()> {
    let pg_client = connect(&config).await?;
    sink::create_table(&pg_client, &config.columns).await?;
    info!("OptionQuotes ready with {} columns", config.columns.len());
    Ok(())
}

fn report(summary: &IngestSummary) {
    println!(
        "{} succeeded, {} failed, {} rows inserted",
        summary.successes(),
        summary.failures(),
        summary.rows_inserted
    );
    for failure in &summary.failed {
        println!("  failed to update {} because: {}", failure.ticker, failure.reason);
    }
}

/// 0 when nothing failed, 2 for a partial run, 3 when every ticker failed.
pub(crate) fn exit_code(summary: &IngestSummary) -> ExitCode {
    match summary.outcome() {
        RunOutcome::Empty | RunOutcome::Complete => ExitCode::SUCCESS,
        RunOutcome::Partial => ExitCode::from(2),
        RunOutcome::Failed => ExitCode::from(3),
    }
}
