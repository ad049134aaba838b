mod cli;
mod spider;

// remote imports
use clap::Parser;
use cli::{Cli, TraceLevel};
use spider::Overrides;
use std::process::ExitCode;
use tracing::{error, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preproccess the trace level
fn preprocess(trace_level: Level) -> anyhow::Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> ExitCode {
    match try_main().await {
        Ok(code) => code,
        Err(err) => {
            error!("optchain failed, error({err:#})");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        })?;
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        // `optchain spider`: scrape tickers, collect option chains
        Spider {
            commit_mode,
            columns,
            limit,
        } => {
            let config = spider::load_config(Overrides {
                commit_mode,
                columns,
            })?;
            spider::run(config, limit, tui).await
        }

        // `optchain tickers`: dry run of the ticker list
        Tickers => {
            let config = spider::load_config(Overrides::default())?;
            spider::list_tickers(config).await?;
            Ok(ExitCode::SUCCESS)
        }

        // `optchain init`: create OptionQuotes
        Init { columns } => {
            let config = spider::load_config(Overrides {
                commit_mode: None,
                columns,
            })?;
            spider::init(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
