use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape the S&P 500 tickers and collect their option chains into OptionQuotes.
    Spider {
        /// When to commit inserted quotes; overrides COMMIT_MODE.
        #[arg(short, long)]
        commit_mode: Option<CommitArg>,

        /// Column set of the OptionQuotes table: `full`, `legacy`, or a comma separated list;
        /// overrides QUOTE_COLUMNS.
        #[arg(long)]
        columns: Option<String>,

        /// Only ingest the first N tickers of the list.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the scraped ticker list without touching the database.
    Tickers,

    /// Create the OptionQuotes table if it does not exist.
    Init {
        /// Column set of the table; overrides QUOTE_COLUMNS.
        #[arg(long)]
        columns: Option<String>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommitArg {
    /// Commit after every ticker.
    PerTicker,

    /// One transaction for the whole run.
    EndOfRun,
}
