use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsflow", about = "Financial-news ingestion worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scheduler loop and run forever until Ctrl-C.
    Run,
    /// Connect to storage, apply migrations if needed, and print row
    /// counts per table.
    Status,
    /// Run exactly one scrape-ingest-flush cycle over a given ticker list
    /// and exit. Useful for smoke-testing against a live proxy without
    /// waiting on the scheduler.
    Once {
        /// Comma-separated ticker symbols, e.g. "AAPL,MSFT,TSLA".
        #[arg(short, long)]
        tickers: String,
    },
}
