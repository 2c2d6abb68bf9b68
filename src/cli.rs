use clap::{Args, Parser, Subcommand};

use crate::paginate::{
    DEFAULT_BASE_URL, DEFAULT_DELAY_SECS, DEFAULT_PAGE_SIZE, DEFAULT_TOTAL_RECORDS,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Defaults to `build` with every option at its default.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl the listing, normalize it and write the SQL files.
    Build(BuildArgs),
    /// Crawl the listing into a JSON Lines rows snapshot.
    Crawl(CrawlArgs),
    /// Normalize a rows snapshot and write the SQL files.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Listing endpoint; the paging query is appended to it.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Number of rows the listing holds.
    #[arg(long, default_value_t = DEFAULT_TOTAL_RECORDS)]
    pub total: usize,

    /// Rows requested per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub per_page: usize,

    /// Delay before every page after the first (politeness).
    #[arg(long, default_value_t = DEFAULT_DELAY_SECS)]
    pub delay_secs: u64,
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            total: DEFAULT_TOTAL_RECORDS,
            per_page: DEFAULT_PAGE_SIZE,
            delay_secs: DEFAULT_DELAY_SECS,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output directory for the `.sql` files.
    #[arg(long, default_value = ".")]
    pub out: String,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            source: SourceArgs::default(),
            out: ".".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CrawlArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file path for the rows snapshot (`rows.jsonl`).
    #[arg(long)]
    pub out: String,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Rows snapshot (created by `crawl`).
    #[arg(long)]
    pub rows: String,

    /// Output directory for the `.sql` files.
    #[arg(long, default_value = ".")]
    pub out: String,
}
