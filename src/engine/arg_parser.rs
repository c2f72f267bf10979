use clap::Parser;
use std::path::PathBuf;

/// Paginated table processing: fetch, compare and export a table page by page.
#[derive(Clone, Debug, Parser)]
#[command(name = "pagerun")]
#[command(about = "Split a table into pages and run them through a stage pipeline on a worker pool.")]
pub struct Cli {
    /// Source SQLite database. Default: from .pagerun.toml, PAGERUN_CONN, or .env.
    #[arg(value_name = "DB")]
    pub db: Option<String>,

    /// Table to paginate.
    #[arg(long, short = 't')]
    pub table: Option<String>,

    /// Column that orders rows into pages. Default: rowid.
    #[arg(long, short = 'i')]
    pub index_field: Option<String>,

    /// Rows per page. Default: 10.
    #[arg(long, short = 'p', value_parser = clap::value_parser!(usize))]
    pub page_size: Option<usize>,

    /// Number of worker threads. Default: available parallelism.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// First page to process (1-based).
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub start: Option<usize>,

    /// Last page to process (inclusive). Default: last page.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub stop: Option<usize>,

    /// Compare every page against the same table in this database.
    #[arg(long, short = 'c', value_name = "DB")]
    pub compare: Option<String>,

    /// Query returning the total row count. Default: SELECT COUNT(*) over the table.
    #[arg(long)]
    pub total_rows_query: Option<String>,

    /// Write collected rows to this CSV file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Keep going after stage errors and report failed pages instead of failing the run.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub collect_all: Option<bool>,

    /// Verbose output and progress bar.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Log wall time and memory use of the run.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub profile: Option<bool>,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Directory holding .pagerun.toml and .env. Default: current directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub config_dir: PathBuf,
}
