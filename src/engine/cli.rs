//! CLI command handler: count rows, paginate, run the stage pipeline, report.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use crate::engine::arg_parser::Cli;
use crate::pipeline::failed_pages;
use crate::stages::{CapacityCheck, SqliteCompare, SqliteFetch, column_names, count_rows};
use crate::types::{ErrorPolicy, Opts};
use crate::utils::pagerun_toml::{apply_file_to_opts, load_pagerun_toml};
use crate::utils::{page_records, resolve_conn_string, setup_logging, write_csv};
use crate::{Job, job_from_opts};

/// Overwrite opts field from CLI when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $opts_field:ident) => {
        if let Some(v) = $cli.$cli_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    if cli.db.is_some() {
        opts.conn_string = cli.db.clone();
    }
    if cli.compare.is_some() {
        opts.compare_conn_string = cli.compare.clone();
    }
    if cli.total_rows_query.is_some() {
        opts.total_rows_query = cli.total_rows_query.clone();
    }
    if cli.workers.is_some() {
        opts.process_limit = cli.workers;
    }
    if cli.csv.is_some() {
        opts.csv_path = cli.csv.clone();
    }
    apply_cli_opt!(cli, opts, table => table_name);
    apply_cli_opt!(cli, opts, index_field => index_field);
    apply_cli_opt!(cli, opts, page_size => page_size);
    apply_cli_opt!(cli, opts, verbose => verbose);
    apply_cli_opt!(cli, opts, profile => profile);
    if let Some(start) = cli.start {
        opts.page_range.start = start;
    }
    if let Some(stop) = cli.stop {
        opts.page_range.stop = stop;
    }
    if let Some(collect_all) = cli.collect_all {
        opts.error_policy = if collect_all {
            ErrorPolicy::CollectAll
        } else {
            ErrorPolicy::FailFast
        };
    }
    opts.json = cli.json;
}

/// Config file first, then CLI on top.
fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let file = load_pagerun_toml(&cli.config_dir);
    if let Some(file) = &file {
        apply_file_to_opts(file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    setup_logging(opts.verbose);
    if file.is_some() {
        debug!("Loaded config from {}", cli.config_dir.display());
    }
    opts
}

/// Stages for the CLI: fetch, optional compare, capacity check. Call after paginate so
/// the stages see the effective page size.
fn add_cli_stages(job: Job, opts: &Opts) -> Job {
    let fetch = SqliteFetch::new(&job.conn_string, &job.table_name, job.page_size);
    let compare = opts
        .compare_conn_string
        .as_deref()
        .map(|target| SqliteCompare::new(target, &job.table_name, job.page_size));
    let mut job = job.with_stage(fetch);
    if let Some(compare) = compare {
        job = job.with_stage(compare);
    }
    job.with_stage(CapacityCheck)
}

/// Count, paginate, run, then write CSV and print the summary.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let mut opts = setup_opts(cli);
    if opts.table_name.is_empty() {
        bail!("no table given: pass --table or set `table` in the config file");
    }
    let conn_string = resolve_conn_string(opts.conn_string.as_deref(), &cli.config_dir)?;
    opts.conn_string = Some(conn_string.clone());

    let mut job = job_from_opts(&opts, &conn_string);
    let max_rows = count_rows(&job.conn_string, &job.total_rows_query)
        .with_context(|| format!("count rows with `{}`", job.total_rows_query))?;
    info!("{} rows in {}", max_rows, job.table_name);
    job.paginate(max_rows)?;
    let job = add_cli_stages(job, &opts);

    let token = job.cancel_token();
    ctrlc::set_handler(move || {
        token.cancel();
    })
    .context("set Ctrl+C handler")?;

    let pages = job.run()?;

    let failed = failed_pages(&pages).count();
    for page in failed_pages(&pages) {
        for err in &page.errors {
            warn!("{}", err);
        }
    }

    if let Some(path) = &opts.csv_path {
        let header = column_names(&job.conn_string, &job.table_name)?;
        let written = write_csv(path, &header, page_records(&pages))?;
        info!("Wrote {} rows to {}", written, path.display());
    }

    let summary = job.summarize(&pages);
    if opts.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize run summary")?
        );
    } else {
        info!(
            "{} pages, {} rows, {} failed",
            summary.pages, summary.rows, failed
        );
    }
    Ok(())
}
