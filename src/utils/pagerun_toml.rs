//! Load `.pagerun.toml` from a directory (CLI only). Library callers configure a `Job` directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::{ErrorPolicy, Opts, Range};
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PagerunToml {
    #[serde(default)]
    job: JobSection,
}

#[derive(Debug, Default, Deserialize)]
struct JobSection {
    conn_string: Option<String>,
    compare_conn_string: Option<String>,
    table: Option<String>,
    index_field: Option<String>,
    total_rows_query: Option<String>,
    page_size: Option<usize>,
    process_limit: Option<usize>,
    page_range: Option<Range>,
    error_policy: Option<ErrorPolicy>,
    verbose: Option<bool>,
    profile: Option<bool>,
    csv: Option<String>,
}

/// Load the config file from `dir` if present. Returns None if missing or unreadable.
pub(crate) fn load_pagerun_toml(dir: &Path) -> Option<PagerunToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_pagerun_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_pagerun_toml(s: &str) -> Result<PagerunToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &PagerunToml, opts: &mut Opts) {
    let job = &file.job;
    if job.conn_string.is_some() {
        opts.conn_string = job.conn_string.clone();
    }
    if job.compare_conn_string.is_some() {
        opts.compare_conn_string = job.compare_conn_string.clone();
    }
    if job.total_rows_query.is_some() {
        opts.total_rows_query = job.total_rows_query.clone();
    }
    if job.process_limit.is_some() {
        opts.process_limit = job.process_limit;
    }
    apply_file_opt!(job, opts, table => table_name);
    apply_file_opt!(job, opts, index_field => index_field);
    apply_file_opt!(job, opts, page_size => page_size);
    apply_file_opt!(job, opts, page_range => page_range);
    apply_file_opt!(job, opts, error_policy => error_policy);
    apply_file_opt!(job, opts, verbose => verbose);
    apply_file_opt!(job, opts, profile => profile);
    if let Some(ref p) = job.csv {
        opts.csv_path = Some(PathBuf::from(p));
    }
}
