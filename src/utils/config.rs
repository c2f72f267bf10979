//! Application configuration constants.
//! Tuning and defaults in one place.

use std::sync::OnceLock;

// ---- Package / names (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    conn_env_key: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                conn_env_key: format!("{}_CONN", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &'static str {
        self.pkg_name
    }

    /// Per-directory config file, e.g. `.pagerun.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable holding the source connection string, e.g. `PAGERUN_CONN`.
    pub fn conn_env_key(&self) -> &str {
        &self.conn_env_key
    }
}

// ---- Pagination ----

/// Rows per page when the job leaves page size at 0.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ---- Worker threads ----

/// Worker count used when none is configured.
pub struct WorkerLimits;

impl WorkerLimits {
    pub fn default_process_limit() -> usize {
        rayon::current_num_threads().max(1)
    }
}

// ---- Channels ----

/// Pipeline channel capacities. Supply and results are rendezvous channels; the error
/// channel keeps only the first stage error of a run.
pub struct ChannelCaps;

impl ChannelCaps {
    pub const SUPPLY: usize = 0;
    pub const RESULTS: usize = 0;
    pub const ERRORS: usize = 1;
}
