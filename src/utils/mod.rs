pub mod config;
pub mod conn_env;
pub mod csv_out;
pub mod logger;
pub(crate) mod pagerun_toml;
pub mod profile;

pub use config::*;
pub use conn_env::resolve_conn_string;
pub use csv_out::{page_records, write_csv};
pub use logger::setup_logging;
pub use profile::RunProfile;
