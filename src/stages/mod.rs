//! Built-in stages: SQLite page fetch, cross-database page compare, capacity check.

pub mod capacity;
pub mod compare;
pub mod sqlite;

pub use capacity::CapacityCheck;
pub use compare::{SqliteCompare, digest_rows};
pub use sqlite::{
    SqliteFetch, column_names, count_rows, default_total_rows_query, fetch_values,
    open_read_only, page_window_query, quote_ident,
};
