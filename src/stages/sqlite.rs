//! SQLite-backed page fetch: read one page window of a table into `page.rows`.

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};

use crate::error::JobResult;
use crate::stage::Stager;
use crate::types::{Page, Value};

/// Open a read-only connection. Each call gets its own connection, so stages stay `Sync`.
pub fn open_read_only(conn_string: &str) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        conn_string,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

/// Double-quote an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SELECT COUNT(*)` over the whole table.
pub fn default_total_rows_query(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

/// Run a total-rows query (first column of the first row) to get `max_rows` for pagination.
pub fn count_rows(conn_string: &str, total_rows_query: &str) -> JobResult<usize> {
    let conn = open_read_only(conn_string)?;
    let n: i64 = conn.query_row(total_rows_query, [], |row| row.get(0))?;
    Ok(n.max(0) as usize)
}

/// Column names of `table`, in select order. Used as the CSV header.
pub fn column_names(conn_string: &str, table: &str) -> JobResult<Vec<String>> {
    let conn = open_read_only(conn_string)?;
    let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 0", quote_ident(table)))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

/// The LIMIT/OFFSET window selecting page `page` of `table`. Rows are ordered by the page's
/// index field (rowid when it has none) so windows never overlap.
pub fn page_window_query(table: &str, page: &Page, page_size: usize) -> String {
    let order_by = if page.index_field.is_empty() {
        "rowid".to_string()
    } else {
        quote_ident(&page.index_field)
    };
    let offset = page.number.saturating_sub(1) * page_size;
    format!(
        "SELECT * FROM {} ORDER BY {} LIMIT {} OFFSET {}",
        quote_ident(table),
        order_by,
        page.total_rows,
        offset
    )
}

/// Run `sql` and return every row as a value sequence.
pub fn fetch_values(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Vec<Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    let rows = stmt.query_map([], |row| {
        (0..width)
            .map(|i| row.get_ref(i).map(Value::from))
            .collect::<rusqlite::Result<Vec<Value>>>()
    })?;
    rows.collect()
}

/// Populates each page with its window of `table`, packed through the page's row type.
#[derive(Clone, Debug)]
pub struct SqliteFetch {
    pub conn_string: String,
    pub table_name: String,
    /// Must match the job's effective page size; it positions the window offset.
    pub page_size: usize,
}

impl SqliteFetch {
    pub fn new(conn_string: &str, table_name: &str, page_size: usize) -> Self {
        Self {
            conn_string: conn_string.to_string(),
            table_name: table_name.to_string(),
            page_size,
        }
    }
}

impl Stager for SqliteFetch {
    fn query_page(&self, page: &mut Page) -> Result<()> {
        let conn = open_read_only(&self.conn_string)
            .with_context(|| format!("open {}", self.conn_string))?;
        let sql = self.paginate_query(page);
        let values = fetch_values(&conn, &sql).with_context(|| format!("query `{sql}`"))?;
        page.rows.reserve(values.len());
        for v in values {
            let row = page.row_type.pack(v);
            page.rows.push(row);
        }
        Ok(())
    }

    fn paginate_query(&self, page: &Page) -> String {
        page_window_query(&self.table_name, page, self.page_size)
    }

    fn name(&self) -> &str {
        "sqlite-fetch"
    }
}
