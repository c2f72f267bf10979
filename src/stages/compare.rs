//! Page comparison against a second database using blake3 digests of the row values.

use anyhow::{Context, Result, bail};
use blake3::Hasher;

use crate::stage::Stager;
use crate::types::{Page, Value};

use super::sqlite::{fetch_values, open_read_only, page_window_query};

fn hash_value(hasher: &mut Hasher, value: &Value) {
    match value {
        Value::Null => {
            hasher.update(&[0]);
        }
        Value::Integer(i) => {
            hasher.update(&[1]);
            hasher.update(&i.to_le_bytes());
        }
        Value::Real(f) => {
            hasher.update(&[2]);
            hasher.update(&f.to_bits().to_le_bytes());
        }
        Value::Text(s) => {
            hasher.update(&[3]);
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        Value::Blob(b) => {
            hasher.update(&[4]);
            hasher.update(&(b.len() as u64).to_le_bytes());
            hasher.update(b);
        }
    }
}

/// Blake3 digest over an ordered set of rows. Equal iff the rows and their order are equal.
pub fn digest_rows<I>(rows: I) -> [u8; 32]
where
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut hasher = Hasher::new();
    for row in rows {
        hasher.update(&(row.len() as u64).to_le_bytes());
        for value in &row {
            hash_value(&mut hasher, value);
        }
    }
    *hasher.finalize().as_bytes()
}

/// Compares the rows already on the page (from an earlier fetch stage) with the same
/// window of `table_name` in `target_conn_string`. Fails on any difference.
#[derive(Clone, Debug)]
pub struct SqliteCompare {
    pub target_conn_string: String,
    pub table_name: String,
    pub page_size: usize,
}

impl SqliteCompare {
    pub fn new(target_conn_string: &str, table_name: &str, page_size: usize) -> Self {
        Self {
            target_conn_string: target_conn_string.to_string(),
            table_name: table_name.to_string(),
            page_size,
        }
    }
}

impl Stager for SqliteCompare {
    fn query_page(&self, page: &mut Page) -> Result<()> {
        let conn = open_read_only(&self.target_conn_string)
            .with_context(|| format!("open {}", self.target_conn_string))?;
        let sql = self.paginate_query(page);
        let target = fetch_values(&conn, &sql).with_context(|| format!("query `{sql}`"))?;
        if target.len() != page.rows.len() {
            bail!(
                "row count differs: {} in source, {} in target",
                page.rows.len(),
                target.len()
            );
        }
        let source_digest = digest_rows(page.rows.iter().map(|r| r.unpack()));
        let target_digest = digest_rows(target);
        if source_digest != target_digest {
            bail!("row contents differ from target");
        }
        Ok(())
    }

    fn paginate_query(&self, page: &Page) -> String {
        page_window_query(&self.table_name, page, self.page_size)
    }

    fn name(&self) -> &str {
        "sqlite-compare"
    }
}
