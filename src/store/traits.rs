use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::record::{Record, RecordUpdate};

/// Column filter for a records fetch, e.g. `{"id": [7]}`.
pub type RecordFilter = Map<String, Value>;

/// Build a filter matching a single row id.
pub fn filter_by_id(id: i64) -> RecordFilter {
    let mut filter = Map::new();
    filter.insert("id".to_string(), Value::from(vec![id]));
    filter
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch rows from `table`, optionally restricted by a column filter.
    async fn fetch_table(&self, table: &str, filter: Option<&RecordFilter>)
        -> Result<Vec<Record>>;

    /// Apply partial updates to existing rows. Never creates or deletes rows.
    async fn update_records(&self, table: &str, updates: &[RecordUpdate]) -> Result<()>;

    /// Run a read-only SQL statement, returning one fields map per row.
    async fn run_sql(&self, statement: &str) -> Result<Vec<Map<String, Value>>>;
}
