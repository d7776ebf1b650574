use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use yamaro_core::Collection;

use super::r#trait::{Filter, Query, RecordStore, RecordStoreError, Row};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: u64,
}

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance: every read scans
/// the whole table.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<Collection, Table>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        let tables = Collection::ALL
            .into_iter()
            .map(|c| (c, Table { rows: Vec::new(), next_id: 1 }))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held by a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .map(|t| t.get(&collection).map(|t| t.rows.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn poisoned() -> RecordStoreError {
        RecordStoreError::Transport("lock poisoned".to_string())
    }
}

/// Equality as a typed column sees it: numbers compare by value, and a
/// string filter against a number column is read as a number.
fn values_match(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64() == b.as_f64(),
        (JsonValue::Number(n), JsonValue::String(s))
        | (JsonValue::String(s), JsonValue::Number(n)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        _ => left == right,
    }
}

fn row_matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| match f {
        Filter::Eq { column, value } => row.get(column).is_some_and(|v| values_match(v, value)),
    })
}

fn project(row: &Row, columns: Option<&[String]>) -> Row {
    match columns {
        None => row.clone(),
        Some(columns) => columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect(),
    }
}

fn key_of<'a>(
    row: &'a Row,
    conflict_keys: &[&str],
) -> Result<Vec<&'a JsonValue>, RecordStoreError> {
    conflict_keys
        .iter()
        .map(|k| match row.get(*k) {
            Some(JsonValue::Null) | None => {
                Err(RecordStoreError::MissingConflictKey(k.to_string()))
            }
            Some(v) => Ok(v),
        })
        .collect()
}

fn same_key(a: &[&JsonValue], b: &[&JsonValue]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn select(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Row>, RecordStoreError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        let Some(table) = tables.get(&collection) else {
            return Ok(Vec::new());
        };

        Ok(table
            .rows
            .iter()
            .filter(|row| row_matches(row, &query.filters))
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, RecordStoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let table = tables.entry(collection).or_default();
        let assigns_ids = collection.conflict_keys() == ["id"];

        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            if assigns_ids && !row.contains_key("id") {
                table.next_id = table.next_id.max(1);
                row.insert("id".to_string(), JsonValue::from(table.next_id));
                table.next_id += 1;
            }
            table.rows.push(row.clone());
            inserted.push(row);
        }

        Ok(inserted)
    }

    async fn upsert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, RecordStoreError> {
        // Validate the whole batch before touching the table (all or nothing).
        for row in &rows {
            key_of(row, conflict_keys)?;
        }

        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let table = tables.entry(collection).or_default();

        let mut written = Vec::with_capacity(rows.len());
        for row in rows {
            let key = key_of(&row, conflict_keys)?;
            let existing = table
                .rows
                .iter()
                .position(|r| key_of(r, conflict_keys).is_ok_and(|k| same_key(&k, &key)));

            match existing {
                Some(idx) => {
                    let target = &mut table.rows[idx];
                    for (column, value) in row {
                        target.insert(column, value);
                    }
                    written.push(target.clone());
                }
                None => {
                    table.rows.push(row.clone());
                    written.push(row);
                }
            }
        }

        Ok(written)
    }
}
