//! In-memory store for tests. Data is lost when the value is dropped.

use super::{Query, Store, StoreError, StoreResult, Table};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    failing_inserts: RwLock<HashSet<Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with rows (ids are assigned when missing)
    pub fn with_rows(self, table: Table, rows: Vec<Value>) -> Self {
        {
            let mut tables = self.tables.write().unwrap();
            let entry = tables.entry(table).or_default();
            for row in rows {
                entry.push(with_generated_columns(row));
            }
        }
        self
    }

    /// Make every insert into `table` fail with an API error
    pub fn fail_inserts_into(self, table: Table) -> Self {
        self.failing_inserts.write().unwrap().insert(table);
        self
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .read()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, table: Table) -> usize {
        self.rows(table).len()
    }
}

fn with_generated_columns(mut row: Value) -> Value {
    if let Some(object) = row.as_object_mut() {
        object
            .entry("id")
            .or_insert_with(|| json!(Uuid::new_v4().to_string()));
        object
            .entry("created_at")
            .or_insert_with(|| json!(Utc::now().to_rfc3339()));
    }
    row
}

/// PostgREST-style equality on the text form of a column
fn matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => expected == "null",
        Some(other) => other.to_string() == expected,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn text_contains(row: &Value, needle: &str) -> bool {
    ["title", "description", "location_area", "city", "property_type"]
        .iter()
        .filter_map(|column| row.get(*column).and_then(Value::as_str))
        .any(|text| text.to_lowercase().contains(needle))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        if self.failing_inserts.read().unwrap().contains(&table) {
            return Err(StoreError::Api {
                status: 500,
                message: format!("insert into {} rejected", table.name()),
            });
        }
        let row = with_generated_columns(row);
        self.tables
            .write()
            .unwrap()
            .entry(table)
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn exists(&self, table: Table, column: &str, value: &str) -> StoreResult<bool> {
        Ok(self
            .rows(table)
            .iter()
            .any(|row| matches(row, column, value)))
    }

    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.eq.iter().all(|(c, v)| matches(row, c, v)))
            .collect();

        if let Some(column) = &query.order_desc {
            rows.sort_by(|a, b| compare(b.get(column), a.get(column)));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap();
        let rows = tables.entry(table).or_default();
        for row in rows.iter_mut().filter(|row| matches(row, "id", id)) {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> StoreResult<Value> {
        match function {
            "search_properties" => {
                let needle = args
                    .get("search_query")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                let limit = args
                    .get("max_results")
                    .and_then(Value::as_u64)
                    .unwrap_or(10) as usize;
                let hits: Vec<Value> = self
                    .rows(Table::PropertyListings)
                    .into_iter()
                    .filter(|row| needle.is_empty() || text_contains(row, &needle))
                    .take(limit)
                    .collect();
                Ok(Value::Array(hits))
            }
            other => Err(StoreError::UnknownRpc(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_id_and_select_filters() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Table::NewsArticles, json!({"original_url": "a", "relevance_score": 40, "is_posted": false}))
            .await
            .unwrap();
        assert!(stored["id"].is_string());

        store
            .insert(Table::NewsArticles, json!({"original_url": "b", "relevance_score": 90, "is_posted": false}))
            .await
            .unwrap();
        store
            .insert(Table::NewsArticles, json!({"original_url": "c", "relevance_score": 70, "is_posted": true}))
            .await
            .unwrap();

        let rows = store
            .select(
                Table::NewsArticles,
                &Query::new().eq("is_posted", false).order_desc("relevance_score"),
            )
            .await
            .unwrap();
        let urls: Vec<&str> = rows.iter().filter_map(|r| r["original_url"].as_str()).collect();
        assert_eq!(urls, vec!["b", "a"]);

        assert!(store.exists(Table::NewsArticles, "original_url", "c").await.unwrap());
        assert!(!store.exists(Table::NewsArticles, "original_url", "z").await.unwrap());
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new().with_rows(Table::ScrapingJobs, vec![json!({"id": "job-1", "status": "pending"})]);
        store
            .update(Table::ScrapingJobs, "job-1", json!({"status": "running"}))
            .await
            .unwrap();
        assert_eq!(store.rows(Table::ScrapingJobs)[0]["status"], "running");
    }

    #[tokio::test]
    async fn unknown_rpc_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.rpc("nope", json!({})).await,
            Err(StoreError::UnknownRpc(_))
        ));
    }
}
