//! In-memory [`RecordStore`] with optional not-null/unique/delete-restrict rules.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use vstack_core::query::{loose_cmp, loose_eq, ListQuery, Page, Predicate, SortDirection};
use vstack_core::types::{record_id, DbId, Record};

use crate::error::StoreError;
use crate::store::RecordStore;

/// Constraints enforced by [`MemoryStore`] for one table.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    not_null: Vec<String>,
    unique: Vec<String>,
    restrict_delete: bool,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_null(mut self, column: impl Into<String>) -> Self {
        self.not_null.push(column.into());
        self
    }

    pub fn unique(mut self, column: impl Into<String>) -> Self {
        self.unique.push(column.into());
        self
    }

    /// Reject deletes, as a foreign key with `ON DELETE RESTRICT` would.
    pub fn restrict_delete(mut self) -> Self {
        self.restrict_delete = true;
        self
    }
}

#[derive(Debug, Default)]
struct Table {
    next_id: DbId,
    rows: BTreeMap<DbId, Record>,
}

/// A process-local store keyed by table name. Tables spring into existence
/// on first write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    schemas: HashMap<String, TableSchema>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, table: impl Into<String>, schema: TableSchema) -> Self {
        self.schemas.insert(table.into(), schema);
        self
    }

    /// Number of store calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Snapshot of every row in `table`, by id.
    pub async fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    }

    fn check_constraints(
        &self,
        table_name: &str,
        table: &Table,
        id: DbId,
        row: &Record,
    ) -> Result<(), StoreError> {
        let Some(schema) = self.schemas.get(table_name) else {
            return Ok(());
        };

        for column in &schema.not_null {
            if row.get(column).map_or(true, Value::is_null) {
                return Err(StoreError::Constraint(format!(
                    "null value in column \"{column}\" of relation \"{table_name}\""
                )));
            }
        }

        for column in &schema.unique {
            let Some(value) = row.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = table
                .rows
                .iter()
                .any(|(other_id, other)| *other_id != id && other.get(column) == Some(value));
            if clash {
                return Err(StoreError::Constraint(format!(
                    "duplicate key value violates unique constraint on \"{table_name}\".\"{column}\""
                )));
            }
        }

        Ok(())
    }
}

fn compare_rows(a: &Record, b: &Record, field: &str) -> Ordering {
    let left = a.get(field).unwrap_or(&Value::Null);
    let right = b.get(field).unwrap_or(&Value::Null);
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        // NULLs sort last ascending, as PostgreSQL does.
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => loose_cmp(left, right).unwrap_or(Ordering::Equal),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn paginate(&self, table: &str, query: &ListQuery) -> Result<Page<Record>, StoreError> {
        self.touch();
        let tables = self.tables.read().await;
        let condition = query.condition();

        let mut matched: Vec<&Record> = tables
            .get(table)
            .map(|t| t.rows.values().filter(|r| condition.matches(r)).collect())
            .unwrap_or_default();

        matched.sort_by(|a, b| {
            let ord = compare_rows(a, b, &query.order.field);
            match query.order.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = matched.len() as u64;
        let data = matched
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.per_page as usize)
            .cloned()
            .collect();

        Ok(Page::new(data, total, query.page, query.per_page))
    }

    async fn select(
        &self,
        table: &str,
        condition: &Predicate,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, StoreError> {
        self.touch();
        let tables = self.tables.read().await;
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        Ok(tables
            .get(table)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|r| condition.matches(r))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find(&self, table: &str, id: DbId) -> Result<Option<Record>, StoreError> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn find_by(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<Option<Record>, StoreError> {
        self.touch();
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|t| {
            t.rows
                .values()
                .find(|r| r.get(column).is_some_and(|v| loose_eq(v, value)))
                .cloned()
        }))
    }

    async fn create(&self, table: &str, mut attributes: Record) -> Result<Record, StoreError> {
        self.touch();
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.to_string()).or_default();

        let id = match record_id(&attributes) {
            Some(id) if entry.rows.contains_key(&id) => {
                return Err(StoreError::Constraint(format!(
                    "duplicate key value violates primary key of \"{table}\""
                )));
            }
            Some(id) => id,
            None => entry.next_id + 1,
        };
        attributes.insert("id".to_string(), Value::from(id));

        self.check_constraints(table, entry, id, &attributes)?;

        entry.next_id = entry.next_id.max(id);
        entry.rows.insert(id, attributes.clone());
        tracing::debug!(table, id, "Memory store: row created");
        Ok(attributes)
    }

    async fn update(
        &self,
        table: &str,
        id: DbId,
        attributes: Record,
    ) -> Result<Option<Record>, StoreError> {
        self.touch();
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.get_mut(table) else {
            return Ok(None);
        };
        let Some(existing) = entry.rows.get(&id) else {
            return Ok(None);
        };

        let mut merged = existing.clone();
        for (column, value) in attributes {
            if column != "id" {
                merged.insert(column, value);
            }
        }
        self.check_constraints(table, entry, id, &merged)?;

        entry.rows.insert(id, merged.clone());
        Ok(Some(merged))
    }

    async fn delete(&self, table: &str, id: DbId) -> Result<bool, StoreError> {
        self.touch();
        if self
            .schemas
            .get(table)
            .is_some_and(|schema| schema.restrict_delete)
        {
            return Err(StoreError::Constraint(format!(
                "delete on \"{table}\" violates a restricting foreign key"
            )));
        }
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(table)
            .is_some_and(|t| t.rows.remove(&id).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use vstack_core::query::{OrderBy, SortDirection};

    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 41)] {
            store
                .create("people", record(json!({"name": name, "age": age})))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = seeded().await;
        let ids: Vec<_> = store
            .rows("people")
            .await
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn paginate_orders_filters_and_counts() {
        let store = seeded().await;
        let query = ListQuery::new(
            OrderBy {
                field: "age".into(),
                direction: SortDirection::Asc,
            },
            2,
        );
        let page = store.paginate("people", &query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.last_page, 2);
        let names: Vec<_> = page.data.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("Bob"), json!("Alice")]);

        let page = store.paginate("people", &query.clone().page(2)).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0]["name"], "Carol");
    }

    #[tokio::test]
    async fn paginate_default_order_is_id_desc() {
        let store = seeded().await;
        let page = store
            .paginate("people", &ListQuery::new(OrderBy::default(), 10))
            .await
            .unwrap();
        assert_eq!(page.data[0]["name"], "Carol");
    }

    #[tokio::test]
    async fn missing_table_is_empty() {
        let store = MemoryStore::new();
        let page = store
            .paginate("nothing", &ListQuery::new(OrderBy::default(), 10))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(store.find("nothing", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn not_null_and_unique_are_enforced() {
        let store = MemoryStore::new().with_schema(
            "users",
            TableSchema::new().not_null("email").unique("email"),
        );
        store
            .create("users", record(json!({"email": "a@x.com"})))
            .await
            .unwrap();
        assert_matches!(
            store.create("users", record(json!({"name": "no mail"}))).await,
            Err(StoreError::Constraint(_))
        );
        assert_matches!(
            store.create("users", record(json!({"email": "a@x.com"}))).await,
            Err(StoreError::Constraint(_))
        );
        assert_eq!(store.rows("users").await.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_and_missing_row_is_none() {
        let store = seeded().await;
        let updated = store
            .update("people", 2, record(json!({"age": 26, "id": 99})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["name"], "Bob");
        assert_eq!(updated["age"], 26);
        assert_eq!(updated["id"], 2);
        assert!(store
            .update("people", 42, record(json!({"age": 1})))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let store = seeded().await;
        assert!(store.delete("people", 1).await.unwrap());
        assert!(!store.delete("people", 1).await.unwrap());
    }

    #[tokio::test]
    async fn restricted_delete_fails() {
        let store = MemoryStore::new().with_schema("locked", TableSchema::new().restrict_delete());
        store.create("locked", Record::new()).await.unwrap();
        assert_matches!(store.delete("locked", 1).await, Err(StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn find_by_matches_loosely() {
        let store = seeded().await;
        let found = store
            .find_by("people", "age", &json!("41"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["name"], "Carol");
    }

    #[tokio::test]
    async fn counts_calls() {
        let store = seeded().await;
        assert_eq!(store.call_count(), 3);
        store.find("people", 1).await.unwrap();
        assert_eq!(store.call_count(), 4);
    }
}
