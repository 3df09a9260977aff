use async_trait::async_trait;
use serde_json::Value;
use vstack_core::query::{ListQuery, Page, Predicate};
use vstack_core::types::{DbId, Record};

use crate::error::StoreError;

/// Query and mutation capability over named tables.
///
/// Implementations must treat every call as individually atomic; nothing
/// above this trait relies on multi-call transactions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// One page of `table` matching `query`, with the total match count.
    async fn paginate(&self, table: &str, query: &ListQuery) -> Result<Page<Record>, StoreError>;

    /// All rows matching `condition`, ordered by id, capped at `limit`.
    async fn select(
        &self,
        table: &str,
        condition: &Predicate,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, StoreError>;

    async fn find(&self, table: &str, id: DbId) -> Result<Option<Record>, StoreError>;

    /// First row (by id) whose `column` equals `value`.
    async fn find_by(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<Option<Record>, StoreError>;

    /// Insert a row, returning it with its generated id.
    async fn create(&self, table: &str, attributes: Record) -> Result<Record, StoreError>;

    /// Overwrite the given columns of row `id`. `None` if the row is gone.
    async fn update(
        &self,
        table: &str,
        id: DbId,
        attributes: Record,
    ) -> Result<Option<Record>, StoreError>;

    /// Delete row `id`; `false` if nothing was deleted.
    async fn delete(&self, table: &str, id: DbId) -> Result<bool, StoreError>;
}
