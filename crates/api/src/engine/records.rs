//! Record resolution shared by the CRUD and rendering paths.

use async_trait::async_trait;
use serde_json::Value;
use vstack_core::error::CoreError;
use vstack_core::query::value_text;
use vstack_core::registry::ResourceRegistry;
use vstack_core::render::RelatedLookup;
use vstack_core::resource::ResourceDefinition;
use vstack_core::types::{record_id, DbId, Record};
use vstack_db::RecordStore;

use crate::error::AppResult;

/// Parse a record key given as a JSON number or numeric string.
pub fn parse_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Find the record a URL segment points at.
///
/// A numeric segment is tried as a primary key first; otherwise (or when no
/// row has that id) it is matched against the resource's code column.
pub async fn resolve(
    store: &dyn RecordStore,
    resource: &ResourceDefinition,
    code: &str,
) -> AppResult<Record> {
    if let Ok(id) = code.trim().parse::<DbId>() {
        if let Some(record) = store.find(&resource.table, id).await? {
            return Ok(record);
        }
    }

    if resource.code_column != "id" {
        let key = Value::String(code.to_string());
        if let Some(record) = store
            .find_by(&resource.table, &resource.code_column, &key)
            .await?
        {
            return Ok(record);
        }
    }

    Err(CoreError::not_found("Record", code).into())
}

/// Public code of a record: the code column when set, else its id.
pub fn public_code(resource: &ResourceDefinition, record: &Record) -> String {
    record
        .get(&resource.code_column)
        .filter(|v| !v.is_null())
        .and_then(value_text)
        .or_else(|| record_id(record).map(|id| id.to_string()))
        .unwrap_or_default()
}

/// [`RelatedLookup`] backed by the record store and the registry.
pub struct StoreLookup<'a> {
    pub store: &'a dyn RecordStore,
    pub registry: &'a ResourceRegistry,
}

#[async_trait]
impl RelatedLookup for StoreLookup<'_> {
    async fn display_value(&self, resource: &str, key: &Value) -> Result<Value, CoreError> {
        let related = self.registry.find(resource)?;
        let id = parse_id(key).ok_or_else(|| CoreError::not_found("Record", key))?;

        let record = self
            .store
            .find(&related.table, id)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or_else(|| CoreError::not_found("Record", id))?;

        Ok(record
            .get(&related.display_column)
            .cloned()
            .unwrap_or(Value::Null))
    }
}
