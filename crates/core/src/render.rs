//! Field rendering for forms and read-only views.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::resource::{FieldKind, FieldSpec};
use crate::types::Record;

/// Resolves the display value of a record referenced by a belongs-to field.
#[async_trait]
pub trait RelatedLookup: Send + Sync {
    /// Display value of record `key` in resource `resource` (a slug).
    ///
    /// Fails with `NotFound` when the resource or the record does not exist.
    async fn display_value(&self, resource: &str, key: &Value) -> Result<Value, CoreError>;
}

/// One labelled value of a detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    pub label: String,
    pub field: String,
    pub value: Value,
}

/// Render `field` of `record` for a read-only view.
pub async fn render_for_view(
    field: &FieldSpec,
    record: &Record,
    lookup: &dyn RelatedLookup,
) -> Result<RenderedField, CoreError> {
    let raw = record.get(&field.field);

    let value = match &field.kind {
        FieldKind::BelongsTo { resource } => match raw {
            None | Some(Value::Null) => Value::Null,
            Some(key) => lookup.display_value(resource, key).await?,
        },
        kind => kind.display(raw).unwrap_or(Value::Null),
    };

    Ok(RenderedField {
        label: field.label.clone(),
        field: field.field.clone(),
        value,
    })
}

/// Render every field of `record`, in declaration order.
pub async fn render_all_for_view(
    fields: &[FieldSpec],
    record: &Record,
    lookup: &dyn RelatedLookup,
) -> Result<Vec<RenderedField>, CoreError> {
    let mut rendered = Vec::with_capacity(fields.len());
    for field in fields {
        rendered.push(render_for_view(field, record, lookup).await?);
    }
    Ok(rendered)
}

/// Copy of `field` carrying the record's current raw value (or null).
pub fn render_for_form(field: &FieldSpec, record: Option<&Record>) -> FieldSpec {
    let mut field = field.clone();
    field.value = Some(
        record
            .and_then(|r| r.get(&field.field))
            .cloned()
            .unwrap_or(Value::Null),
    );
    field
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    struct Categories;

    #[async_trait]
    impl RelatedLookup for Categories {
        async fn display_value(&self, resource: &str, key: &Value) -> Result<Value, CoreError> {
            match (resource, key.as_i64()) {
                ("categories", Some(1)) => Ok(json!("Livros")),
                _ => Err(CoreError::not_found("Record", key)),
            }
        }
    }

    fn product() -> Record {
        json!({"id": 9, "name": "Duna", "active": 1, "category_id": 1})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn renders_each_kind() {
        let fields = vec![
            FieldSpec::text("name", "Nome"),
            FieldSpec::check("active", "Ativo"),
            FieldSpec::belongs_to("category_id", "Categoria", "categories"),
        ];
        let rendered = render_all_for_view(&fields, &product(), &Categories)
            .await
            .unwrap();
        assert_eq!(rendered[0].value, json!("Duna"));
        assert_eq!(rendered[1].value["text"], "Sim");
        assert_eq!(rendered[2].value, json!("Livros"));
        assert_eq!(rendered[2].label, "Categoria");
    }

    #[tokio::test]
    async fn missing_related_record_is_not_found() {
        let mut record = product();
        record.insert("category_id".into(), json!(77));
        let field = FieldSpec::belongs_to("category_id", "Categoria", "categories");
        assert_matches!(
            render_for_view(&field, &record, &Categories).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn null_foreign_key_renders_null() {
        let mut record = product();
        record.insert("category_id".into(), Value::Null);
        let field = FieldSpec::belongs_to("category_id", "Categoria", "categories");
        let rendered = render_for_view(&field, &record, &Categories).await.unwrap();
        assert!(rendered.value.is_null());
    }

    #[test]
    fn form_rendering_attaches_raw_value() {
        let field = FieldSpec::check("active", "Ativo");
        assert_eq!(
            render_for_form(&field, Some(&product())).value,
            Some(json!(1))
        );
        assert_eq!(render_for_form(&field, None).value, Some(Value::Null));
    }
}
