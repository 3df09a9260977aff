//! List, form, detail, destroy, store and option-list operations.

use serde::Serialize;
use serde_json::Value;
use vstack_core::actor::Actor;
use vstack_core::error::CoreError;
use vstack_core::notification::FlashMessage;
use vstack_core::query::{build_list, value_text, Page, Predicate, QueryParams};
use vstack_core::registry::ResourceRegistry;
use vstack_core::render::{render_all_for_view, render_for_form, RenderedField};
use vstack_core::resource::{
    FieldSpec, FilterInfo, LensSpec, ResourceDefinition, ResourceId, RESOURCE_ROUTE_PREFIX,
};
use vstack_core::types::{DbId, Record};
use vstack_core::validation;
use vstack_db::RecordStore;

use super::ensure;
use super::records::{parse_id, public_code, resolve, StoreLookup};
use crate::error::AppResult;
use crate::response::ActionResponse;

pub const PAGE_CREATE: &str = "Cadastro";
pub const PAGE_EDIT: &str = "Edição";
pub const PAGE_VIEW: &str = "Visualização";

/// Keys of a store payload that are routing data, not attributes.
const STORE_CONTROL_KEYS: &[&str] = &["resource_id", "id"];

/// Route every create/edit form posts to.
pub fn store_route() -> String {
    format!("{RESOURCE_ROUTE_PREFIX}/store")
}

// ---------------------------------------------------------------------------
// View payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ListView {
    pub resource_id: ResourceId,
    pub label: String,
    pub singular_label: String,
    pub icon: Option<String>,
    pub route: String,
    pub fields: Vec<FieldSpec>,
    pub filters: Vec<FilterInfo>,
    pub lenses: Vec<LensSpec>,
    pub can_create: bool,
    pub can_import: bool,
    pub data: Page<Record>,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub id: Option<DbId>,
    pub fields: Vec<FieldSpec>,
    pub store_route: String,
    pub list_route: String,
    pub resource_id: ResourceId,
    pub page_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetailView {
    pub fields: Vec<RenderedField>,
    pub can_update: bool,
    pub can_delete: bool,
    pub update_route: String,
    pub route_destroy: String,
    pub page_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub id: Value,
    pub name: Value,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// One page of the resource, filtered and ordered by request parameters.
pub async fn list(
    store: &dyn RecordStore,
    resource: &ResourceDefinition,
    actor: &Actor,
    params: &QueryParams,
) -> AppResult<ListView> {
    ensure(resource.can_view_list(actor), "list", &resource.slug)?;

    let query = build_list(resource, params);
    let data = store.paginate(&resource.table, &query).await?;

    tracing::debug!(
        resource = %resource.slug,
        page = data.current_page,
        total = data.total,
        "Listed resource",
    );

    Ok(ListView {
        resource_id: resource.id,
        label: resource.label.clone(),
        singular_label: resource.singular_label.clone(),
        icon: resource.icon.clone(),
        route: resource.route(),
        fields: resource.fields.clone(),
        filters: resource.filter_info(),
        lenses: resource.lenses.clone(),
        can_create: resource.can_create(actor),
        can_import: resource.can_import(actor),
        data,
    })
}

pub fn create_form(resource: &ResourceDefinition, actor: &Actor) -> AppResult<FormView> {
    ensure(resource.can_create(actor), "create", &resource.slug)?;
    Ok(form_view(resource, None, PAGE_CREATE))
}

pub async fn edit_form(
    store: &dyn RecordStore,
    resource: &ResourceDefinition,
    actor: &Actor,
    code: &str,
) -> AppResult<FormView> {
    ensure(resource.can_update(actor), "update", &resource.slug)?;
    let record = resolve(store, resource, code).await?;
    Ok(form_view(resource, Some(&record), PAGE_EDIT))
}

fn form_view(
    resource: &ResourceDefinition,
    record: Option<&Record>,
    page_type: &'static str,
) -> FormView {
    let fields = match record {
        Some(record) => resource
            .fields
            .iter()
            .map(|f| render_for_form(f, Some(record)))
            .collect(),
        None => resource.fields.clone(),
    };

    FormView {
        id: record.and_then(vstack_core::types::record_id),
        fields,
        store_route: store_route(),
        list_route: resource.route(),
        resource_id: resource.id,
        page_type,
    }
}

pub async fn detail(
    store: &dyn RecordStore,
    registry: &ResourceRegistry,
    resource: &ResourceDefinition,
    actor: &Actor,
    code: &str,
) -> AppResult<DetailView> {
    ensure(resource.can_view(actor), "view", &resource.slug)?;
    let record = resolve(store, resource, code).await?;

    let lookup = StoreLookup { store, registry };
    let fields = render_all_for_view(&resource.fields, &record, &lookup).await?;

    let base = resource.record_route(&public_code(resource, &record));
    Ok(DetailView {
        fields,
        can_update: resource.can_update(actor),
        can_delete: resource.can_delete(actor),
        update_route: format!("{base}/edit"),
        route_destroy: format!("{base}/destroy"),
        page_type: PAGE_VIEW,
    })
}

/// Delete a record. A store that refuses the delete yields `success: false`
/// with a notice rather than an error.
pub async fn destroy(
    store: &dyn RecordStore,
    resource: &ResourceDefinition,
    actor: &Actor,
    code: &str,
) -> AppResult<ActionResponse> {
    ensure(resource.can_delete(actor), "delete", &resource.slug)?;
    let record = resolve(store, resource, code).await?;
    let id = vstack_core::types::record_id(&record)
        .ok_or_else(|| CoreError::Internal(format!("{} row without id", resource.table)))?;

    match store.delete(&resource.table, id).await {
        Ok(true) => {
            tracing::info!(resource = %resource.slug, record_id = id, "Record deleted");
            Ok(ActionResponse::ok(
                resource.route(),
                FlashMessage::success(format!(
                    "{} Excluido com sucesso !!",
                    resource.singular_label
                )),
            ))
        }
        outcome => {
            if let Err(e) = &outcome {
                tracing::warn!(resource = %resource.slug, record_id = id, error = %e, "Delete refused");
            }
            Ok(ActionResponse::failed(
                Some(resource.route()),
                FlashMessage::error(format!("Erro ao excluir {} !!", resource.singular_label)),
            ))
        }
    }
}

/// Identifier of the target resource in a store payload.
fn resource_key(body: &Record) -> Option<String> {
    match body.get("resource_id")? {
        Value::Number(n) if n.as_i64() != Some(0) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Create-or-update from a form payload.
///
/// `resource_id` selects the resource; a present, non-empty `id` selects
/// update. Permission is checked before validation, and validation before
/// any write.
pub async fn store_record(
    store: &dyn RecordStore,
    registry: &ResourceRegistry,
    actor: &Actor,
    body: Record,
) -> AppResult<ActionResponse> {
    let key = resource_key(&body).ok_or_else(|| CoreError::not_found("Resource", "(missing)"))?;
    let resource = registry.find(&key)?;

    let target_id = match body.get("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(raw) => Some(parse_id(raw).ok_or_else(|| CoreError::not_found("Record", raw))?),
    };

    match target_id {
        Some(_) => ensure(resource.can_update(actor), "update", &resource.slug)?,
        None => ensure(resource.can_create(actor), "create", &resource.slug)?,
    }

    let outcome = validation::evaluate(&resource.rules, &body);
    if !outcome.is_valid {
        return Err(CoreError::InvalidFields(outcome.errors).into());
    }

    let attributes = payload_attributes(resource, body);

    let saved = match target_id {
        Some(id) => store
            .update(&resource.table, id, attributes)
            .await?
            .ok_or_else(|| CoreError::not_found("Record", id))?,
        None => store.create(&resource.table, attributes).await?,
    };

    tracing::info!(
        resource = %resource.slug,
        record_id = ?vstack_core::types::record_id(&saved),
        updated = target_id.is_some(),
        "Record saved",
    );

    Ok(ActionResponse::ok(
        resource.route(),
        FlashMessage::success(format!("{} Salvo com sucesso !!", resource.singular_label)),
    ))
}

/// The writable part of a store payload: declared fields only, minus the
/// routing keys.
fn payload_attributes(resource: &ResourceDefinition, body: Record) -> Record {
    body.into_iter()
        .filter(|(key, _)| {
            let keep = !STORE_CONTROL_KEYS.contains(&key.as_str())
                && resource.find_field(key).is_some();
            if !keep && !STORE_CONTROL_KEYS.contains(&key.as_str()) {
                tracing::debug!(resource = %resource.slug, key, "Ignoring undeclared attribute");
            }
            keep
        })
        .collect()
}

/// `{id, name}` pairs of every record of a registered resource.
pub async fn option_list(
    store: &dyn RecordStore,
    registry: &ResourceRegistry,
    actor: &Actor,
    model: &str,
) -> AppResult<Vec<OptionItem>> {
    let resource = registry.find(model)?;
    ensure(resource.can_view_list(actor), "list", &resource.slug)?;

    let rows = store
        .select(&resource.table, &Predicate::All(Vec::new()), None)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| OptionItem {
            id: row.get("id").cloned().unwrap_or(Value::Null),
            name: row
                .get(&resource.display_column)
                .and_then(|v| value_text(v).map(Value::String))
                .unwrap_or(Value::Null),
        })
        .collect())
}
