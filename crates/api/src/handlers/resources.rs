//! Handlers for the generic resource CRUD surface.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use vstack_core::query::QueryParams;
use vstack_core::types::Record;

use super::find_resource;
use crate::engine::crud::{self, DetailView, FormView, ListView, OptionItem};
use crate::error::AppResult;
use crate::middleware::actor::CurrentActor;
use crate::query::OptionListRequest;
use crate::response::{ActionResponse, DataResponse};
use crate::state::AppState;

/// GET /api/v1/resources/{resource}
///
/// Paginated list. Honours `order_by`, `order_type`, `_` (free text),
/// `page`, lens fields and declared filter parameters.
pub async fn list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<DataResponse<ListView>>> {
    let resource = find_resource(&state, &resource)?;
    let view = crud::list(state.store.as_ref(), &resource, &actor, &params).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/resources/{resource}/create
pub async fn create_form(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> AppResult<Json<DataResponse<FormView>>> {
    let resource = find_resource(&state, &resource)?;
    let view = crud::create_form(&resource, &actor)?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/resources/{resource}/{code}/edit
pub async fn edit_form(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path((resource, code)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<FormView>>> {
    let resource = find_resource(&state, &resource)?;
    let view = crud::edit_form(state.store.as_ref(), &resource, &actor, &code).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/resources/{resource}/{code}
pub async fn detail(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path((resource, code)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<DetailView>>> {
    let resource = find_resource(&state, &resource)?;
    let view = crud::detail(
        state.store.as_ref(),
        &state.registry,
        &resource,
        &actor,
        &code,
    )
    .await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/resources/{resource}/{code}/destroy
pub async fn destroy(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path((resource, code)): Path<(String, String)>,
) -> AppResult<Json<ActionResponse>> {
    let resource = find_resource(&state, &resource)?;
    let response = crud::destroy(state.store.as_ref(), &resource, &actor, &code).await?;
    Ok(Json(response))
}

/// POST /api/v1/resources/store
///
/// Create (no `id`) or update (`id` present) the record described by the
/// body; `resource_id` names the resource.
pub async fn store(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(body): Json<Record>,
) -> AppResult<Json<ActionResponse>> {
    let response = crud::store_record(state.store.as_ref(), &state.registry, &actor, body).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct OptionListResponse {
    pub success: bool,
    pub data: Vec<OptionItem>,
}

/// POST /api/v1/resources/inputs/option_list
pub async fn option_list(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<OptionListRequest>,
) -> AppResult<Json<OptionListResponse>> {
    let data =
        crud::option_list(state.store.as_ref(), &state.registry, &actor, &input.model).await?;
    Ok(Json(OptionListResponse {
        success: true,
        data,
    }))
}
