use axum::extract::{Query, State};
use axum::Json;
use vstack_core::search::GlobalSearchHit;

use crate::engine::search::global_search;
use crate::error::AppResult;
use crate::middleware::actor::CurrentActor;
use crate::query::GlobalSearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/resources/global-search?filter=
pub async fn search(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Query(params): Query<GlobalSearchParams>,
) -> AppResult<Json<DataResponse<Vec<GlobalSearchHit>>>> {
    let hits = global_search(
        state.store.as_ref(),
        &state.registry,
        &actor,
        params.filter.as_deref().unwrap_or_default(),
        state.config.global_search_max_results,
    )
    .await?;
    Ok(Json(DataResponse { data: hits }))
}
