use axum::extract::State;
use axum::Json;
use vstack_events::Notification;

use crate::error::AppResult;
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/notifications
///
/// Recent notifications for the acting user, newest first.
pub async fn list_notifications(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let data = state.inbox.for_user(actor.user_id).await;
    Ok(Json(DataResponse { data }))
}
