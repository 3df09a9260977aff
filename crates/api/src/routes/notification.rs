use axum::routing::get;
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// ```text
/// GET /notifications -> list_notifications
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/notifications", get(notifications::list_notifications))
}
