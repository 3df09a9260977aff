pub mod health;
pub mod notification;
pub mod resources;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /resources/store                              create-or-update (POST)
/// /resources/inputs/option_list                 {id, name} pairs (POST)
/// /resources/global-search                      global search (GET)
/// /resources/{resource}                         list (GET)
/// /resources/{resource}/create                  create form (GET)
/// /resources/{resource}/import                  import form (GET)
/// /resources/{resource}/import/check_file       CSV header probe (POST)
/// /resources/{resource}/import/submit           queue CSV import (POST)
/// /resources/{resource}/{code}                  detail view (GET)
/// /resources/{resource}/{code}/edit             edit form (GET)
/// /resources/{resource}/{code}/destroy          delete (DELETE)
///
/// /notifications                                current user's notifications (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/resources", resources::router())
        .merge(notification::router())
}
