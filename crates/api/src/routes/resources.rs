//! Route definitions for `/resources`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{imports, resources, search};
use crate::state::AppState;

/// Routes mounted at `/resources`.
///
/// Static segments (`store`, `inputs`, `global-search`, `create`,
/// `import`) take precedence over the `{resource}` / `{code}` captures.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/store", post(resources::store))
        .route("/inputs/option_list", post(resources::option_list))
        .route("/global-search", get(search::search))
        .route("/{resource}", get(resources::list))
        .route("/{resource}/create", get(resources::create_form))
        .route("/{resource}/import", get(imports::import_form))
        .route("/{resource}/import/check_file", post(imports::check_file))
        .route("/{resource}/import/submit", post(imports::submit))
        .route("/{resource}/{code}", get(resources::detail))
        .route("/{resource}/{code}/edit", get(resources::edit_form))
        .route("/{resource}/{code}/destroy", delete(resources::destroy))
}
