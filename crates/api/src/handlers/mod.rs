pub mod imports;
pub mod notifications;
pub mod resources;
pub mod search;

use std::sync::Arc;

use vstack_core::resource::ResourceDefinition;

use crate::error::AppResult;
use crate::state::AppState;

/// Resolve the `{resource}` path segment (slug or numeric id).
pub(crate) fn find_resource(
    state: &AppState,
    identifier: &str,
) -> AppResult<Arc<ResourceDefinition>> {
    Ok(Arc::clone(state.registry.find(identifier)?))
}
