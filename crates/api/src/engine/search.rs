//! Global search across every globally-searchable resource.

use futures::future::try_join_all;
use vstack_core::actor::Actor;
use vstack_core::registry::ResourceRegistry;
use vstack_core::search::{global_search_condition, hit_for, GlobalSearchHit};
use vstack_db::RecordStore;

use crate::error::AppResult;

/// Search every eligible resource for `term`.
///
/// Resources are queried concurrently but hits are returned grouped in
/// registry order, one per matching record, capped at `limit`. A record
/// that matches in two resources appears twice.
pub async fn global_search(
    store: &dyn RecordStore,
    registry: &ResourceRegistry,
    actor: &Actor,
    term: &str,
    limit: usize,
) -> AppResult<Vec<GlobalSearchHit>> {
    let targets: Vec<_> = registry
        .all()
        .filter(|r| r.globally_searchable && r.can_view(actor))
        .filter_map(|r| global_search_condition(r, term).map(|condition| (r, condition)))
        .collect();

    if targets.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let per_resource = try_join_all(targets.iter().map(|(resource, condition)| async move {
        let rows = store
            .select(&resource.table, condition, Some(limit as u64))
            .await?;
        Ok::<_, vstack_db::StoreError>(
            rows.iter()
                .map(|row| hit_for(resource, row))
                .collect::<Vec<_>>(),
        )
    }))
    .await?;

    let hits: Vec<GlobalSearchHit> = per_resource.into_iter().flatten().take(limit).collect();
    tracing::debug!(term, resources = targets.len(), hits = hits.len(), "Global search");
    Ok(hits)
}
