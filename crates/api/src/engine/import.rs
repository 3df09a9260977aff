//! CSV import: form metadata, header probe, submission and the job body.

use std::sync::Arc;

use serde::Serialize;
use vstack_core::actor::Actor;
use vstack_core::error::CoreError;
use vstack_core::import::{
    check_upload, parse_data_rows, parse_delimiter, probe_header, ImportConfig, ImportOutcome,
    MSG_INVALID_CONFIG,
};
use vstack_core::resource::ResourceDefinition;
use vstack_core::validation;
use vstack_db::RecordStore;

use super::ensure;
use crate::background::import_worker::{ImportJob, ImportQueue};
use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct ImportResourceInfo {
    pub label: String,
    pub singular_label: String,
    pub icon: Option<String>,
    pub route: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportFormView {
    pub resource: ImportResourceInfo,
}

pub fn import_form(resource: &ResourceDefinition, actor: &Actor) -> AppResult<ImportFormView> {
    ensure(resource.can_import(actor), "import", &resource.slug)?;
    Ok(ImportFormView {
        resource: ImportResourceInfo {
            label: resource.label.clone(),
            singular_label: resource.singular_label.clone(),
            icon: resource.icon.clone(),
            route: resource.route(),
            columns: resource.importable_columns(),
        },
    })
}

/// Header row of an uploaded CSV, so the user can map its columns.
pub fn probe(
    resource: &ResourceDefinition,
    actor: &Actor,
    file: Option<&[u8]>,
    delimiter: Option<&str>,
    max_bytes: usize,
) -> AppResult<Vec<String>> {
    ensure(resource.can_import(actor), "import", &resource.slug)?;
    let bytes = check_upload(file, max_bytes)?;
    let delimiter = parse_delimiter(delimiter).map_err(as_upload_rejection)?;
    Ok(probe_header(bytes, delimiter)?)
}

/// Validate an upload and queue it. Returns as soon as the job is queued.
pub fn submit(
    queue: &ImportQueue,
    resource: Arc<ResourceDefinition>,
    actor: Actor,
    file: Option<Vec<u8>>,
    config: Option<&str>,
    max_bytes: usize,
) -> AppResult<()> {
    ensure(resource.can_import(&actor), "import", &resource.slug)?;
    check_upload(file.as_deref(), max_bytes)?;

    let config = config
        .ok_or_else(|| CoreError::UploadRejected(MSG_INVALID_CONFIG.into()))
        .and_then(|raw| ImportConfig::from_json(raw).map_err(as_upload_rejection))?;

    let file = file.unwrap_or_default();
    tracing::info!(
        resource = %resource.slug,
        bytes = file.len(),
        user_id = ?actor.user_id,
        "Import queued",
    );

    queue.submit(ImportJob {
        resource,
        actor,
        file,
        config,
    })?;
    Ok(())
}

fn as_upload_rejection(err: CoreError) -> CoreError {
    match err {
        CoreError::Validation(msg) => CoreError::UploadRejected(msg),
        other => other,
    }
}

/// Run one import: map every data row, validate it and create it. A row
/// that fails is counted and skipped.
pub async fn execute(store: &dyn RecordStore, job: &ImportJob) -> Result<ImportOutcome, CoreError> {
    let resource = &job.resource;
    let rows = parse_data_rows(&job.file, job.config.delimiter)?;

    let default_headers: Vec<String> = resource.field_names().map(str::to_string).collect();
    let plan = job
        .config
        .plan(&default_headers, &resource.importable_columns());
    tracing::debug!(
        resource = %resource.slug,
        rows = rows.len(),
        targets = ?plan.targets().collect::<Vec<_>>(),
        "Import plan resolved",
    );

    let mut outcome = ImportOutcome::default();
    for (line, columns) in rows.iter().enumerate() {
        let record = plan.map_row(columns);

        let checked = validation::evaluate(&resource.rules, &record);
        if !checked.is_valid {
            tracing::debug!(
                resource = %resource.slug,
                line = line + 2,
                violations = checked.errors.len(),
                "Import row rejected by validation",
            );
            outcome.failed += 1;
            continue;
        }

        match store.create(&resource.table, record).await {
            Ok(_) => outcome.created += 1,
            Err(e) => {
                tracing::debug!(
                    resource = %resource.slug,
                    line = line + 2,
                    error = %e,
                    "Import row rejected by store",
                );
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}
