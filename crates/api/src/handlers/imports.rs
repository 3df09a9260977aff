//! Handlers for CSV imports.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;

use super::find_resource;
use crate::engine::import::{self, ImportFormView};
use crate::error::{AppError, AppResult};
use crate::middleware::actor::CurrentActor;
use crate::response::{ActionResponse, DataResponse};
use crate::state::AppState;

/// Parts of an import form post.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    delimiter: Option<String>,
    config: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                form.file = Some(bytes.to_vec());
            }
            "delimiter" | "config" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
                if name == "delimiter" {
                    form.delimiter = Some(text);
                } else {
                    form.config = Some(text);
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// GET /api/v1/resources/{resource}/import
pub async fn import_form(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> AppResult<Json<DataResponse<ImportFormView>>> {
    let resource = find_resource(&state, &resource)?;
    let view = import::import_form(&resource, &actor)?;
    Ok(Json(DataResponse { data: view }))
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub success: bool,
    pub data: Vec<String>,
}

/// POST /api/v1/resources/{resource}/import/check_file
///
/// Multipart with `file` and `delimiter`; answers with the header row.
pub async fn check_file(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<ProbeResponse>> {
    let resource = find_resource(&state, &resource)?;
    let form = read_upload(multipart).await?;
    let header = import::probe(
        &resource,
        &actor,
        form.file.as_deref(),
        form.delimiter.as_deref(),
        state.config.import_max_upload_bytes,
    )?;
    Ok(Json(ProbeResponse {
        success: true,
        data: header,
    }))
}

/// POST /api/v1/resources/{resource}/import/submit
///
/// Multipart with `file` and `config` (JSON). The import runs in the
/// background; its summary arrives as notifications.
pub async fn submit(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(resource): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<ActionResponse>> {
    let resource = find_resource(&state, &resource)?;
    let form = read_upload(multipart).await?;
    import::submit(
        &state.import_queue,
        resource,
        actor,
        form.file,
        form.config.as_deref(),
        state.config.import_max_upload_bytes,
    )?;
    Ok(Json(ActionResponse::accepted()))
}
