//! Asset endpoints: upload, list, fetch, delete.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use arca_core::models::{AssetListing, AssetResponse};
use arca_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

struct UploadedFile {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

/// Pull the `file` part out of the multipart body.
async fn read_file_part(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::InvalidInput("File part must have a filename".to_string()))?;
        let content_type = field
            .content_type()
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                AppError::InvalidInput("File part must have a content type".to_string())
            })?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file part: {e}")))?
            .to_vec();

        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::InvalidInput(
        "Missing multipart field 'file'".to_string(),
    ))
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_asset(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<AssetResponse>)> {
    let file = read_file_part(multipart).await?;

    if file.data.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".to_string()).into());
    }
    if file.data.len() > state.config.max_file_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte limit",
            state.config.max_file_size_bytes
        ))
        .into());
    }
    if !state
        .config
        .allowed_content_types
        .contains(&file.content_type)
    {
        return Err(AppError::InvalidInput(format!(
            "Unsupported content type: {}",
            file.content_type
        ))
        .into());
    }

    let response = state
        .service
        .submit(&file.filename, &file.content_type, file.data)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_assets(State(state): State<AppState>) -> ApiResult<Json<Vec<AssetListing>>> {
    let listings = state.service.list().await?;
    Ok(Json(listings))
}

pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssetResponse>> {
    let response = state.service.get(id).await?;
    Ok(Json(response))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
