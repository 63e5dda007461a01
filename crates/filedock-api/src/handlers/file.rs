//! Upload intake and file record handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use bytes::Bytes;
use validator::Validate;

use filedock_core::error::AppError;
use filedock_core::types::{FileId, FileSortField, UserId};
use filedock_service::UploadOutcome;
use filedock_service::file::ChunkUpload;

use crate::dto::request::{ListFilesQuery, RenameFileRequest};
use crate::dto::response::{ApiResponse, FileResponse, UploadResponse, UserFilesResponse};
use crate::error::ApiError;
use crate::extractors::{Actor, parse_id};
use crate::state::AppState;

/// Fields of an upload form.
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    data: Option<Bytes>,
    chunk_index: Option<u32>,
    total_chunks: Option<u32>,
    session_id: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().map(String::from);
                    form.data = Some(
                        field
                            .bytes()
                            .await
                            .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                    );
                }
                "chunkIndex" => form.chunk_index = Some(parse_number(&name, field.text().await)?),
                "totalChunks" => form.total_chunks = Some(parse_number(&name, field.text().await)?),
                "uuid" => {
                    form.session_id = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| AppError::validation(format!("Read error: {e}")))?
                            .trim()
                            .to_string(),
                    );
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

fn parse_number(
    field: &str,
    text: Result<String, axum::extract::multipart::MultipartError>,
) -> Result<u32, AppError> {
    let text = text.map_err(|e| AppError::validation(format!("Read error: {e}")))?;
    text.trim()
        .parse::<u32>()
        .map_err(|_| AppError::validation(format!("{field} must be a non-negative integer")))
}

/// POST /api/files/upload
///
/// A form with `chunkIndex` stages one chunk of a chunked upload; without
/// it, `file` is stored as a whole.
pub async fn upload_file(
    State(state): State<AppState>,
    actor: Actor,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponse>>), ApiError> {
    let form = UploadForm::read(multipart).await?;

    let file_name = form
        .file_name
        .ok_or_else(|| AppError::validation("file is required"))?;
    let data = form
        .data
        .ok_or_else(|| AppError::validation("file data is required"))?;

    let outcome = match form.chunk_index {
        Some(chunk_index) => {
            let total_chunks = form
                .total_chunks
                .ok_or_else(|| AppError::validation("totalChunks is required"))?;
            let session_id = form
                .session_id
                .ok_or_else(|| AppError::validation("uuid is required"))?;
            state
                .upload_service
                .accept_chunk(
                    &actor,
                    ChunkUpload {
                        session_id,
                        chunk_index,
                        total_chunks,
                        file_name,
                        data,
                    },
                )
                .await?
        }
        None => {
            let file = state
                .upload_service
                .upload_whole(&actor, &file_name, data)
                .await?;
            UploadOutcome::Stored { file }
        }
    };

    let status = match outcome {
        UploadOutcome::Stored { .. } => StatusCode::CREATED,
        UploadOutcome::Pending { .. } => StatusCode::OK,
        UploadOutcome::Merging { .. } => StatusCode::ACCEPTED,
    };
    Ok((status, Json(ApiResponse::ok(outcome.into()))))
}

/// GET /api/files?sort=...
pub async fn list_files(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(raw) => raw.parse::<FileSortField>()?,
        None => FileSortField::default(),
    };

    let files = state.file_service.list_all(&actor, sort).await?;
    Ok(Json(ApiResponse::ok(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}

/// GET /api/users/{user_id}/files
pub async fn list_user_files(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserFilesResponse>>, ApiError> {
    let user_id: UserId = parse_id(&user_id)?;
    let listing = state.file_service.list_for_user(&actor, user_id).await?;
    Ok(Json(ApiResponse::ok(listing.into())))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let id: FileId = parse_id(&id)?;
    let file = state.file_service.find(&actor, id).await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// PUT /api/files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<RenameFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let id: FileId = parse_id(&id)?;
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;

    let file = state
        .file_service
        .rename(&actor, id, &req.display_name)
        .await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let id: FileId = parse_id(&id)?;
    let file = state.file_service.delete(&actor, id).await?;
    Ok(Json(ApiResponse::ok(file.into())))
}

/// GET /api/files/{id}/thumbnail
pub async fn get_thumbnail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: FileId = parse_id(&id)?;
    let data = state
        .file_service
        .thumbnail(&actor, id)
        .await?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::record_not_found(format!("File {id} has no thumbnail")))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
