use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::models::{Attachment, AttachmentPurpose},
    error::{AppError, Result},
    policy::Actor,
    repo::{
        self,
        attachments::{AttachmentView, NewAttachment},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/task/:task_id", get(list_attachments))
        .route("/task/:task_id/upload", post(upload_attachment))
        .route("/:id/download", get(download_attachment))
        .route("/:id", delete(delete_attachment))
}

async fn list_attachments(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<AttachmentView>>> {
    let attachments = repo::attachments::list_attachments(&state.db, &actor, &task_id).await?;
    Ok(Json(attachments))
}

async fn upload_attachment(
    State(state): State<AppState>,
    actor: Actor,
    Path(task_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Attachment>> {
    let mut purpose = AttachmentPurpose::Progress;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("purpose") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read field: {e}")))?;
                purpose = match value.as_str() {
                    "assignment" => AttachmentPurpose::Assignment,
                    "progress" => AttachmentPurpose::Progress,
                    other => {
                        return Err(AppError::Validation(format!(
                            "Unknown attachment purpose: {other}"
                        )))
                    }
                };
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("File field missing filename".to_string())
                    })?
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
                upload = Some((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    let (original_filename, data) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let extension = repo::attachments::allowed_extension(&original_filename)?;

    let stored_name = format!("{}.{extension}", Uuid::new_v4());
    let file_path = state
        .storage
        .write_attachment(&task_id, &stored_name, &data)
        .await?;

    let saved = repo::attachments::save_attachment(
        &state.db,
        &actor,
        NewAttachment {
            task_id,
            filename: stored_name,
            original_filename,
            file_path: file_path.clone(),
            file_size: data.len() as i64,
            file_type: extension,
            purpose,
        },
    )
    .await;

    match saved {
        Ok(attachment) => Ok(Json(attachment)),
        Err(err) => {
            // Remove the orphaned bytes if the record was refused.
            state.storage.remove(&file_path).await;
            Err(err)
        }
    }
}

async fn download_attachment(
    State(state): State<AppState>,
    actor: Actor,
    Path(attachment_id): Path<String>,
) -> Result<Response> {
    let (file_path, original_filename) =
        repo::attachments::resolve_download(&state.db, &actor, &attachment_id).await?;

    let data = state.storage.read(&file_path).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{original_filename}\""),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

async fn delete_attachment(
    State(state): State<AppState>,
    actor: Actor,
    Path(attachment_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let file_path = repo::attachments::delete_attachment(&state.db, &actor, &attachment_id).await?;
    state.storage.remove(&file_path).await;
    Ok(Json(json!({ "success": true })))
}
