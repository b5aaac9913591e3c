use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::{
        models::{Attachment, AttachmentPurpose},
        Database,
    },
    error::{AppError, Result},
    policy::Actor,
};

use super::tasks::require_task_in_company;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "xlsx", "xls", "doc", "docx", "txt", "csv"];

/// Extract and validate the file extension of an uploaded name.
pub fn allowed_extension(filename: &str) -> Result<String> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    ext.ok_or_else(|| {
        AppError::Validation(
            "Invalid file type. Only PDF, Excel, Word, text and CSV files are allowed".to_string(),
        )
    })
}

pub struct NewAttachment {
    pub task_id: String,
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub purpose: AttachmentPurpose,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AttachmentView {
    pub id: String,
    pub task_id: String,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub file_type: String,
    pub uploaded_by: String,
    pub uploader_username: String,
    pub purpose: AttachmentPurpose,
    pub created_at: DateTime<Utc>,
}

pub async fn save_attachment(
    db: &Database,
    actor: &Actor,
    new_attachment: NewAttachment,
) -> Result<Attachment> {
    require_task_in_company(db, actor, &new_attachment.task_id).await?;

    let _guard = db.write_guard().await;

    let attachment = Attachment {
        id: super::new_id(),
        task_id: new_attachment.task_id,
        filename: new_attachment.filename,
        original_filename: new_attachment.original_filename,
        file_path: new_attachment.file_path,
        file_size: new_attachment.file_size,
        file_type: new_attachment.file_type,
        uploaded_by: actor.id.clone(),
        purpose: new_attachment.purpose,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO file_attachments (id, task_id, filename, original_filename, file_path, file_size, file_type, uploaded_by, purpose, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&attachment.id)
    .bind(&attachment.task_id)
    .bind(&attachment.filename)
    .bind(&attachment.original_filename)
    .bind(&attachment.file_path)
    .bind(attachment.file_size)
    .bind(&attachment.file_type)
    .bind(&attachment.uploaded_by)
    .bind(attachment.purpose)
    .bind(attachment.created_at)
    .execute(&db.pool)
    .await?;

    Ok(attachment)
}

pub async fn list_attachments(
    db: &Database,
    actor: &Actor,
    task_id: &str,
) -> Result<Vec<AttachmentView>> {
    require_task_in_company(db, actor, task_id).await?;

    let attachments = sqlx::query_as::<_, AttachmentView>(
        "SELECT fa.id, fa.task_id, fa.filename, fa.original_filename, fa.file_size, \
                fa.file_type, fa.uploaded_by, u.username AS uploader_username, fa.purpose, fa.created_at \
         FROM file_attachments fa \
         JOIN users u ON fa.uploaded_by = u.id \
         WHERE fa.task_id = ? \
         ORDER BY fa.created_at DESC",
    )
    .bind(task_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(attachments)
}

/// Resolve a download to its stored path and original name. The scope filter
/// goes through the owning task's company, so a foreign attachment id reads
/// as missing.
pub async fn resolve_download(
    db: &Database,
    actor: &Actor,
    attachment_id: &str,
) -> Result<(String, String)> {
    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT fa.file_path, fa.original_filename \
         FROM file_attachments fa \
         JOIN tasks t ON fa.task_id = t.id \
         WHERE fa.id = ? AND t.company_id = ?",
    )
    .bind(attachment_id)
    .bind(&actor.company_id)
    .fetch_optional(&db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
    Ok(row)
}

/// Remove an attachment record. Only the uploader may delete their upload;
/// returns the stored path so the caller can unlink the bytes.
pub async fn delete_attachment(
    db: &Database,
    actor: &Actor,
    attachment_id: &str,
) -> Result<String> {
    let _guard = db.write_guard().await;

    let file_path = sqlx::query_scalar::<_, String>(
        "SELECT file_path FROM file_attachments WHERE id = ? AND uploaded_by = ?",
    )
    .bind(attachment_id)
    .bind(&actor.id)
    .fetch_optional(&db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    sqlx::query("DELETE FROM file_attachments WHERE id = ? AND uploaded_by = ?")
        .bind(attachment_id)
        .bind(&actor.id)
        .execute(&db.pool)
        .await?;

    Ok(file_path)
}
