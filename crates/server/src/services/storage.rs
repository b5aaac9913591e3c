// Attachment byte storage. The repository only ever sees the returned path.

use std::path::PathBuf;

use tokio::fs;

use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct StorageService {
    base_path: PathBuf,
}

impl StorageService {
    pub fn new(base_path: String) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
        }
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create storage directory: {e}")))?;
        Ok(())
    }

    pub fn attachment_path(&self, task_id: &str, stored_name: &str) -> PathBuf {
        self.base_path.join(task_id).join(stored_name)
    }

    /// Write uploaded bytes under the task's directory and return the stored
    /// path as persisted in the attachment record.
    pub async fn write_attachment(
        &self,
        task_id: &str,
        stored_name: &str,
        data: &[u8],
    ) -> Result<String> {
        let path = self.attachment_path(task_id, stored_name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directories: {e}")))?;
        }

        fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(path.to_string_lossy().into_owned())
    }

    pub async fn read(&self, stored_path: &str) -> Result<Vec<u8>> {
        let path = PathBuf::from(stored_path);
        if !path.exists() {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read file: {e}")))
    }

    /// Best-effort removal; a missing file is not an error because the
    /// database row is already gone.
    pub async fn remove(&self, stored_path: &str) {
        if let Err(err) = fs::remove_file(stored_path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(%err, path = %stored_path, "failed to remove stored file");
            }
        }
    }
}
