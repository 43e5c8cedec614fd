//! The durable tier: one UTF-8 JSON file per session under a base directory
//! (spec §6.4: `{session_store_base}/{id}.json`), written atomically via a
//! temp-file-then-rename so a reader never observes a partial write.

use std::path::{Path, PathBuf};

use oec_protocol::{SessionContext, SessionId};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::StoreError;

/// Filesystem-backed durable tier. Grows until explicit cleanup (spec §5);
/// this crate performs no background eviction of durable records — TTL is
/// enforced only on the cache tier (spec §4.1 "TTL").
#[derive(Debug, Clone)]
pub struct DurableStore {
    base_dir: PathBuf,
}

impl DurableStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    fn ensure_base_dir(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| StoreError::BackendUnavailable(format!("create_dir_all failed: {e}")))
    }

    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn write(&self, ctx: &SessionContext) -> Result<(), StoreError> {
        self.ensure_base_dir()?;
        let final_path = self.path_for(ctx.session_id);
        let tmp_path = self.temp_path_for(&final_path);
        let payload = serde_json::to_vec_pretty(ctx)
            .map_err(|e| StoreError::BackendUnavailable(format!("encode failed: {e}")))?;

        tokio::fs::write(&tmp_path, &payload)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("write temp file failed: {e}")))?;

        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("atomic rename failed: {e}")))?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn read(&self, id: SessionId) -> Result<SessionContext, StoreError> {
        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(e) => {
                return Err(StoreError::BackendUnavailable(format!(
                    "read failed: {e}"
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(session_id = %id, error = %e, "durable record failed to decode");
            StoreError::CorruptRecord {
                session_id: id,
                detail: e.to_string(),
            }
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: SessionId) -> Result<(), StoreError> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()), // idempotent
            Err(e) => Err(StoreError::BackendUnavailable(format!(
                "delete failed: {e}"
            ))),
        }
    }

    fn temp_path_for(&self, final_path: &Path) -> PathBuf {
        let file_name = final_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("session");
        self.base_dir
            .join(format!(".{file_name}.{}.tmp", Uuid::new_v4()))
    }
}
