use std::fmt;
use std::io::SeekFrom;
use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{error, info};

use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{prelude::*, videos};
use crate::services::media::MediaProcessor;
use crate::services::storage::StorageService;
use crate::services::storage_key::StorageKey;

/// Pipeline stage an upload failed in, carried on errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Staging,
    Probe,
    Remux,
    Upload,
    Persist,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Staging => "staging",
            PipelineStage::Probe => "probe",
            PipelineStage::Remux => "remux",
            PipelineStage::Upload => "upload",
            PipelineStage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Orchestrates the publish pipeline: stage the raw upload, probe its
/// geometry, remux for fast-start, derive a storage key, stream the result
/// to the object store and persist the public URL on the video record.
///
/// Stages run strictly in sequence with no retries. Temp files are owned as
/// `TempPath` values so they are removed on every exit path, including task
/// cancellation, in reverse order of creation.
pub struct VideoService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    media: Arc<dyn MediaProcessor>,
    config: AppConfig,
}

impl VideoService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        media: Arc<dyn MediaProcessor>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            storage,
            media,
            config,
        }
    }

    /// Fetch a video record and verify it belongs to the given user
    pub async fn get_owned_video(
        &self,
        video_id: &str,
        user_id: &str,
    ) -> Result<videos::Model, AppError> {
        let video = Videos::find_by_id(video_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if video.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        Ok(video)
    }

    /// Copy the inbound stream into a uniquely named staging file, enforcing
    /// the configured size cap. The returned `TempPath` deletes the file on drop.
    async fn stage_upload<'a>(
        &self,
        reader: impl AsyncRead + Unpin + Send + 'a,
    ) -> Result<TempPath, AppError> {
        let staged = tempfile::Builder::new()
            .prefix("video-upload-")
            .suffix(".mp4")
            .tempfile_in(&self.config.staging_dir)
            .map_err(|e| AppError::Internal(format!("Failed to create staging file: {}", e)))?;
        let staged_path = staged.into_temp_path();

        let max = self.config.max_video_size as u64;
        let mut limited = reader.take(max + 1);

        let mut file = tokio::fs::File::create(&staged_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open staging file: {}", e)))?;

        let copied = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

        if copied > max {
            return Err(AppError::PayloadTooLarge(
                "Video exceeds the maximum allowed size".to_string(),
            ));
        }

        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to flush staging file: {}", e)))?;

        Ok(staged_path)
    }

    /// Run the full publish pipeline for an owned video record. On success the
    /// record's `video_url` points at the stored fast-start object; on any
    /// failure the record is left untouched and all staging files are removed.
    pub async fn publish_video<'a>(
        &self,
        video: videos::Model,
        content_type: &str,
        reader: impl AsyncRead + Unpin + Send + 'a,
    ) -> Result<videos::Model, AppError> {
        let video_id = video.id.clone();

        // Staged
        let staged_path = self.stage_upload(reader).await?;

        // Analyzed
        let geometry = self
            .media
            .analyze(&staged_path)
            .await
            .map_err(|source| AppError::MediaTool {
                stage: PipelineStage::Probe,
                source,
            })?;

        info!(
            video_id = %video_id,
            width = geometry.width,
            height = geometry.height,
            ratio = geometry.ratio,
            class = %geometry.class,
            "classified video aspect ratio"
        );

        // Remuxed. Ownership of the output path is taken immediately so the
        // processed file is also removed on every subsequent exit path.
        let processed = self
            .media
            .remux(&staged_path)
            .await
            .map_err(|source| AppError::MediaTool {
                stage: PipelineStage::Remux,
                source,
            })?;
        let processed_path = TempPath::from_path(processed);

        let metadata = tokio::fs::metadata(&processed_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stat processed video: {}", e)))?;
        let size = metadata.len() as i64;

        // KeyAssigned
        let key = StorageKey::generate(geometry.class, content_type);
        let object_key = key.as_object_key();

        // Uploaded: rewind explicitly before handing the file to the store
        let mut file = tokio::fs::File::open(&processed_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open processed video: {}", e)))?;
        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to rewind processed video: {}", e)))?;

        self.storage
            .put_object(&object_key, file, size, content_type)
            .await
            .map_err(AppError::Storage)?;

        // Published. A failed record update after a successful upload leaves
        // the stored object orphaned; it is reported, not rolled back.
        let video_url = format!("https://{}/{}", self.config.asset_host, object_key);

        let mut active: videos::ActiveModel = video.into();
        active.video_url = Set(Some(video_url));
        active.updated_at = Set(Some(chrono::Utc::now()));

        let updated = active.update(&self.db).await.map_err(|source| {
            error!(
                video_id = %video_id,
                object_key = %object_key,
                "record update failed after upload; stored object is orphaned"
            );
            AppError::Persistence(source)
        })?;

        info!(
            video_id = %updated.id,
            object_key = %object_key,
            size,
            "published video"
        );

        Ok(updated)
        // staged_path and processed_path drop here: CleanedUp
    }
}
