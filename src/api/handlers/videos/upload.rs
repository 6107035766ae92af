use crate::api::error::AppError;
use crate::utils::auth::Claims;
use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use super::types::VideoResponse;

#[utoipa::path(
    post,
    path = "/api/videos/{video_id}/upload",
    params(
        ("video_id" = String, Path, description = "Video record ID")
    ),
    request_body(content = Multipart, description = "Video upload, field name `video`, content type `video/mp4`"),
    responses(
        (status = 200, description = "Video processed and published", body = VideoResponse),
        (status = 400, description = "Bad request or unsupported content type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Video belongs to another user"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Video exceeds size limit"),
        (status = 502, description = "Processing or storage failure")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn upload_video(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    Uuid::parse_str(&video_id).map_err(|_| AppError::BadRequest("Invalid video ID".to_string()))?;

    let video = state
        .video_service
        .get_owned_video(&video_id, &claims.sub)
        .await?;
    let mut video = Some(video);

    // Capture errors so the remaining multipart stream can be drained if needed
    let result: Result<Json<VideoResponse>, AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("length limit exceeded") {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::BadRequest(err_msg)
            }
        })? {
            let name = field.name().unwrap_or_default().to_string();
            if name != "video" {
                continue;
            }

            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    AppError::BadRequest("Missing content type on video field".to_string())
                })?;

            let media_type: mime::Mime = content_type
                .parse()
                .map_err(|_| AppError::BadRequest("Invalid content type".to_string()))?;

            if media_type.essence_str() != "video/mp4" {
                return Err(AppError::BadRequest(
                    "Only video/mp4 uploads are supported".to_string(),
                ));
            }

            let video = video
                .take()
                .ok_or_else(|| AppError::BadRequest("Duplicate video field".to_string()))?;

            let body_with_io_error = field.map_err(std::io::Error::other);
            let reader = StreamReader::new(body_with_io_error);

            let published = state
                .video_service
                .publish_video(video, media_type.essence_str(), reader)
                .await?;

            return Ok(Json(published.into()));
        }

        Err(AppError::BadRequest("No video file provided".to_string()))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Consume the remaining multipart stream to avoid a TCP reset on
            // uploads rejected mid-body
            tracing::warn!("Video upload failed: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
