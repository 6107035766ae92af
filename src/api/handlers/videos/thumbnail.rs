use crate::api::error::AppError;
use crate::entities::videos;
use crate::utils::auth::Claims;
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use super::types::VideoResponse;

#[utoipa::path(
    post,
    path = "/api/videos/{video_id}/thumbnail",
    params(
        ("video_id" = String, Path, description = "Video record ID")
    ),
    request_body(content = Multipart, description = "Thumbnail upload, field name `thumbnail`, any image/* content type"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Bad request or unsupported content type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Video belongs to another user"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Thumbnail exceeds size limit")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn upload_thumbnail(
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

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            AppError::PayloadTooLarge("Thumbnail exceeds the maximum allowed size".to_string())
        } else {
            AppError::BadRequest(err_msg)
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name != "thumbnail" {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::BadRequest("Missing content type on thumbnail field".to_string())
            })?;

        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Only image thumbnails are supported".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if data.len() > state.config.max_thumbnail_size {
            return Err(AppError::PayloadTooLarge(
                "Thumbnail exceeds the maximum allowed size".to_string(),
            ));
        }

        let video = video
            .take()
            .ok_or_else(|| AppError::BadRequest("Duplicate thumbnail field".to_string()))?;

        state.thumbnails.insert(&video_id, data, content_type);

        let thumbnail_url = format!(
            "{}/api/thumbnails/{}",
            state.config.public_base_url, video_id
        );

        let mut active: videos::ActiveModel = video.into();
        active.thumbnail_url = Set(Some(thumbnail_url));
        active.updated_at = Set(Some(chrono::Utc::now()));
        let updated = active.update(&state.db).await?;

        return Ok(Json(updated.into()));
    }

    Err(AppError::BadRequest(
        "No thumbnail file provided".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/thumbnails/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video record ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes"),
        (status = 404, description = "No thumbnail cached for this video")
    )
)]
pub async fn get_thumbnail(
    State(state): State<crate::AppState>,
    Path(video_id): Path<String>,
) -> Result<Response, AppError> {
    let thumb = state
        .thumbnails
        .get(&video_id)
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, thumb.content_type)], thumb.data).into_response())
}
