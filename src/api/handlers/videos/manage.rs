use crate::api::error::AppError;
use crate::entities::{prelude::*, videos};
use crate::utils::auth::Claims;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use super::types::*;

#[utoipa::path(
    post,
    path = "/api/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 200, description = "Draft video record created", body = VideoResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn create_video(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateVideoRequest>,
) -> Result<Json<VideoResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = chrono::Utc::now();
    let model = videos::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(claims.sub),
        title: Set(req.title),
        description: Set(req.description),
        thumbnail_url: Set(None),
        video_url: Set(None),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
    };

    let video = model.insert(&state.db).await?;

    Ok(Json(video.into()))
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video record ID")
    ),
    responses(
        (status = 200, description = "Video record", body = VideoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Video belongs to another user"),
        (status = 404, description = "Video not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_video(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    Uuid::parse_str(&video_id).map_err(|_| AppError::BadRequest("Invalid video ID".to_string()))?;

    let video = state
        .video_service
        .get_owned_video(&video_id, &claims.sub)
        .await?;

    Ok(Json(video.into()))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    responses(
        (status = 200, description = "Caller's video records", body = [VideoResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn list_videos(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let records = Videos::find()
        .filter(videos::Column::UserId.eq(&claims.sub))
        .order_by_desc(videos::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(records.into_iter().map(VideoResponse::from).collect()))
}
