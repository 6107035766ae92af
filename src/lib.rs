pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::storage::StorageService;
use crate::services::thumbnail_store::ThumbnailStore;
use crate::services::video_service::VideoService;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::videos::manage::create_video,
        api::handlers::videos::manage::get_video,
        api::handlers::videos::manage::list_videos,
        api::handlers::videos::upload::upload_video,
        api::handlers::videos::thumbnail::upload_thumbnail,
        api::handlers::videos::thumbnail::get_thumbnail,
    ),
    components(
        schemas(
            api::handlers::videos::CreateVideoRequest,
            api::handlers::videos::VideoResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video record and publishing endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub video_service: Arc<VideoService>,
    pub thumbnails: Arc<ThumbnailStore>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/thumbnails/:video_id",
            get(api::handlers::videos::get_thumbnail),
        )
        .route(
            "/api/videos",
            post(api::handlers::videos::create_video)
                .get(api::handlers::videos::list_videos)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/api/videos/:video_id",
            get(api::handlers::videos::get_video).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/api/videos/:video_id/upload",
            post(api::handlers::videos::upload_video)
                .layer(DefaultBodyLimit::max(
                    state.config.max_video_size + 10 * 1024 * 1024, // Multipart overhead buffer
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/api/videos/:video_id/thumbnail",
            post(api::handlers::videos::upload_thumbnail)
                .layer(DefaultBodyLimit::max(
                    state.config.max_thumbnail_size + 1024 * 1024,
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
