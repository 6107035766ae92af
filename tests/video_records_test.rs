use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{json, Value};
use tower::ServiceExt;

use rust_video_backend::config::AppConfig;
use rust_video_backend::infrastructure::database;
use rust_video_backend::services::media::{MediaProcessor, MediaToolError, VideoGeometry};
use rust_video_backend::services::storage::StorageService;
use rust_video_backend::services::thumbnail_store::ThumbnailStore;
use rust_video_backend::services::video_service::VideoService;
use rust_video_backend::utils::auth::create_jwt;
use rust_video_backend::{create_app, AppState};

const TEST_SECRET: &str = "test_secret";

struct NoopStorage;

#[async_trait]
impl StorageService for NoopStorage {
    async fn put_object(
        &self,
        _key: &str,
        _file: tokio::fs::File,
        _size: i64,
        _content_type: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn object_exists(&self, _key: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

struct NoopMedia;

#[async_trait]
impl MediaProcessor for NoopMedia {
    async fn analyze(&self, _path: &Path) -> Result<VideoGeometry, MediaToolError> {
        Ok(VideoGeometry::from_dimensions(1920, 1080))
    }

    async fn remux(&self, path: &Path) -> Result<PathBuf, MediaToolError> {
        Ok(path.to_path_buf())
    }
}

async fn setup_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let config = AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    };

    let storage: Arc<dyn StorageService> = Arc::new(NoopStorage);
    let video_service = Arc::new(VideoService::new(
        db.clone(),
        storage.clone(),
        Arc::new(NoopMedia),
        config.clone(),
    ));

    create_app(AppState {
        db,
        storage,
        video_service,
        thumbnails: Arc::new(ThumbnailStore::new(16)),
        config,
    })
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn creates_and_fetches_a_video_record() {
    let app = setup_app().await;
    let token = create_jwt("user_123", TEST_SECRET).unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/videos",
            Some(&token),
            json!({ "title": "Boots goes hiking", "description": "trail footage" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let created = response_json(response).await;
    assert_eq!(created["title"], "Boots goes hiking");
    assert_eq!(created["user_id"], "user_123");
    assert!(created["video_url"].is_null());
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/videos/{id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(fetched["id"], id.as_str());
}

#[tokio::test]
async fn rejects_empty_title() {
    let app = setup_app().await;
    let token = create_jwt("user_123", TEST_SECRET).unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/videos",
            Some(&token),
            json!({ "title": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lists_only_own_videos() {
    let app = setup_app().await;
    let alice = create_jwt("alice", TEST_SECRET).unwrap();
    let bob = create_jwt("bob", TEST_SECRET).unwrap();

    for title in ["first", "second"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/videos",
                Some(&alice),
                json!({ "title": title }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/videos",
            Some(&bob),
            json!({ "title": "bobs clip" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/videos")
                .header(header::AUTHORIZATION, format!("Bearer {alice}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let listing = response_json(response).await;
    let items = listing.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|v| v["user_id"] == "alice"));
}

#[tokio::test]
async fn record_endpoints_require_token() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/videos",
            None,
            json!({ "title": "anonymous" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/videos")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "ok");
}
