use clap::Parser;
use dotenvy::dotenv;
use rust_video_backend::config::AppConfig;
use rust_video_backend::infrastructure::{database, storage};
use rust_video_backend::services::media::{FfmpegProcessor, MediaProcessor};
use rust_video_backend::services::thumbnail_store::ThumbnailStore;
use rust_video_backend::services::video_service::VideoService;
use rust_video_backend::{create_app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_video_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Rust Video Backend...");

    let config = AppConfig::from_env();
    info!(
        "🎞️  Upload Config: Max Video={}MB, Tool Timeout={}s, ffmpeg={}, ffprobe={}",
        config.max_video_size / 1024 / 1024,
        config.tool_timeout_secs,
        config.ffmpeg_path,
        config.ffprobe_path
    );

    let db = database::setup_database().await?;
    let s3 = storage::setup_storage().await;
    let storage_service: Arc<dyn rust_video_backend::services::storage::StorageService> = s3;

    let media: Arc<dyn MediaProcessor> = Arc::new(FfmpegProcessor::new(&config));

    let video_service = Arc::new(VideoService::new(
        db.clone(),
        storage_service.clone(),
        media,
        config.clone(),
    ));

    let thumbnails = Arc::new(ThumbnailStore::new(config.thumbnail_cache_entries));

    let state = AppState {
        db,
        storage: storage_service,
        video_service,
        thumbnails,
        config,
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
    info!(
        "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
        args.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
