use std::env;
use std::path::PathBuf;

/// Runtime configuration for the video backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum video upload size in bytes (default: 1 GiB)
    pub max_video_size: usize,

    /// Maximum thumbnail upload size in bytes (default: 10 MiB)
    pub max_thumbnail_size: usize,

    /// Upper bound on cached thumbnails held in memory (default: 1024)
    pub thumbnail_cache_entries: usize,

    /// Directory where uploads are staged before processing (default: system temp dir)
    pub staging_dir: PathBuf,

    /// Public host serving published video objects (CDN or bucket endpoint)
    pub asset_host: String,

    /// Base URL of this API, used to build thumbnail URLs
    pub public_base_url: String,

    /// JWT Secret Key
    pub jwt_secret: String,

    /// Path to the ffmpeg binary
    pub ffmpeg_path: String,

    /// Path to the ffprobe binary
    pub ffprobe_path: String,

    /// Deadline in seconds for a single external tool invocation (default: 60)
    pub tool_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_video_size: 1024 * 1024 * 1024, // 1 GiB
            max_thumbnail_size: 10 * 1024 * 1024,
            thumbnail_cache_entries: 1024,
            staging_dir: env::temp_dir(),
            asset_host: "localhost:9000".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            jwt_secret: "secret".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            tool_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_video_size: env::var("MAX_VIDEO_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_video_size),

            max_thumbnail_size: env::var("MAX_THUMBNAIL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_thumbnail_size),

            thumbnail_cache_entries: env::var("THUMBNAIL_CACHE_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.thumbnail_cache_entries),

            staging_dir: env::var("VIDEO_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            asset_host: env::var("ASSET_HOST").unwrap_or(default.asset_host),

            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),

            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(default.ffprobe_path),

            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.tool_timeout_secs),
        }
    }
}
