pub mod manage;
pub mod thumbnail;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use manage::{create_video, get_video, list_videos};
pub use thumbnail::{get_thumbnail, upload_thumbnail};
pub use upload::upload_video;
