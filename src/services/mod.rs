pub mod media;
pub mod storage;
pub mod storage_key;
pub mod thumbnail_store;
pub mod video_service;
