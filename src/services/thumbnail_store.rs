use bytes::Bytes;
use dashmap::DashMap;

#[derive(Clone)]
pub struct CachedThumbnail {
    pub data: Bytes,
    pub content_type: String,
}

/// Bounded, in-memory, key-addressed thumbnail cache. Entries are small
/// (capped at upload time) and keyed by video id; when full, an arbitrary
/// entry is dropped to make room rather than growing without bound.
pub struct ThumbnailStore {
    entries: DashMap<String, CachedThumbnail>,
    max_entries: usize,
}

impl ThumbnailStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    pub fn insert(&self, video_id: &str, data: Bytes, content_type: String) {
        if !self.entries.contains_key(video_id) && self.entries.len() >= self.max_entries {
            let evict = self.entries.iter().next().map(|e| e.key().clone());
            if let Some(key) = evict {
                self.entries.remove(&key);
            }
        }

        self.entries
            .insert(video_id.to_string(), CachedThumbnail { data, content_type });
    }

    pub fn get(&self, video_id: &str) -> Option<CachedThumbnail> {
        self.entries.get(video_id).map(|e| e.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let store = ThumbnailStore::new(8);
        store.insert("abc", Bytes::from_static(b"png bytes"), "image/png".into());

        let thumb = store.get("abc").unwrap();
        assert_eq!(thumb.data.as_ref(), b"png bytes");
        assert_eq!(thumb.content_type, "image/png");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_replacing_existing_entry_does_not_evict() {
        let store = ThumbnailStore::new(1);
        store.insert("a", Bytes::from_static(b"v1"), "image/png".into());
        store.insert("a", Bytes::from_static(b"v2"), "image/jpeg".into());

        let thumb = store.get("a").unwrap();
        assert_eq!(thumb.data.as_ref(), b"v2");
        assert_eq!(thumb.content_type, "image/jpeg");
    }

    #[test]
    fn test_entry_count_stays_bounded() {
        let store = ThumbnailStore::new(4);
        for i in 0..32 {
            store.insert(
                &format!("video-{i}"),
                Bytes::from_static(b"data"),
                "image/png".into(),
            );
        }
        assert!(store.entries.len() <= 4);
    }
}
