use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::media::AspectClass;

/// 256 bits of entropy per key; collision resistance relies on this alone
const TOKEN_BYTES: usize = 32;

/// Opaque object-store key: `{class-dir}/{random-token}.{ext}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    dir: &'static str,
    token: String,
    extension: String,
}

impl StorageKey {
    /// Generate a fresh key for an upload with the given classification and
    /// content type. The extension is the subtype portion of the content type.
    pub fn generate(class: AspectClass, content_type: &str) -> Self {
        let mut raw = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut raw);

        let extension = content_type
            .split('/')
            .nth(1)
            .unwrap_or("bin")
            .to_string();

        Self {
            dir: class.as_dir(),
            token: URL_SAFE_NO_PAD.encode(raw),
            extension,
        }
    }

    pub fn as_object_key(&self) -> String {
        format!("{}/{}.{}", self.dir, self.token, self.extension)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.dir, self.token, self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let key = StorageKey::generate(AspectClass::Landscape, "video/mp4");
            assert!(seen.insert(key.as_object_key()), "duplicate key generated");
        }
    }

    #[test]
    fn test_directory_follows_classification() {
        let landscape = StorageKey::generate(AspectClass::Landscape, "video/mp4");
        let portrait = StorageKey::generate(AspectClass::Portrait, "video/mp4");
        let other = StorageKey::generate(AspectClass::Other, "video/mp4");

        assert!(landscape.as_object_key().starts_with("landscape/"));
        assert!(portrait.as_object_key().starts_with("portrait/"));
        assert!(other.as_object_key().starts_with("other/"));
    }

    #[test]
    fn test_extension_from_content_type_subtype() {
        let key = StorageKey::generate(AspectClass::Other, "video/mp4");
        assert!(key.as_object_key().ends_with(".mp4"));

        let key = StorageKey::generate(AspectClass::Other, "video/webm");
        assert!(key.as_object_key().ends_with(".webm"));
    }

    #[test]
    fn test_token_is_url_safe() {
        let key = StorageKey::generate(AspectClass::Portrait, "video/mp4");
        let object_key = key.as_object_key();
        let token = object_key
            .strip_prefix("portrait/")
            .and_then(|s| s.strip_suffix(".mp4"))
            .unwrap();

        // 32 bytes base64-encoded without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_display_matches_object_key() {
        let key = StorageKey::generate(AspectClass::Landscape, "video/mp4");
        assert_eq!(key.to_string(), key.as_object_key());
    }
}
