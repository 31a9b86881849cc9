use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use super::hash::ContentHash;
use super::StorageError;

/// Metadata for a cached image file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub filename: String,
    pub hash: ContentHash,
    pub size: u64,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist image bytes, returning the stored filename and content hash.
    async fn store(&self, data: &[u8], ext: &str) -> Result<StoredImage, StorageError>;

    /// Read a stored image back: bytes plus a content type for serving.
    async fn open(&self, filename: &str) -> Result<(Vec<u8>, String), StorageError>;
}

/// Filesystem-backed content-addressed image cache.
///
/// Files are named `{first 16 hash chars}_{unix millis}.{ext}`, so identical
/// bytes stored twice share a hash prefix while keeping distinct names.
pub struct FsImageStore {
    base_dir: PathBuf,
    max_size: u64,
}

impl FsImageStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_size,
        }
    }

    pub fn from_config() -> Self {
        let config = &crate::config::config().storage;
        Self::new(config.image_dir.clone(), config.max_image_bytes)
    }

    /// Fetch a provider-hosted image and cache it locally.
    pub async fn download_and_store(
        &self,
        http: &reqwest::Client,
        url: &str,
    ) -> Result<StoredImage, StorageError> {
        let resp = http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(StorageError::UpstreamStatus(resp.status().as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let ext = extension_for(url, content_type.as_deref());

        let bytes = resp.bytes().await?;
        self.store(&bytes, &ext).await
    }

    fn temp_path(&self) -> PathBuf {
        self.base_dir
            .join(format!(".tmp-{}", Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn store(&self, data: &[u8], ext: &str) -> Result<StoredImage, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        fs::create_dir_all(&self.base_dir).await?;

        let hash = ContentHash::compute(data);
        let filename = format!(
            "{}_{}.{}",
            hash.short_prefix(),
            Utc::now().timestamp_millis(),
            ext
        );

        // Write through a temp file so readers never observe partial content
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, self.base_dir.join(&filename)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredImage {
            filename,
            hash,
            size: data.len() as u64,
        })
    }

    async fn open(&self, filename: &str) -> Result<(Vec<u8>, String), StorageError> {
        if !is_safe_filename(filename) {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }

        let path = self.base_dir.join(filename);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok((bytes, content_type))
    }
}

/// The read path takes a caller-supplied filename, so only a single plain
/// path component is accepted: no separators, no dot-prefixed names.
pub fn is_safe_filename(name: &str) -> bool {
    if name.is_empty() || name.len() > 128 {
        return false;
    }
    if name.starts_with('.') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Pick a file extension from the response content type, falling back to the
/// URL path, then to png (the dominant provider output).
pub fn extension_for(url: &str, content_type: Option<&str>) -> String {
    match content_type {
        Some(ct) if ct.starts_with("image/png") => return "png".into(),
        Some(ct) if ct.starts_with("image/jpeg") => return "jpg".into(),
        Some(ct) if ct.starts_with("image/webp") => return "webp".into(),
        Some(ct) if ct.starts_with("image/gif") => return "gif".into(),
        _ => {}
    }

    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(ext) = parsed.path().rsplit('.').next() {
            if ext.len() <= 4 && !ext.contains('/') && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return ext.to_ascii_lowercase();
            }
        }
    }

    "png".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (FsImageStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path().join("images"), 10 * 1024 * 1024);
        (store, dir)
    }

    #[tokio::test]
    async fn store_is_content_addressed() {
        let (store, _dir) = temp_store();
        let a = store.store(b"same bytes", "png").await.unwrap();
        let b = store.store(b"same bytes", "png").await.unwrap();

        // Hashes match for identical input even when filenames differ
        assert_eq!(a.hash, b.hash);
        assert!(a.filename.starts_with(&a.hash.short_prefix()));
    }

    #[tokio::test]
    async fn open_round_trips_bytes_and_content_type() {
        let (store, _dir) = temp_store();
        let stored = store.store(b"fake png bytes", "png").await.unwrap();

        let (bytes, content_type) = store.open(&stored.filename).await.unwrap();
        assert_eq!(bytes, b"fake png bytes");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn open_rejects_traversal() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.open("../etc/passwd").await,
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(matches!(
            store.open("a/b.png").await,
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(matches!(
            store.open(".hidden").await,
            Err(StorageError::InvalidFilename(_))
        ));
    }

    #[tokio::test]
    async fn open_missing_file_is_not_found() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.open("0011223344556677_1700000000000.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn size_limit_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path().join("images"), 10);
        assert!(matches!(
            store.store(b"more than ten bytes here", "png").await,
            Err(StorageError::SizeLimitExceeded { .. })
        ));
    }

    #[test]
    fn safe_filename_rules() {
        assert!(is_safe_filename("0011223344556677_1700000000000.png"));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename(".."));
        assert!(!is_safe_filename("a/../b"));
        assert!(!is_safe_filename("a\\b.png"));
        assert!(!is_safe_filename(".env"));
    }

    #[test]
    fn extension_prefers_content_type() {
        assert_eq!(extension_for("https://x/y.jpg", Some("image/png")), "png");
        assert_eq!(extension_for("https://x/y.webp", None), "webp");
        assert_eq!(extension_for("https://x/no-extension", None), "png");
    }
}
