pub mod hash;
pub mod images;

pub use hash::ContentHash;
pub use images::{FsImageStore, ImageStore, StoredImage};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid content hash: {0}")]
    InvalidHash(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Size limit exceeded: {actual} bytes (limit {limit})")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    #[error("Download request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed with status {0}")]
    UpstreamStatus(u16),
}
