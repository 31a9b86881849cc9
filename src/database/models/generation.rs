use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One AI request and its outcome. Created `pending`, mutated exactly once
/// to `completed` or `failed`; `result` carries the raw provider response or
/// an `{"error": …}` object.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub generation_type: String,
    pub model: String,
    pub prompt: Option<String>,
    pub metadata: serde_json::Value,
    pub status: String,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub mod status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

pub mod kind {
    pub const IMAGE: &str = "image";
    pub const VIDEO: &str = "video";
    pub const CHAT: &str = "chat";
    pub const AUDIO: &str = "audio";
    pub const TRANSCRIPTION: &str = "transcription";
    pub const IMAGE_EDIT: &str = "image_edit";
    pub const EMBEDDING: &str = "embedding";
}
