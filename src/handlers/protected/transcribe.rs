use axum::{extract::Multipart, Extension};
use serde_json::{json, Value};

use super::utils::run_generation;
use crate::a4f::A4fClient;
use crate::database::models::generation::kind;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};

struct UploadedFile {
    bytes: Vec<u8>,
    filename: String,
    content_type: Option<String>,
}

/// POST /api/transcribe - Speech-to-text over a multipart upload
///
/// Fields: `file` (the audio upload, memory-buffered) and `model`.
pub async fn transcribe(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut file: Option<UploadedFile> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await?.to_vec();
                file = Some(UploadedFile {
                    bytes,
                    filename,
                    content_type,
                });
            }
            "model" => model = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("Missing required field: file"))?;
    let model = model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: model"))?;

    let metadata = json!({
        "filename": file.filename.clone(),
        "sizeBytes": file.bytes.len(),
    });

    let a4f = A4fClient::from_config()?;
    let call_model = model.clone();
    let generation = run_generation(&user, kind::TRANSCRIPTION, &model, None, metadata, || async move {
        a4f.transcribe(file.bytes, file.filename, file.content_type, &call_model)
            .await
    })
    .await?;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}
