use axum::{extract::Multipart, Extension};
use serde_json::{json, Value};

use super::utils::run_generation;
use crate::a4f::A4fClient;
use crate::database::models::generation::kind;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};

struct UploadedImage {
    bytes: Vec<u8>,
    filename: String,
    content_type: Option<String>,
}

/// POST /api/edit/image - Prompt-driven image editing over a multipart
/// upload
///
/// Fields: `image` (the source image, memory-buffered), `prompt`, `model`.
pub async fn image(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut upload: Option<UploadedImage> = None;
    let mut prompt: Option<String> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or("") {
            "image" => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await?.to_vec();
                upload = Some(UploadedImage {
                    bytes,
                    filename,
                    content_type,
                });
            }
            "prompt" => prompt = Some(field.text().await?),
            "model" => model = Some(field.text().await?),
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("Missing required field: image"))?;
    let prompt = prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: prompt"))?;
    let model = model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: model"))?;

    let metadata = json!({
        "filename": upload.filename.clone(),
        "sizeBytes": upload.bytes.len(),
    });

    let a4f = A4fClient::from_config()?;
    let call_prompt = prompt.clone();
    let call_model = model.clone();
    let generation = run_generation(
        &user,
        kind::IMAGE_EDIT,
        &model,
        Some(&prompt),
        metadata,
        || async move {
            a4f.edit_image(
                upload.bytes,
                upload.filename,
                upload.content_type,
                &call_prompt,
                &call_model,
            )
            .await
        },
    )
    .await?;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}
