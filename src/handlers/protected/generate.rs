use axum::{Extension, Json};
use serde_json::{json, Value};

use super::utils::{require_str, run_generation};
use crate::a4f::A4fClient;
use crate::database::models::generation::kind;
use crate::database::models::Generation;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::GenerationService;
use crate::storage::FsImageStore;

/// POST /api/generate/image - Text-to-image
///
/// Expected Input:
/// ```json
/// {
///   "model": "provider-2/flux.1-schnell",
///   "prompt": "a cat",
///   "n": 1,
///   "size": "1024x1024"
/// }
/// ```
///
/// The full payload is forwarded to the provider; extra options pass
/// through untouched. Returned image URLs are mirrored into the local cache
/// and recorded under `metadata.cachedImages`.
pub async fn image(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let model = require_str(&payload, "model")?.to_string();
    let prompt = require_str(&payload, "prompt")?.to_string();

    let a4f = A4fClient::from_config()?;
    let body = payload.clone();
    let generation = run_generation(&user, kind::IMAGE, &model, Some(&prompt), payload, || async move {
        a4f.generate_image(&body).await
    })
    .await?;

    let generation = cache_generated_images(generation).await;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}

/// POST /api/generate/video - Text-to-video
pub async fn video(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let model = require_str(&payload, "model")?.to_string();
    let prompt = require_str(&payload, "prompt")?.to_string();

    let a4f = A4fClient::from_config()?;
    let body = payload.clone();
    let generation = run_generation(&user, kind::VIDEO, &model, Some(&prompt), payload, || async move {
        a4f.generate_video(&body).await
    })
    .await?;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}

/// POST /api/generate/audio - Text-to-speech; the spoken input text is
/// recorded as the generation prompt
pub async fn audio(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let model = require_str(&payload, "model")?.to_string();
    let input = require_str(&payload, "input")?.to_string();

    let a4f = A4fClient::from_config()?;
    let body = payload.clone();
    let generation = run_generation(&user, kind::AUDIO, &model, Some(&input), payload, || async move {
        a4f.create_speech(&body).await
    })
    .await?;

    Ok(ApiResponse::success(json!({ "generation": generation })))
}

/// Mirror provider-hosted image URLs into the local content-addressed cache
/// and record the filenames on the generation row. Caching is best-effort:
/// a failed download never fails the request that produced the image.
async fn cache_generated_images(mut generation: Generation) -> Generation {
    let urls: Vec<String> = generation
        .result
        .as_ref()
        .and_then(|r| r.get("data"))
        .and_then(|d| d.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("url").and_then(|u| u.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    if urls.is_empty() {
        return generation;
    }

    let store = FsImageStore::from_config();
    let http = reqwest::Client::new();
    let mut cached = Vec::new();

    for url in &urls {
        match store.download_and_store(&http, url).await {
            Ok(stored) => cached.push(stored.filename),
            Err(e) => tracing::warn!(url = %url, "image caching failed: {}", e),
        }
    }

    if cached.is_empty() {
        return generation;
    }

    let patch = json!({ "cachedImages": cached });
    match GenerationService::new().await {
        Ok(generations) => {
            if let Err(e) = generations.merge_metadata(generation.id, &patch).await {
                tracing::warn!(generation_id = %generation.id, "metadata update failed: {}", e);
            } else if let Value::Object(map) = &mut generation.metadata {
                map.insert("cachedImages".to_string(), json!(cached));
            }
        }
        Err(e) => tracing::warn!("metadata update skipped: {}", e),
    }

    generation
}
