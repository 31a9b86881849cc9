use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum A4fError {
    #[error("AI provider not configured: {0}")]
    MissingConfig(&'static str),
    #[error("AI provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

/// Thin client for the upstream multi-model AI API. One method per
/// capability; request bodies are forwarded as-is and responses returned
/// verbatim so the route layer stays a proxy.
pub struct A4fClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl A4fClient {
    pub fn from_config() -> Result<Self, A4fError> {
        let api_key =
            crate::config::required_env("A4F_API_KEY").map_err(A4fError::MissingConfig)?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: crate::config::config().a4f.base_url.clone(),
            api_key,
        })
    }

    pub async fn chat_completions(&self, body: &Value) -> Result<Value, A4fError> {
        self.post_json("/chat/completions", body, "chat completion")
            .await
    }

    pub async fn generate_image(&self, body: &Value) -> Result<Value, A4fError> {
        self.post_json("/images/generations", body, "image generation")
            .await
    }

    pub async fn generate_video(&self, body: &Value) -> Result<Value, A4fError> {
        self.post_json("/video/generations", body, "video generation")
            .await
    }

    pub async fn embeddings(&self, body: &Value) -> Result<Value, A4fError> {
        self.post_json("/embeddings", body, "embeddings").await
    }

    /// Text-to-speech. The provider answers with raw audio for most models;
    /// binary responses are wrapped as base64 so the result still fits the
    /// JSON `result` column.
    pub async fn create_speech(&self, body: &Value) -> Result<Value, A4fError> {
        let resp = self
            .http
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "speech generation").await?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("audio/") || content_type == "application/octet-stream" {
            let bytes = resp.bytes().await?;
            Ok(json!({
                "audio": {
                    "b64": BASE64.encode(&bytes),
                    "contentType": content_type,
                }
            }))
        } else {
            Ok(resp.json().await?)
        }
    }

    pub async fn transcribe(
        &self,
        file: Vec<u8>,
        filename: String,
        content_type: Option<String>,
        model: &str,
    ) -> Result<Value, A4fError> {
        let mut part = reqwest::multipart::Part::bytes(file).file_name(filename);
        if let Some(ct) = content_type {
            part = part.mime_str(&ct)?;
        }
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", model.to_string());

        let resp = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "transcription").await?;

        Ok(resp.json().await?)
    }

    pub async fn edit_image(
        &self,
        image: Vec<u8>,
        filename: String,
        content_type: Option<String>,
        prompt: &str,
        model: &str,
    ) -> Result<Value, A4fError> {
        let mut part = reqwest::multipart::Part::bytes(image).file_name(filename);
        if let Some(ct) = content_type {
            part = part.mime_str(&ct)?;
        }
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("prompt", prompt.to_string())
            .text("model", model.to_string());

        let resp = self
            .http
            .post(format!("{}/images/edits", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "image edit").await?;

        Ok(resp.json().await?)
    }

    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        context: &str,
    ) -> Result<Value, A4fError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, context).await?;

        Ok(resp.json().await?)
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, A4fError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let message = upstream_message(&body)
            .unwrap_or_else(|| format!("{} failed with status {}", context, status));

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "a4f api request failed"
        );

        Err(A4fError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human-readable message out of an OpenAI-style error envelope.
fn upstream_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;

    parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| parsed.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_reads_openai_envelope() {
        let body = r#"{"error":{"message":"model not found","type":"invalid_request_error"}}"#;
        assert_eq!(upstream_message(body).as_deref(), Some("model not found"));
    }

    #[test]
    fn upstream_message_reads_flat_envelope() {
        let body = r#"{"message":"rate limited"}"#;
        assert_eq!(upstream_message(body).as_deref(), Some("rate limited"));
    }

    #[test]
    fn upstream_message_rejects_non_json() {
        assert_eq!(upstream_message("<html>bad gateway</html>"), None);
    }
}
