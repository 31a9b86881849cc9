// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body (same envelope the success path uses)
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::manager::DatabaseError::ConfigMissing(_) => {
                ApiError::service_unavailable("Database not configured")
            }
            crate::database::manager::DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            crate::database::manager::DatabaseError::InvalidDatabaseUrl => {
                ApiError::service_unavailable("Database not configured")
            }
        }
    }
}

impl From<crate::services::user_service::UserError> for ApiError {
    fn from(err: crate::services::user_service::UserError) -> Self {
        use crate::services::user_service::UserError;
        match err {
            UserError::QuotaExhausted => ApiError::forbidden(
                "Free tier generation limit reached. Upgrade your plan to continue generating.",
            ),
            UserError::NotFound(id) => ApiError::not_found(format!("User {} not found", id)),
            UserError::Manager(e) => e.into(),
            UserError::Database(e) => {
                tracing::error!("User query error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::services::generation_service::GenerationError> for ApiError {
    fn from(err: crate::services::generation_service::GenerationError) -> Self {
        use crate::services::generation_service::GenerationError;
        match err {
            GenerationError::NotFound(id) => {
                ApiError::not_found(format!("Generation {} not found", id))
            }
            GenerationError::Manager(e) => e.into(),
            GenerationError::Database(e) => {
                tracing::error!("Generation query error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::services::blog_service::BlogError> for ApiError {
    fn from(err: crate::services::blog_service::BlogError) -> Self {
        use crate::services::blog_service::BlogError;
        match err {
            BlogError::NotFound(slug) => {
                ApiError::not_found(format!("Blog post '{}' not found", slug))
            }
            BlogError::SlugExhausted(title) => {
                tracing::error!("Could not derive a unique slug for '{}'", title);
                ApiError::internal_server_error("Could not derive a unique slug for this title")
            }
            BlogError::Manager(e) => e.into(),
            BlogError::Database(e) => {
                tracing::error!("Blog query error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::services::subscription_service::SubscriptionError> for ApiError {
    fn from(err: crate::services::subscription_service::SubscriptionError) -> Self {
        use crate::services::subscription_service::SubscriptionError;
        match err {
            SubscriptionError::NotFound(id) => {
                ApiError::not_found(format!("Subscription {} not found", id))
            }
            SubscriptionError::Manager(e) => e.into(),
            SubscriptionError::Database(e) => {
                tracing::error!("Subscription query error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::auth::supabase::AuthError> for ApiError {
    fn from(err: crate::auth::supabase::AuthError) -> Self {
        use crate::auth::supabase::AuthError;
        match err {
            AuthError::Rejected { status, message } => {
                if status == 401 || status == 403 {
                    ApiError::unauthorized(message)
                } else {
                    ApiError::bad_request(message)
                }
            }
            AuthError::MissingConfig(var) => {
                ApiError::service_unavailable(format!("Auth service not configured ({})", var))
            }
            AuthError::Http(e) => {
                tracing::error!("Auth service request failed: {}", e);
                ApiError::bad_gateway("Auth service unreachable")
            }
        }
    }
}

impl From<crate::a4f::client::A4fError> for ApiError {
    fn from(err: crate::a4f::client::A4fError) -> Self {
        use crate::a4f::client::A4fError;
        match err {
            A4fError::Upstream { status, message } => {
                tracing::warn!(status, "upstream AI provider error: {}", message);
                ApiError::bad_gateway(format!("AI provider error: {}", message))
            }
            A4fError::MissingConfig(var) => {
                ApiError::service_unavailable(format!("AI provider not configured ({})", var))
            }
            A4fError::Http(e) => {
                tracing::error!("AI provider request failed: {}", e);
                ApiError::bad_gateway("AI provider unreachable")
            }
        }
    }
}

impl From<crate::billing::razorpay::BillingError> for ApiError {
    fn from(err: crate::billing::razorpay::BillingError) -> Self {
        use crate::billing::razorpay::BillingError;
        match err {
            BillingError::InvalidSignature => {
                ApiError::bad_request("Invalid webhook signature")
            }
            BillingError::Upstream { status, message } => {
                tracing::warn!(status, "payment provider error: {}", message);
                ApiError::bad_gateway(format!("Payment provider error: {}", message))
            }
            BillingError::MissingConfig(var) => {
                ApiError::service_unavailable(format!("Billing not configured ({})", var))
            }
            BillingError::Http(e) => {
                tracing::error!("Payment provider request failed: {}", e);
                ApiError::bad_gateway("Payment provider unreachable")
            }
        }
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        use crate::storage::StorageError;
        match err {
            StorageError::NotFound(name) => {
                ApiError::not_found(format!("Image '{}' not found", name))
            }
            StorageError::InvalidFilename(_) => ApiError::bad_request("Invalid image filename"),
            StorageError::SizeLimitExceeded { .. } => {
                ApiError::bad_request("Image exceeds the configured size limit")
            }
            StorageError::UpstreamStatus(status) => {
                ApiError::bad_gateway(format!("Image download failed with status {}", status))
            }
            StorageError::Http(e) => {
                tracing::error!("Image download failed: {}", e);
                ApiError::bad_gateway("Image download failed")
            }
            StorageError::Io(e) => {
                tracing::error!("Image storage I/O error: {}", e);
                ApiError::internal_server_error("Image storage error")
            }
            StorageError::InvalidHash(_) => ApiError::bad_request("Invalid content hash"),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::bad_request(format!("Invalid multipart payload: {}", err))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
