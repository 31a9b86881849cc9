use axum::{extract::DefaultBodyLimit, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod a4f;
mod auth;
mod billing;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod services;
mod storage;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, A4F_API_KEY, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("loveaihub=info,tower_http=info")),
        )
        .init();

    tracing::info!("Starting LoveAIHub API in {:?} mode", config.environment);

    // Schema setup is best-effort at boot: the pool is created lazily, so a
    // temporarily unreachable database must not prevent the server from
    // binding (health reports degraded instead).
    if let Err(e) = crate::database::manager::DatabaseManager::migrate().await {
        tracing::warn!("database migrations deferred: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("LOVEAIHUB_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("LoveAIHub API server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    crate::database::manager::DatabaseManager::close_all().await;
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}

fn app() -> Router {
    let config = crate::config::config();

    Router::new()
        // Public
        .route("/", get(root))
        .route("/api/health", get(health))
        // Public auth routes (Supabase-backed sessions)
        .merge(auth_routes())
        // Public content
        .merge(blog_routes())
        .merge(image_routes())
        .merge(webhook_routes())
        // Protected API (session required)
        .merge(generation_routes())
        .merge(billing_routes())
        // Elevated API (session + admin required)
        .merge(admin_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
}

fn cors_layer() -> CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{AllowOrigin, Any};

    let config = crate::config::config();

    if config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        // Email/password sessions
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/auth/user", get(auth::current_user))
        // Password recovery
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/update-password", post(auth::update_password))
        // Google OAuth
        .route("/api/auth/google", get(auth::google))
        .route("/auth/callback", get(auth::oauth_callback))
}

fn blog_routes() -> Router {
    use handlers::public::blog;

    Router::new()
        .route("/api/blog", get(blog::list))
        .route("/api/blog/:slug", get(blog::get_by_slug))
}

fn image_routes() -> Router {
    use handlers::public::images;

    Router::new().route("/api/images/:filename", get(images::get))
}

fn webhook_routes() -> Router {
    use axum::routing::post;
    use handlers::public::webhooks;

    Router::new().route("/api/webhooks/razorpay", post(webhooks::razorpay))
}

fn generation_routes() -> Router {
    use axum::routing::post;
    use handlers::protected::{chat, edit, embeddings, generate, generations, transcribe};

    Router::new()
        .route("/api/generate/image", post(generate::image))
        .route("/api/generate/video", post(generate::video))
        .route("/api/generate/audio", post(generate::audio))
        .route("/api/chat/completions", post(chat::completions))
        .route("/api/transcribe", post(transcribe::transcribe))
        .route("/api/edit/image", post(edit::image))
        .route("/api/embeddings", post(embeddings::create))
        .route("/api/generations", get(generations::list))
        .route_layer(axum::middleware::from_fn(middleware::auth::auth_middleware))
}

fn billing_routes() -> Router {
    use axum::routing::post;
    use handlers::protected::billing;

    Router::new()
        .route("/api/subscribe", post(billing::subscribe))
        .route_layer(axum::middleware::from_fn(middleware::auth::auth_middleware))
}

fn admin_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::elevated::{admin, blog};

    Router::new()
        // Blog authoring
        .route("/api/admin/blog", post(blog::create))
        .route("/api/admin/blog/:id", put(blog::update).delete(blog::remove))
        // Platform overview
        .route("/api/admin/users", get(admin::users))
        .route("/api/admin/stats", get(admin::stats))
        .route_layer(axum::middleware::from_fn(middleware::admin::require_admin))
        .route_layer(axum::middleware::from_fn(middleware::auth::auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "LoveAIHub API",
            "version": version,
            "description": "Unified backend over a multi-model AI provider",
            "endpoints": {
                "health": "/api/health (public)",
                "auth": "/api/auth/* (public - session acquisition)",
                "blog": "/api/blog[/:slug] (public)",
                "images": "/api/images/:filename (public)",
                "generate": "/api/generate/{image,video,audio} (protected)",
                "chat": "/api/chat/completions (protected)",
                "transcribe": "/api/transcribe (protected)",
                "edit": "/api/edit/image (protected)",
                "embeddings": "/api/embeddings (protected)",
                "generations": "/api/generations (protected)",
                "subscribe": "/api/subscribe (protected)",
                "admin": "/api/admin/* (restricted, requires admin)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
