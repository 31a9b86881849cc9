use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub quota: QuotaConfig,
    pub a4f: A4fConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub generations_page_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Empty list means permissive CORS (development convenience)
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub free_generation_limit: i32,
    pub premium_generation_limit: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A4fConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub image_dir: String,
    pub max_image_bytes: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging =
                v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes =
                v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_GENERATIONS_PAGE_LIMIT") {
            self.api.generations_page_limit =
                v.parse().unwrap_or(self.api.generations_page_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // Quota overrides
        if let Ok(v) = env::var("FREE_TIER_GENERATION_LIMIT") {
            self.quota.free_generation_limit =
                v.parse().unwrap_or(self.quota.free_generation_limit);
        }
        if let Ok(v) = env::var("PREMIUM_TIER_GENERATION_LIMIT") {
            self.quota.premium_generation_limit =
                v.parse().unwrap_or(self.quota.premium_generation_limit);
        }

        // Upstream AI provider overrides
        if let Ok(v) = env::var("A4F_BASE_URL") {
            self.a4f.base_url = v;
        }

        // Storage overrides
        if let Ok(v) = env::var("IMAGE_STORAGE_DIR") {
            self.storage.image_dir = v;
        }
        if let Ok(v) = env::var("IMAGE_MAX_BYTES") {
            self.storage.max_image_bytes = v.parse().unwrap_or(self.storage.max_image_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 25 * 1024 * 1024, // 25MB (audio uploads)
                generations_page_limit: 50,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                secure_cookies: false,
            },
            quota: QuotaConfig {
                free_generation_limit: 50,
                premium_generation_limit: 10_000,
            },
            a4f: A4fConfig {
                base_url: "https://api.a4f.co/v1".to_string(),
            },
            storage: StorageConfig {
                image_dir: "stored-images".to_string(),
                max_image_bytes: 20 * 1024 * 1024,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 25 * 1024 * 1024,
                generations_page_limit: 50,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.loveaihub.com".to_string()],
                secure_cookies: true,
            },
            quota: QuotaConfig {
                free_generation_limit: 50,
                premium_generation_limit: 10_000,
            },
            a4f: A4fConfig {
                base_url: "https://api.a4f.co/v1".to_string(),
            },
            storage: StorageConfig {
                image_dir: "stored-images".to_string(),
                max_image_bytes: 20 * 1024 * 1024,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 25 * 1024 * 1024,
                generations_page_limit: 50,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://loveaihub.com".to_string()],
                secure_cookies: true,
            },
            quota: QuotaConfig {
                free_generation_limit: 50,
                premium_generation_limit: 10_000,
            },
            a4f: A4fConfig {
                base_url: "https://api.a4f.co/v1".to_string(),
            },
            storage: StorageConfig {
                image_dir: "stored-images".to_string(),
                max_image_bytes: 20 * 1024 * 1024,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

/// Read a required secret from the environment. Secrets are never baked into
/// the config profiles, so a missing variable fails at the call site with a
/// clear name instead of silently falling back.
pub fn required_env(name: &'static str) -> Result<String, &'static str> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.api.enable_request_logging);
        assert!(config.security.cors_origins.is_empty());
        assert!(!config.security.secure_cookies);
        assert_eq!(config.quota.free_generation_limit, 50);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.api.enable_request_logging);
        assert!(!config.security.cors_origins.is_empty());
        assert!(config.security.secure_cookies);
    }

    #[test]
    fn test_required_env_rejects_blank() {
        std::env::set_var("LOVEAIHUB_TEST_SECRET", "   ");
        assert!(required_env("LOVEAIHUB_TEST_SECRET").is_err());
        std::env::set_var("LOVEAIHUB_TEST_SECRET", "value");
        assert_eq!(required_env("LOVEAIHUB_TEST_SECRET").unwrap(), "value");
    }
}
