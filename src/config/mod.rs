use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
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
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Upper bound on accepted request bodies; must fit the largest upload.
    pub max_request_size_bytes: usize,
    /// Cap on rows returned by the points history endpoint.
    pub history_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// When set, uploaded payloads are addressed under this base URL instead
    /// of being inlined into the database as data URLs.
    pub object_store_url: Option<String>,
    /// Size ceiling for the inline data-URL fallback path.
    pub inline_max_bytes: usize,
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
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_HISTORY_LIMIT") {
            self.api.history_limit = v.parse().unwrap_or(self.api.history_limit);
        }

        // Storage overrides
        if let Ok(v) = env::var("OBJECT_STORE_URL") {
            if !v.trim().is_empty() {
                self.storage.object_store_url = Some(v);
            }
        }
        if let Ok(v) = env::var("STORAGE_INLINE_MAX_BYTES") {
            self.storage.inline_max_bytes = v.parse().unwrap_or(self.storage.inline_max_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                // Leaves headroom over the inline ceiling for multipart framing
                max_request_size_bytes: 110 * 1024 * 1024,
                history_limit: 100,
            },
            storage: StorageConfig {
                object_store_url: None,
                inline_max_bytes: 100 * 1024 * 1024,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            api: ApiConfig {
                max_request_size_bytes: 110 * 1024 * 1024,
                history_limit: 100,
            },
            storage: StorageConfig {
                object_store_url: None,
                inline_max_bytes: 100 * 1024 * 1024,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            api: ApiConfig {
                max_request_size_bytes: 110 * 1024 * 1024,
                history_limit: 100,
            },
            storage: StorageConfig {
                object_store_url: None,
                inline_max_bytes: 100 * 1024 * 1024,
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
