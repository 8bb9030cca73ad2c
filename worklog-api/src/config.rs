/// Configuration management for the API server
///
/// Loads configuration from environment variables into a type-safe struct,
/// failing fast at startup on missing required values.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: Secret key for JWT signing, >= 32 chars (required)
/// - `API_HOST` / `API_PORT`: bind address (default 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default "*")
/// - `OAUTH_TOKEN_URL`, `OAUTH_USERINFO_URL`, `OAUTH_CLIENT_ID`,
///   `OAUTH_CLIENT_SECRET`, `OAUTH_REDIRECT_URI`: identity provider settings
/// - `TRACKER_BASE_URL`, `TRACKER_API_USER`, `TRACKER_API_TOKEN`: issue
///   tracker settings
/// - `DOCUMENT_DIR`: document storage directory (default: system temp dir)
/// - `RUST_LOG`: log filter (default: info)

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Identity provider configuration
    pub oauth: OauthSettings,

    /// Issue tracker configuration
    pub tracker: TrackerSettings,

    /// Document storage configuration
    pub storage: StorageSettings,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; "*" enables permissive CORS for development
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing; at least 32 bytes
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Identity provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthSettings {
    pub token_url: String,
    pub userinfo_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Issue tracker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    pub base_url: String,
    pub api_user: String,
    pub api_token: String,
}

/// Document storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Storage directory; None means the ephemeral system temp dir
    pub directory: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let oauth = OauthSettings {
            token_url: env::var("OAUTH_TOKEN_URL").unwrap_or_default(),
            userinfo_url: env::var("OAUTH_USERINFO_URL").unwrap_or_default(),
            client_id: env::var("OAUTH_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("OAUTH_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: env::var("OAUTH_REDIRECT_URI").unwrap_or_default(),
        };

        if oauth.token_url.is_empty() {
            tracing::warn!("OAUTH_TOKEN_URL not set; sign-in will fail until configured");
        }

        let tracker = TrackerSettings {
            base_url: env::var("TRACKER_BASE_URL").unwrap_or_default(),
            api_user: env::var("TRACKER_API_USER").unwrap_or_default(),
            api_token: env::var("TRACKER_API_TOKEN").unwrap_or_default(),
        };

        let storage = StorageSettings {
            directory: env::var("DOCUMENT_DIR").ok(),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            oauth,
            tracker,
            storage,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            oauth: OauthSettings {
                token_url: String::new(),
                userinfo_url: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
            },
            tracker: TrackerSettings {
                base_url: String::new(),
                api_user: String::new(),
                api_token: String::new(),
            },
            storage: StorageSettings { directory: None },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }
}
