/// Configuration management for the API server
///
/// Configuration is read once at startup into a [`Config`] value that is
/// handed to whatever needs it. Nothing reads the environment after that.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `DATABASE_URL`: PostgreSQL connection string (optional, in-memory store if unset)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, at least 32 characters)
/// - `SENDGRID_API_KEY`: SendGrid key (optional, mail is only logged if unset)
/// - `FROM_EMAIL`: Sender address (default: noreply@tasknest.local)
/// - `AVATAR_MAX_BYTES`: Upload limit for avatars (default: 1000000)
/// - `CORS_ORIGINS`: Comma-separated origins (default: *)
/// - `README_PATH`: Markdown file served at `/` (default: README.md)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `RUST_LOG`: Log filter
/// - `LOG_FORMAT`: `json` for JSON log lines
///
/// # Example
///
/// ```no_run
/// use tasknest_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_FROM_EMAIL: &str = "noreply@tasknest.local";
const DEFAULT_AVATAR_MAX_BYTES: usize = 1_000_000;
const DEFAULT_README_PATH: &str = "README.md";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub mail: MailConfig,

    pub upload: UploadConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,

    /// Production mode (adds HSTS)
    pub production: bool,

    /// Markdown file rendered on the index page
    pub readme_path: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; `None` selects the in-memory store
    pub url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SendGrid API key; `None` disables delivery
    #[serde(skip_serializing)]
    pub sendgrid_api_key: Option<String>,

    /// Sender address
    pub from: String,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted avatar upload in bytes
    pub avatar_max_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - A numeric or boolean variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = match var("PRODUCTION") {
            Some(value) => value
                .parse::<bool>()
                .map_err(|e| anyhow::anyhow!("PRODUCTION is invalid: {}", e))?,
            None => false,
        };

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let avatar_max_bytes = match var("AVATAR_MAX_BYTES") {
            Some(value) => value
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("AVATAR_MAX_BYTES is invalid: {}", e))?,
            None => DEFAULT_AVATAR_MAX_BYTES,
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
                readme_path: var("README_PATH")
                    .unwrap_or_else(|| DEFAULT_README_PATH.to_string()),
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL"),
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            mail: MailConfig {
                sendgrid_api_key: var("SENDGRID_API_KEY"),
                from: var("FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
            },
            upload: UploadConfig { avatar_max_bytes },
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
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.api.readme_path, "README.md");
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert!(config.mail.sendgrid_api_key.is_none());
        assert_eq!(config.mail.from, "noreply@tasknest.local");
        assert_eq!(config.upload.avatar_max_bytes, 1_000_000);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "8080"),
            ("DATABASE_URL", "postgresql://localhost/tasknest"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("PRODUCTION", "true"),
            ("SENDGRID_API_KEY", "SG.key"),
            ("AVATAR_MAX_BYTES", "2048"),
            ("README_PATH", "/srv/tasknest/README.md"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgresql://localhost/tasknest")
        );
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.api.production);
        assert_eq!(config.mail.sendgrid_api_key.as_deref(), Some("SG.key"));
        assert_eq!(config.upload.avatar_max_bytes, 2048);
        assert_eq!(config.api.readme_path, "/srv/tasknest/README.md");
    }

    #[test]
    fn test_secret_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "too-short")]).is_err());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(load(&[("JWT_SECRET", SECRET), ("API_PORT", "http")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("AVATAR_MAX_BYTES", "-1")]).is_err());
    }
}
