//! API server configuration.
//!
//! Layered with the `config` crate:
//!
//! ```text
//! built-in defaults
//!       ▲ overridden by
//! storehub.toml            (path from STOREHUB_CONFIG, optional)
//!       ▲ overridden by
//! STOREHUB__SECTION__KEY   (e.g. STOREHUB__AUTH__JWT_SECRET)
//! ```

use std::env;
use std::net::SocketAddr;

use config::{Config, Environment, File};
use serde::Deserialize;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "storehub.toml";

/// Full application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub loyalty: LoyaltyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    pub bind_addr: SocketAddr,

    /// Allow any CORS origin. Localhost only when false.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "storehub.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Required.
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub access_lifetime_secs: i64,

    /// Refresh token lifetime in seconds
    pub refresh_lifetime_secs: i64,

    /// Admin created on startup when the employees table is empty
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: String::new(),
            access_lifetime_secs: 3600,     // 1 hour
            refresh_lifetime_secs: 604_800, // 7 days
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

/// Which transactional email backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    /// Log the message instead of sending it
    #[default]
    Log,
    Resend,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub provider: EmailProviderKind,
    pub api_key: Option<String>,
    pub api_base: String,
    pub from_address: String,

    /// Receives low-stock alerts. Alerts are skipped when unset.
    pub alert_recipient: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            provider: EmailProviderKind::Log,
            api_key: None,
            api_base: "https://api.resend.com".to_string(),
            from_address: "StoreHub <no-reply@storehub.local>".to_string(),
            alert_recipient: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoyaltyConfig {
    /// Spend (in cents) that earns one base point
    pub cents_per_point: i64,

    /// Redemption value of one point, used for the liability report
    pub point_value_cents: i64,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        LoyaltyConfig {
            cents_per_point: 100,
            point_value_cents: 1,
        }
    }
}

impl AppConfig {
    /// Loads defaults, the optional TOML file and `STOREHUB__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("STOREHUB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config: AppConfig = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("STOREHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }

        if self.auth.access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.access_lifetime_secs".to_string()));
        }
        if self.auth.refresh_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.refresh_lifetime_secs".to_string()));
        }

        if self.email.provider == EmailProviderKind::Resend
            && self.email.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingRequired("email.api_key".to_string()));
        }

        if self.loyalty.cents_per_point <= 0 {
            return Err(ConfigError::InvalidValue("loyalty.cents_per_point".to_string()));
        }
        if self.loyalty.point_value_cents < 0 {
            return Err(ConfigError::InvalidValue("loyalty.point_value_cents".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
