use std::env;
use std::fmt;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub admin: AdminCredentials,
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            database_url,
            admin: AdminCredentials {
                username: get("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
                password: get("ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            },
            allowed_origins,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }
}
