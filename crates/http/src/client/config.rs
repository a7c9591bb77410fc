//! Client configuration
//!
//! The base URL is resolved once at startup: defaults first, then an optional
//! configuration file, then `CHAT_API_*` environment variables.

use super::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001/chat/";

/// Storage key the access token is read from
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";

/// Environment variable prefix (`CHAT_API_BASE_URL`, `CHAT_API_TIMEOUT_SECS`, ...)
pub const ENV_PREFIX: &str = "CHAT_API";

/// Chat API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix relative request paths are resolved against
    pub base_url: String,

    /// Request timeout in seconds (ignored on wasm32)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User agent sent with every request
    pub user_agent: String,

    /// Storage key holding the bearer token
    pub token_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: format!("chat-http/{}", env!("CARGO_PKG_VERSION")),
            token_key: ACCESS_TOKEN.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with the given base URL and defaults for the rest
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self, ClientError> {
        Self::load(None, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from file, with environment variables taking precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        Self::load(
            Some(path.as_ref()),
            config::Environment::with_prefix(ENV_PREFIX),
        )
    }

    fn load(file: Option<&Path>, env: config::Environment) -> Result<Self, ClientError> {
        let defaults = Self::default();

        let file_settings = file
            .map(|path| {
                config::Config::builder()
                    .add_source(config::File::from(path))
                    .build()
            })
            .transpose()?;

        // `baseUrl` is accepted from files; `base_url` still wins when both are set
        let base_url = file_settings
            .as_ref()
            .and_then(|settings| {
                settings
                    .get_string("baseUrl")
                    .or_else(|_| settings.get_string("baseurl"))
                    .ok()
            })
            .unwrap_or(defaults.base_url);

        let mut builder = config::Config::builder()
            .set_default("base_url", base_url)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default("token_key", defaults.token_key)?;

        if let Some(settings) = file_settings {
            builder = builder.add_source(settings);
        }

        let settings = builder.add_source(env).build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is absolute
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for relative or unparseable URLs
    pub fn validate(&self) -> Result<(), ClientError> {
        url::Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|e| ClientError::Configuration(format!("base_url {:?}: {e}", self.base_url)))
    }
}
