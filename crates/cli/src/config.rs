//! CLI configuration utilities

use anyhow::{Context, Result};
use chat_http::ClientConfig;
use std::path::{Path, PathBuf};

/// Resolve the client configuration: file (if any) and `CHAT_API_*`, then flags
///
/// Flags only override what they were given for; a timeout of `0` disables it.
pub fn load_client_config(
    path: Option<&Path>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ClientConfig::from_env()?,
    };

    if let Some(base_url) = base_url {
        config.base_url = base_url;
        config.validate()?;
    }
    if let Some(secs) = timeout_secs {
        config.timeout_secs = (secs > 0).then_some(secs);
    }

    Ok(config)
}

/// Directory holding CLI state
pub fn state_dir() -> PathBuf {
    // Check environment variable first, then fall back to system data dir
    std::env::var("CHAT_STATE_DIR").map_or_else(
        |_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chatctl")
        },
        PathBuf::from,
    )
}

pub fn default_token_file() -> PathBuf {
    state_dir().join("tokens.json")
}
