//! Chat HTTP client
//!
//! A single configured HTTP client for the chat backend. Relative paths are
//! resolved against a configurable base URL and every request carries
//! `Authorization: Bearer <token>` when a token is available from the
//! injected [`TokenProvider`].

pub mod client;

pub use client::{
    ACCESS_TOKEN, ApiClient, ApiClientBuilder, BearerAuth, ClientConfig, ClientError,
    DEFAULT_BASE_URL, FileStore, KeyValueStore, MemoryStore, RequestInterceptor, StaticToken,
    StoredToken, TokenProvider,
};
#[cfg(target_arch = "wasm32")]
pub use client::LocalStorage;

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
