//! Chat API client

pub mod config;
pub mod error;
pub mod interceptor;
pub mod token;

pub use config::{ACCESS_TOKEN, ClientConfig, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use interceptor::{BearerAuth, RequestInterceptor};
#[cfg(target_arch = "wasm32")]
pub use token::LocalStorage;
pub use token::{
    FileStore, KeyValueStore, MemoryStore, StaticToken, StoredToken, TokenProvider,
};

use reqwest::{Client, ClientBuilder, Method, Request, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

/// Chat API client
///
/// Cheap to clone; clones share the connection pool, configuration and
/// interceptors.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
    interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
}

impl ApiClient {
    /// Create a client for the given configuration and token source
    pub fn new(
        config: ClientConfig,
        provider: impl TokenProvider + 'static,
    ) -> Result<Self, ClientError> {
        Self::builder()
            .config(config)
            .token_provider(provider)
            .build()
    }

    /// Create a client configured from `CHAT_API_*` environment variables
    pub fn from_env(provider: impl TokenProvider + 'static) -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?, provider)
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Resolve a request path against the base URL
    pub fn url_for(&self, path: &str) -> String {
        resolve_url(&self.config.base_url, path)
    }

    /// Create a request builder for a path relative to the base URL
    ///
    /// Interceptors run when the request is sent, not here.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url_for(path))
    }

    /// Build the request and run it through the interceptors without sending it
    pub fn prepare(&self, request: RequestBuilder) -> Result<Request, ClientError> {
        let built = request.build().map_err(ClientError::RequestConstruction);
        interceptor::apply(&self.interceptors, built)
    }

    /// Intercept and dispatch a request, returning the raw response
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = self.prepare(request)?;
        Ok(self.client.execute(request).await?)
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Execute a request whose response body is ignored (e.g. 204 No Content)
    pub async fn execute_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = self.send(request).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// GET a path and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.request(Method::GET, path)).await
    }

    /// POST a JSON body to a path and decode the JSON response
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    /// PUT a JSON body to a path and decode the JSON response
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    /// PATCH a path with a JSON body and decode the JSON response
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(self.request(Method::PATCH, path).json(body)).await
    }

    /// DELETE a path, ignoring the response body
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.execute_empty(self.request(Method::DELETE, path)).await
    }
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    ClientError::from_status(status, message)
}

/// Join a request path onto a base URL
///
/// Absolute URLs (`scheme://...` or `//...`) are returned untouched. Otherwise
/// the base's trailing slashes and the path's leading slashes collapse into a
/// single `/`. An empty path yields the base URL. Unlike browser HTTP clients,
/// which strip at most one trailing `//` from the base, every trailing slash is
/// trimmed here.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn is_absolute_url(path: &str) -> bool {
    if path.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = path.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    provider: Option<Arc<dyn TokenProvider>>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl ApiClientBuilder {
    /// Use a full configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the base URL, keeping the rest of the configuration
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.get_or_insert_with(ClientConfig::default).base_url = url.into();
        self
    }

    /// Set where the bearer token comes from
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Read the bearer token from a store under the configured token key
    ///
    /// Uses the key of the configuration set so far, so call after [`Self::config`].
    pub fn token_store(self, store: Arc<dyn KeyValueStore>) -> Self {
        let key = self
            .config
            .as_ref()
            .map_or(ACCESS_TOKEN, |c| c.token_key.as_str())
            .to_string();
        self.token_provider(StoredToken::new(store, key))
    }

    /// Register an extra interceptor; runs after bearer auth, in registration order
    pub fn interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let mut client_builder = ClientBuilder::new().user_agent(config.user_agent.clone());

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(secs) = config.timeout_secs {
            client_builder = client_builder.timeout(Duration::from_secs(secs));
        }

        let client = client_builder.build()?;

        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(|| None::<String>) as Arc<dyn TokenProvider>);

        let mut interceptors: Vec<Arc<dyn RequestInterceptor>> =
            Vec::with_capacity(self.interceptors.len() + 1);
        interceptors.push(Arc::new(BearerAuth::new(provider)));
        interceptors.extend(self.interceptors);

        tracing::debug!(base_url = %config.base_url, "Built chat API client");

        Ok(ApiClient {
            client,
            config: Arc::new(config),
            interceptors: interceptors.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(
            resolve_url("http://127.0.0.1:8001/chat/", "messages"),
            "http://127.0.0.1:8001/chat/messages"
        );
        assert_eq!(
            resolve_url("http://127.0.0.1:8001/chat", "/messages"),
            "http://127.0.0.1:8001/chat/messages"
        );
        assert_eq!(
            resolve_url("http://127.0.0.1:8001/chat//", "/conversations/3/messages/"),
            "http://127.0.0.1:8001/chat/conversations/3/messages/"
        );
    }

    #[test]
    fn test_resolve_absolute_and_empty_paths() {
        assert_eq!(
            resolve_url("http://127.0.0.1:8001/chat/", "https://other.host/x"),
            "https://other.host/x"
        );
        assert_eq!(
            resolve_url("http://127.0.0.1:8001/chat/", ""),
            "http://127.0.0.1:8001/chat/"
        );
        assert!(is_absolute_url("//cdn.example.com/a.png"));
        assert!(!is_absolute_url("messages?next=http://x"));
        assert!(!is_absolute_url("1ab://x"));
    }

    #[test]
    fn test_builder_rejects_relative_base_url() {
        let result = ApiClient::builder().base_url("/chat/").build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_default_build_uses_default_base_url() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
