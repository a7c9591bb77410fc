//! Request interceptors
//!
//! Every request built by [`ApiClient`](super::ApiClient) passes through the
//! registered interceptors in order before it is dispatched. Each interceptor
//! has two slots: `on_request` for a successfully built request and `on_error`
//! for a failure produced upstream (request construction or an earlier
//! interceptor).

use super::{ClientError, TokenProvider};
use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::sync::Arc;
use tracing::debug;

/// Hook run on every outgoing request
pub trait RequestInterceptor: Send + Sync {
    /// Transform a request before dispatch
    fn on_request(&self, request: Request) -> Result<Request, ClientError>;

    /// Handle an upstream failure. The default propagates it to the caller;
    /// returning `Ok` recovers with a replacement request.
    fn on_error(&self, error: ClientError) -> Result<Request, ClientError> {
        Err(error)
    }
}

/// Run a build outcome through the interceptor chain
pub(crate) fn apply(
    interceptors: &[Arc<dyn RequestInterceptor>],
    built: Result<Request, ClientError>,
) -> Result<Request, ClientError> {
    interceptors
        .iter()
        .fold(built, |outcome, interceptor| match outcome {
            Ok(request) => interceptor.on_request(request),
            Err(error) => interceptor.on_error(error),
        })
}

/// Sets `Authorization: Bearer <token>` whenever the provider has a token
pub struct BearerAuth {
    provider: Arc<dyn TokenProvider>,
}

impl BearerAuth {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, mut request: Request) -> Result<Request, ClientError> {
        let Some(token) = self.provider.access_token().filter(|t| !t.is_empty()) else {
            debug!(method = %request.method(), url = %request.url(), "No access token");
            return Ok(request);
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        debug!(method = %request.method(), url = %request.url(), "Attached bearer token");
        Ok(request)
    }
}
