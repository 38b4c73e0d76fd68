//! Shared-token access gate.

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, Response};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::task::{Context, Poll};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

use crate::config::AuthConfig;
use crate::error::ServerError;

/// Name of the query parameter carrying the token.
pub const TOKEN_PARAM: &str = "token";

/// Compares a presented token with the configured one in constant time.
#[must_use]
pub fn authorize(presented: &str, configured: &str) -> bool {
    presented.as_bytes().ct_eq(configured.as_bytes()).into()
}

/// Holds the configured token and checks presented credentials against it.
#[derive(Clone)]
pub struct AccessGate {
    token: Arc<SecretString>,
}

impl AccessGate {
    pub fn new(token: SecretString) -> Self {
        Self {
            token: Arc::new(token),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token.clone())
    }

    /// Returns true if `presented` matches the configured token exactly.
    ///
    /// A missing token never matches.
    #[must_use]
    pub fn check(&self, presented: Option<&str>) -> bool {
        presented.is_some_and(|token| authorize(token, self.token.expose_secret()))
    }

    /// Checks the credential carried by a request.
    #[must_use]
    pub fn check_request<B>(&self, req: &Request<B>) -> bool {
        self.check(presented_token(req).as_deref())
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}

/// Extracts the token from the `token` query parameter, falling back to an
/// `Authorization: Bearer` header.
fn presented_token<B>(req: &Request<B>) -> Option<String> {
    let from_query = req.uri().query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
    });

    from_query.or_else(|| {
        req.headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_owned)
    })
}

/// Tower layer that rejects requests without the configured token.
///
/// Runs before routing, so an unauthorised caller cannot tell an existing
/// path from a missing one.
#[derive(Clone, Debug)]
pub struct TokenAuthLayer {
    gate: AccessGate,
}

impl TokenAuthLayer {
    pub const fn new(gate: AccessGate) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for TokenAuthLayer {
    type Service = TokenAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenAuthService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// The service wrapper that performs the token check.
#[derive(Clone, Debug)]
pub struct TokenAuthService<S> {
    inner: S,
    gate: AccessGate,
}

impl<S, ReqBody> Service<Request<ReqBody>> for TokenAuthService<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if !self.gate.check_request(&req) {
            tracing::debug!(path = %req.uri().path(), "Rejected request with missing or invalid token");
            return Box::pin(async { Ok(ServerError::Unauthorized.into_response()) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}
