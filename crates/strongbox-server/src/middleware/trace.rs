//! Request tracing layer.

use http::{Request, Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Tower layer that opens a span per request.
///
/// Only the URL path is recorded. The query string carries the access token
/// and must never reach the logs.
#[derive(Clone, Debug, Default)]
pub struct RequestTraceLayer;

impl RequestTraceLayer {
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestTraceLayer {
    type Service = RequestTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTraceService { inner }
    }
}

/// The service wrapper that instruments each request.
#[derive(Clone, Debug)]
pub struct RequestTraceService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestTraceService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
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
        let span = tracing::info_span!(
            "http.server.request",
            http.request.method = %req.method(),
            url.path = %req.uri().path(),
            http.response.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
        );

        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                let response = inner.call(req).await;

                if let Ok(ref resp) = response {
                    let status = resp.status().as_u16();
                    let current = tracing::Span::current();
                    current.record("http.response.status_code", status);

                    if status >= 500 {
                        current.record("otel.status_code", "ERROR");
                        tracing::warn!(status, "Request failed");
                    } else {
                        tracing::debug!(status, "Request completed");
                    }
                }

                response
            }
            .instrument(span),
        )
    }
}
