//! Secret endpoint and server run loop.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use strongbox_tree::{Resolution, Resolved, SecretPath, SecretTree};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::StrongboxConfig;
use crate::error::ServerError;
use crate::middleware::{AccessGate, RequestTraceLayer, SecurityLayer, TokenAuthLayer};

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Shared server state.
///
/// The tree is loaded once and never mutated, so handlers read it without
/// locking.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tree: Arc<SecretTree>,
}

/// Creates the secrets router.
///
/// Every request passes the access gate before it reaches routing or
/// resolution.
pub fn router(tree: Arc<SecretTree>, gate: AccessGate) -> Router {
    let state = AppState { tree };

    Router::new()
        .route("/", get(get_root))
        .route("/{*path}", get(get_secret))
        .with_state(state)
        .layer(TokenAuthLayer::new(gate))
        .layer(SecurityLayer::new())
        .layer(RequestTraceLayer::new())
}

/// Run the server until `cancel` fires.
pub async fn run(
    config: StrongboxConfig,
    tree: SecretTree,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.server.bind_address)
        .await
        .map_err(ServerError::Io)?;

    if !tree.is_well_formed() {
        tracing::warn!("Secrets document contains values that are neither strings nor mappings");
    }

    tracing::info!(
        address = %config.server.bind_address,
        entries = tree.len(),
        "Strongbox listening"
    );

    let app = router(Arc::new(tree), AccessGate::from_config(&config.auth));
    serve(listener, app, cancel, config.server.shutdown_timeout).await?;

    tracing::info!("Strongbox shutdown complete");
    Ok(())
}

/// Serves `app` on `listener`, draining in-flight requests for at most
/// `shutdown_timeout` once `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
) -> Result<(), ServerError> {
    let shutdown = cancel.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await });
    let mut task = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut task => return join_result(result),
        () = cancel.cancelled() => {}
    }

    match tokio::time::timeout(shutdown_timeout, &mut task).await {
        Ok(result) => join_result(result),
        Err(_) => {
            tracing::warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out, dropping open connections"
            );
            task.abort();
            Ok(())
        }
    }
}

fn join_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    result
        .map_err(|e| ServerError::Internal(format!("server task failed: {e}")))?
        .map_err(ServerError::Io)
}

async fn get_root(State(state): State<AppState>) -> Result<Response, ServerError> {
    respond(&state.tree, &SecretPath::root())
}

/// A path that does not decode to UTF-8 cannot name a key, so it is
/// reported as missing.
async fn get_secret(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ServerError> {
    match path {
        Ok(Path(path)) => respond(&state.tree, &SecretPath::parse(&path)),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Undecodable secret path");
            Err(ServerError::SecretNotFound)
        }
    }
}

/// Maps a resolution to the wire response.
///
/// Scalars are sent as plain text and subtrees as JSON. The shape follows the
/// resolved value, never the request's `Accept` header. Unsupported values
/// inside a subtree are sent as their JSON equivalents.
fn respond(tree: &SecretTree, path: &SecretPath) -> Result<Response, ServerError> {
    match tree.resolve(path) {
        Resolution::Found(Resolved::Scalar(value)) => {
            tracing::debug!(path = %path, "Serving scalar secret");
            Ok(([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], value.to_owned()).into_response())
        }
        Resolution::Found(Resolved::Subtree(subtree)) => {
            let body = serde_json::to_vec(subtree).map_err(|e| {
                tracing::error!(path = %path, error = %e, "Subtree cannot be encoded as JSON");
                ServerError::MalformedTree
            })?;
            tracing::debug!(path = %path, entries = subtree.len(), "Serving secret subtree");
            Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
        }
        Resolution::NotFound => {
            tracing::debug!(path = %path, "Secret not found");
            Err(ServerError::SecretNotFound)
        }
        Resolution::Malformed { depth } => {
            tracing::error!(path = %path, depth, "Malformed secrets file");
            Err(ServerError::MalformedTree)
        }
    }
}
