pub mod auth;
pub mod query;

use crate::error::SyncError;
use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::StatusCode,
    middleware,
    routing::get,
};
use connectors::extract::Extractor;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Body of the answer sent when a request outlives the handler timeout.
pub const HANDLER_TIMEOUT_TEXT: &str = "closed on timeout";

/// Shared, read-only state of the pull server.
#[derive(Clone)]
pub struct ServerState {
    pub extractor: Arc<Extractor>,
    /// base64 of `user:password`, as sent after `Basic `.
    pub credential_token: Arc<str>,
}

impl ServerState {
    pub fn new(extractor: Arc<Extractor>, credential_token: &str) -> Self {
        ServerState {
            extractor,
            credential_token: Arc::from(credential_token),
        }
    }
}

/// `GET /query` behind Basic auth. Auth is layered on the GET handler only,
/// so other methods get 405 before the credential is looked at. Requests
/// running past `handler_timeout` get 408.
pub fn router(state: ServerState, handler_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/query",
            get(query::handle_query).route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_basic,
            )),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(on_timeout))
                .layer(TimeoutLayer::new(handler_timeout)),
        )
        .with_state(state)
}

async fn on_timeout(_: BoxError) -> (StatusCode, &'static str) {
    (StatusCode::REQUEST_TIMEOUT, HANDLER_TIMEOUT_TEXT)
}

/// Serves `router` on `addr` until `cancel` fires. In-flight requests are
/// allowed to finish.
pub async fn serve(
    addr: &str,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), SyncError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Pull server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Pull server stopped");
    Ok(())
}
