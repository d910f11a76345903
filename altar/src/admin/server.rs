//! Admin HTTP server
//!
//! Serves the command endpoint and any extra handlers on the same router.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::{MethodRouter, any};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::messages::{AdminCommand, AdminRequest};

/// Path of the command endpoint
pub const ADMIN_PATH: &str = "/admin/command";

const NOT_POST_MESSAGE: &str = "request to admin commands did not use the POST method";

/// Called when the shutdown command arrives
pub type ShutdownHook = Arc<dyn Fn() + Send + Sync>;

/// Hook that exits the process immediately with status 0
pub fn exit_process() -> ShutdownHook {
    Arc::new(|| std::process::exit(0))
}

#[derive(Clone)]
pub struct AdminState {
    shutdown: ShutdownHook,
}

impl AdminState {
    pub fn new(shutdown: ShutdownHook) -> Self {
        Self { shutdown }
    }
}

/// Build the admin router
///
/// Extra handlers are mounted alongside the command endpoint. A handler that
/// would replace the command endpoint, whose path is not absolute, or whose
/// path uses `:param` or `*wildcard` segments, is skipped with a warning.
pub fn router(state: AdminState, handlers: HashMap<String, MethodRouter>) -> Router {
    debug!(handler_count = handlers.len(), "router: called");
    let mut router = Router::new().route(ADMIN_PATH, any(command_handler)).with_state(state);

    for (path, handler) in handlers {
        if path == ADMIN_PATH {
            warn!(%path, "Refusing to mount handler over the admin command endpoint");
            continue;
        }
        if !path.starts_with('/') {
            warn!(%path, "Refusing to mount handler on a relative path");
            continue;
        }
        if has_legacy_capture(&path) {
            warn!(%path, "Refusing to mount handler with a `:` or `*` path segment, use `{{param}}` instead");
            continue;
        }
        debug!(%path, "Mounting handler");
        router = router.route(&path, handler);
    }

    router.layer(TraceLayer::new_for_http())
}

/// axum rejects old-style `:param` and `*rest` captures by panicking
fn has_legacy_capture(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}

async fn command_handler(State(state): State<AdminState>, method: Method, body: Bytes) -> (StatusCode, String) {
    debug!(%method, body_len = body.len(), "command_handler: called");
    if method != Method::POST {
        warn!(%method, "Admin command request did not use POST");
        return (StatusCode::BAD_REQUEST, NOT_POST_MESSAGE.to_string());
    }

    let request: AdminRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let body = String::from_utf8_lossy(&body);
            error!(error = %e, %body, "Admin server failed to parse command request");
            return (
                StatusCode::BAD_REQUEST,
                format!("admin server did not recognise the command: '{body}'"),
            );
        }
    };

    match request.command {
        AdminCommand::Shutdown => {
            info!("Admin server received shutdown command, shutting down");
            (state.shutdown)();
            (StatusCode::OK, "shutting down".to_string())
        }
    }
}

/// Serve `router` on `listener` until ctrl-c
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read admin listener address")?;
    info!(%addr, "Admin server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Admin server failed")?;

    info!("Admin server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received ctrl-c, stopping"),
        Err(e) => {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
