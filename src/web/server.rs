//! Web server using Axum.

use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ServerConfig, Settings};
use crate::error::{Error, Result};
use crate::mailbox::Mailbox;
use crate::store::LogStore;

use super::router::{create_app_router, AppState};

/// Largest accepted request body (tasks and artifacts are plain text).
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Run the tool server until the process is stopped.
pub async fn run_server(settings: &Settings, server: &ServerConfig) -> Result<()> {
    let state = Arc::new(AppState {
        mailbox: Mailbox::open(settings.root_dir())?,
        log: LogStore::new(settings.log_path()),
    });

    let app = create_app_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

    tracing::info!("Starting tool server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
