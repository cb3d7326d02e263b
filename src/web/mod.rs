//! HTTP tool surface (Axum) over the mailbox and the meeting log.

pub mod api;
pub mod router;
pub mod server;

pub use router::{create_app_router, AppState};
pub use server::run_server;
