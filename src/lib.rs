//! PDF Compress Server Library
//!
//! An HTTP front-end for Ghostscript: a single PDF comes in over multipart,
//! is rewritten with a size-reducing preset, and streams back out. Nothing is
//! kept after the request ends.
//!
//! # Modules
//!
//! - `storage`: upload directory and request-scoped temp file cleanup
//! - `compressor`: Ghostscript subprocess invocation
//! - `upload`: multipart validation and streaming to disk
//! - `pipeline`: normalize, invoke, verify, deliver, cleanup
//! - `routes`: HTTP handlers

pub mod compressor;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config().server.static_dir);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::compress::router(
            state.config().storage.max_upload_bytes,
        ))
        .fallback_service(static_files)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
