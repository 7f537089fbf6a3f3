//! # dca-config-api — Configuration Editor Backend
//!
//! JSON API over the YAML configuration document the daemon runs from.
//!
//! | Method | Path                     | Module                |
//! |--------|--------------------------|-----------------------|
//! | GET    | `/health/liveness`       | here                  |
//! | GET    | `/api/config`            | [`routes::config`]    |
//! | POST   | `/api/config/basic`      | [`routes::config`]    |
//! | POST   | `/api/config/staking`    | [`routes::config`]    |
//! | POST   | `/api/config/allocation` | [`routes::config`]    |
//! | GET    | `/api/validate`          | [`routes::validate`]  |
//!
//! A running daemon does not pick up edits; it reads the document once at
//! startup.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .merge(routes::config::router())
        .merge(routes::validate::router())
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        config = %state.file().path().display(),
        "configuration editor listening"
    );
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn liveness() -> &'static str {
    "ok"
}
