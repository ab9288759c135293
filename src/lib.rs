//! Spendlog is a web app for tracking personal expenses: dated expenses in a
//! fixed category set, per-category monthly budgets, a dashboard with
//! aggregated summaries and charts, and CSV/PDF report downloads.
//!
//! This library serves HTML pages directly over a small set of routes; see
//! [build_router] for the surface and the `server` binary for wiring.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod budget;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod expense;
mod export;
mod flash;
mod html;
mod internal_server_error;
mod navigation;
mod not_found;
mod password;
mod profile;
mod routing;
mod timezone;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_username, update_password};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
