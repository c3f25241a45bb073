//! Kasa is a small web app for keeping shared household accounts.
//!
//! Money is tracked per project. A project has accounts in one of a few
//! currencies, accounts have transactions, and transactions fold into
//! balances per account and totals per currency. People get into a project
//! with a numeric access: a 2-digit UID and an 8-digit PIN, either read-only
//! or with write access.
//!
//! This library provides the services behind the `kasa` CLI and a web server
//! that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

pub mod access;
pub mod account;
mod app_state;
mod auth;
pub mod balance;
pub mod config;
pub mod currency;
mod dashboard;
pub mod database_id;
pub mod datetime;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod logging;
mod not_found;
pub mod project;
mod routing;
pub mod slug;
pub mod stores;
mod timezone;
pub mod transaction;
mod unique;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use error::{Error, ErrorKind};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
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
