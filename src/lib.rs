//! Family Fund is a small REST service for tracking a household fund shared
//! between two family members.
//!
//! Each member has an account with a mandated target balance and an actual
//! bank balance. Spending, deposits and reimbursement top-ups are recorded in
//! an append-only ledger that keeps the actual balances up to date, while
//! administrative changes to targets and manual balance corrections are
//! captured in separate audit trails. The unreimbursed-spending shortfall for
//! each member is derived from the ledger on read.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod database_id;
mod db;
mod endpoints;
mod history;
mod logging;
mod reset;
mod routing;
mod summary;
mod transaction;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;

use crate::database_id::{AccountId, TransactionId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction or adjustment was given an amount of zero or less.
    ///
    /// Amounts are always positive; the transaction type decides the sign of
    /// the balance change.
    #[error("the amount must be greater than zero, got {0}")]
    NonPositiveAmount(f64),

    /// An empty string was used as a transaction description.
    #[error("a description is required")]
    EmptyDescription,

    /// An empty string was used as the reason for a target change or balance
    /// adjustment.
    #[error("a reason is required")]
    EmptyReason,

    /// A spend was larger than the account's actual bank balance.
    ///
    /// The request is rejected outright: the balance is not touched and no
    /// ledger record is created.
    #[error("spending {requested} would exceed the actual balance of {available}")]
    InsufficientBalance {
        /// The actual balance at the time of the request.
        available: f64,
        /// The amount the client tried to spend.
        requested: f64,
    },

    /// The account ID did not refer to an account in the database.
    #[error("no account with ID {0} exists in the database")]
    AccountNotFound(AccountId),

    /// Tried to delete a transaction that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction(TransactionId),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::NonPositiveAmount(_)
            | Error::EmptyDescription
            | Error::EmptyReason
            | Error::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
            Error::AccountNotFound(_) | Error::DeleteMissingTransaction(_) | Error::NotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DatabaseLock | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match status_code {
            // Internal details are only for the server logs.
            StatusCode::INTERNAL_SERVER_ERROR => json!({
                "error": "an unexpected error occurred, check the server logs for more details"
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status_code, Json(body)).into_response()
    }
}
