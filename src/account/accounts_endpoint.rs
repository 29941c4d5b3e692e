//! Defines the endpoints for reading the family accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{get_account, get_all_accounts},
    database_id::AccountId,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct AccountsState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing both family accounts.
pub async fn get_accounts_endpoint(State(state): State<AccountsState>) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match get_all_accounts(&connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for getting a single account by its ID.
pub async fn get_account_endpoint(
    State(state): State<AccountsState>,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match get_account(account_id, &connection) {
        Ok(account) => Json(account).into_response(),
        Err(error) => error.into_response(),
    }
}
