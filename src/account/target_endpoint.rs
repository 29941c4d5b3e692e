//! Defines the endpoint for changing one account's mandated target balance.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, get_account, set_target_balance},
    database_id::AccountId,
    history::record_target_change,
};

/// The state needed to update a target balance.
#[derive(Debug, Clone)]
pub struct UpdateTargetState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTargetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a target change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetForm {
    /// The new mandated target balance.
    pub new_target: f64,
    /// Why the target is changing. Must be non-empty.
    pub reason: String,
}

/// A route handler for changing an account's target balance.
///
/// Responds with the account after the change.
pub async fn update_target_endpoint(
    State(state): State<UpdateTargetState>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<TargetForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match update_target_balance(account_id, &form, &connection) {
        Ok(account) => Json(account).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Change the target balance of the account with `account_id`, recording the
/// old and new targets in the audit trail.
///
/// The audit append and the target update happen inside one SQLite
/// transaction.
///
/// # Errors
/// Returns [Error::EmptyReason] when no reason is given, or
/// [Error::AccountNotFound] when the account does not exist. Nothing is
/// persisted in either case.
pub fn update_target_balance(
    account_id: AccountId,
    form: &TargetForm,
    connection: &Connection,
) -> Result<Account, Error> {
    if form.reason.trim().is_empty() {
        return Err(Error::EmptyReason);
    }

    let sql_transaction = connection.unchecked_transaction()?;
    let account = get_account(account_id, &sql_transaction)?;
    let now = OffsetDateTime::now_utc();

    record_target_change(&account, form.new_target, &form.reason, now, &sql_transaction)?;
    let account = set_target_balance(account_id, form.new_target, now, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(account)
}
