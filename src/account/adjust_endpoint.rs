//! Defines the endpoint for manually correcting an account's actual balance.

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
    account::{Account, get_account, set_actual_balance},
    database_id::AccountId,
    history::record_adjustment,
};

/// The state needed to adjust an actual balance.
#[derive(Debug, Clone)]
pub struct AdjustBalanceState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdjustBalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a balance correction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustBalanceForm {
    /// The balance the account actually holds at the bank.
    pub new_actual: f64,
    /// Why the correction is needed. Must be non-empty.
    pub reason: String,
}

/// A route handler for correcting an account's actual balance.
///
/// Responds with the account after the correction.
pub async fn adjust_balance_endpoint(
    State(state): State<AdjustBalanceState>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<AdjustBalanceForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match adjust_actual_balance(account_id, &form, &connection) {
        Ok(account) => Json(account).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Overwrite the actual balance of the account with `account_id`, recording
/// the old and new balances in the audit trail.
///
/// Unlike a transaction, a correction bypasses the ledger entirely: the
/// balance is set to `new_actual` with no delta computation and no ledger
/// record. It exists to reconcile the fund against the real bank balance when
/// they have drifted apart. The audit append and the balance update happen
/// inside one SQLite transaction.
///
/// # Errors
/// Returns [Error::EmptyReason] when no reason is given, or
/// [Error::AccountNotFound] when the account does not exist. Nothing is
/// persisted in either case.
pub fn adjust_actual_balance(
    account_id: AccountId,
    form: &AdjustBalanceForm,
    connection: &Connection,
) -> Result<Account, Error> {
    if form.reason.trim().is_empty() {
        return Err(Error::EmptyReason);
    }

    let sql_transaction = connection.unchecked_transaction()?;
    let account = get_account(account_id, &sql_transaction)?;
    let now = OffsetDateTime::now_utc();

    record_adjustment(&account, form.new_actual, &form.reason, now, &sql_transaction)?;
    let account = set_actual_balance(account_id, form.new_actual, now, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(account)
}
