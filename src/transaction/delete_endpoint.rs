//! Defines the endpoint for deleting a ledger transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, get_account, set_actual_balance},
    database_id::TransactionId,
    transaction::get_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction.
///
/// Responds with the owning account after the reversal.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match delete_transaction(transaction_id, &connection) {
        Ok(account) => Json(account).into_response(),
        Err(error @ Error::SqlError(_)) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Remove the ledger record with `id` and undo its balance change.
///
/// The reversal is the exact inverse of the original application, whatever
/// the account's current balance is: deleting a spend adds the amount back,
/// deleting a deposit or top-up subtracts it, even below zero. Record removal
/// and balance update happen inside one SQLite transaction.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if `id` does not refer to a
/// ledger record, or [Error::AccountNotFound] if the owning account is gone.
/// Nothing is changed in either case.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<Account, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = get_transaction(id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingTransaction(id),
        error => error,
    })?;
    let account = get_account(transaction.account_id, &sql_transaction)?;

    let new_balance =
        account.actual_balance + transaction.kind.reversal_delta(transaction.amount);
    let account = set_actual_balance(
        account.id,
        new_balance,
        OffsetDateTime::now_utc(),
        &sql_transaction,
    )?;

    sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = :id", &[(":id", &id)])?;
    sql_transaction.commit()?;

    Ok(account)
}
