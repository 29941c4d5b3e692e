//! Defines the endpoint for recording a new ledger transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, get_account, set_actual_balance},
    database_id::AccountId,
    transaction::{Transaction, TransactionKind, insert_transaction},
};

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for recording a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// The kind of transaction.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The amount of money moved. Must be positive.
    pub amount: f64,
    /// What the transaction was for. Must be non-empty.
    pub description: String,
}

/// The stored ledger record together with the account it changed.
#[derive(Debug, PartialEq, Serialize)]
pub struct TransactionReceipt {
    /// The newly appended ledger record.
    pub transaction: Transaction,
    /// The account after the balance change.
    pub account: Account,
}

/// A route handler for recording a transaction.
///
/// Responds with the stored record and the updated account, or with the error
/// that prevented any state change.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(form): Json<TransactionForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match apply_transaction(&form, &connection) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error @ Error::SqlError(_)) => {
            tracing::error!("Could not record transaction for {form:?}: {error}");
            error.into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Apply `form` to its account and append the ledger record.
///
/// The balance update and the ledger append happen inside one SQLite
/// transaction: either both are persisted or neither is.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] or [Error::EmptyDescription] when the
/// form is invalid, [Error::AccountNotFound] when the account does not exist,
/// and [Error::InsufficientBalance] when a spend exceeds the actual balance.
/// Nothing is persisted in any of these cases.
pub fn apply_transaction(
    form: &TransactionForm,
    connection: &Connection,
) -> Result<TransactionReceipt, Error> {
    if form.amount <= 0.0 {
        return Err(Error::NonPositiveAmount(form.amount));
    }

    if form.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    let sql_transaction = connection.unchecked_transaction()?;
    let account = get_account(form.account_id, &sql_transaction)?;

    if form.kind == TransactionKind::Spend && form.amount > account.actual_balance {
        return Err(Error::InsufficientBalance {
            available: account.actual_balance,
            requested: form.amount,
        });
    }

    let now = OffsetDateTime::now_utc();
    let new_balance = account.actual_balance + form.kind.applied_delta(form.amount);

    let transaction = insert_transaction(
        &account,
        form.kind,
        form.amount,
        &form.description,
        now,
        &sql_transaction,
    )?;
    let account = set_actual_balance(account.id, new_balance, now, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(TransactionReceipt {
        transaction,
        account,
    })
}
