//! Defines the endpoint for deleting every ledger transaction in a date range.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    account::{Account, get_account, get_all_accounts, set_actual_balance},
    database_id::AccountId,
    transaction::get_transactions,
};

/// The state needed to bulk delete transactions.
#[derive(Debug, Clone)]
pub struct BulkDeleteState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BulkDeleteState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a bulk delete.
///
/// Both dates are inclusive: the range covers `start_date` from midnight
/// through the very end of `end_date` (UTC).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteForm {
    /// The first day of the range.
    pub start_date: Date,
    /// The last day of the range.
    pub end_date: Date,
}

/// The result of a bulk delete.
#[derive(Debug, PartialEq, Serialize)]
pub struct BulkDeleteReceipt {
    /// How many ledger records were removed.
    pub deleted: usize,
    /// Both accounts after the reversals.
    pub accounts: Vec<Account>,
}

/// A route handler for deleting every transaction within a date range.
pub async fn bulk_delete_transactions_endpoint(
    State(state): State<BulkDeleteState>,
    Json(form): Json<BulkDeleteForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match bulk_delete_transactions(&form, &connection) {
        Ok(receipt) => {
            tracing::info!(
                "Bulk deleted {} transactions between {} and {}",
                receipt.deleted,
                form.start_date,
                form.end_date
            );
            Json(receipt).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Remove every ledger record with a timestamp inside the inclusive range and
/// undo their combined balance effect.
///
/// Reversals are accumulated per account so each account's balance is written
/// once, and the whole operation runs inside one SQLite transaction. A range
/// containing no transactions leaves the fund untouched.
pub fn bulk_delete_transactions(
    form: &BulkDeleteForm,
    connection: &Connection,
) -> Result<BulkDeleteReceipt, Error> {
    let range_start = form.start_date.midnight().assume_utc();
    // Compare against the following midnight so the whole of the last day is
    // covered, down to the final nanosecond.
    let range_end = (form.end_date + Duration::days(1)).midnight().assume_utc();

    let sql_transaction = connection.unchecked_transaction()?;

    let in_range: Vec<_> = get_transactions(None, &sql_transaction)?
        .into_iter()
        .filter(|transaction| {
            transaction.created_at >= range_start && transaction.created_at < range_end
        })
        .collect();

    if in_range.is_empty() {
        return Ok(BulkDeleteReceipt {
            deleted: 0,
            accounts: get_all_accounts(&sql_transaction)?,
        });
    }

    let mut reversals: BTreeMap<AccountId, f64> = BTreeMap::new();
    for transaction in &in_range {
        *reversals.entry(transaction.account_id).or_insert(0.0) +=
            transaction.kind.reversal_delta(transaction.amount);
    }

    let now = OffsetDateTime::now_utc();
    for (&account_id, &reversal) in &reversals {
        let account = get_account(account_id, &sql_transaction)?;
        set_actual_balance(
            account_id,
            account.actual_balance + reversal,
            now,
            &sql_transaction,
        )?;
    }

    for transaction in &in_range {
        sql_transaction.execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", &transaction.id)],
        )?;
    }

    sql_transaction.commit()?;

    Ok(BulkDeleteReceipt {
        deleted: in_range.len(),
        accounts: get_all_accounts(connection)?,
    })
}
