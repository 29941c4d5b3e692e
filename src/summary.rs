//! Derived fund metrics: per-account shortfalls and the family totals.
//!
//! Nothing here is stored. The shortfall is recomputed from the ledger on
//! every read, so deleting or bulk-deleting transactions automatically keeps
//! it consistent.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    account::{AccountName, get_all_accounts},
    database_id::AccountId,
};

/// One account's balances and its unreimbursed spending.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// The ID of the account.
    pub account_id: AccountId,
    /// The member the account belongs to.
    pub account_name: AccountName,
    /// The balance the member is mandated to hold.
    pub target_balance: f64,
    /// The balance currently in the member's bank account.
    pub actual_balance: f64,
    /// Spending not yet reimbursed by top-ups. Positive means the family owes
    /// the member money; zero or negative means they are fully covered.
    pub shortfall: f64,
}

/// The fund-wide rollup across both accounts.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySummary {
    /// The combined mandated target.
    pub total_target: f64,
    /// The combined actual bank balance.
    pub total_actual: f64,
    /// The total amount owed to members. Surpluses on one account never
    /// offset shortfalls on the other, so each account contributes at least
    /// zero.
    pub family_shortfall: f64,
    /// The per-account breakdown.
    pub accounts: Vec<AccountSummary>,
}

/// Unreimbursed spending for one account: the sum of its spends minus the sum
/// of its top-ups. Plain deposits do not count either way.
pub fn account_shortfall(account_id: AccountId, connection: &Connection) -> Result<f64, Error> {
    let mut statement = connection.prepare(
        "SELECT COALESCE(SUM(CASE type
                WHEN 'SPEND' THEN amount
                WHEN 'PAPA_TOPUP' THEN -amount
                ELSE 0 END), 0)
         FROM \"transaction\" WHERE account_id = :account_id",
    )?;

    let shortfall: f64 = statement.query_row(&[(":account_id", &account_id)], |row| row.get(0))?;

    Ok(shortfall)
}

/// Compute the rollup for both accounts.
pub fn family_summary(connection: &Connection) -> Result<FamilySummary, Error> {
    let mut summary = FamilySummary {
        total_target: 0.0,
        total_actual: 0.0,
        family_shortfall: 0.0,
        accounts: Vec::new(),
    };

    for account in get_all_accounts(connection)? {
        let shortfall = account_shortfall(account.id, connection)?;

        summary.total_target += account.target_balance;
        summary.total_actual += account.actual_balance;
        summary.family_shortfall += shortfall.max(0.0);
        summary.accounts.push(AccountSummary {
            account_id: account.id,
            account_name: account.name,
            target_balance: account.target_balance,
            actual_balance: account.actual_balance,
            shortfall,
        });
    }

    Ok(summary)
}

/// The state needed to compute the fund summary.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection holding the accounts and the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for the fund-wide summary.
pub async fn get_summary_endpoint(State(state): State<SummaryState>) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match family_summary(&connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_response(),
    }
}
