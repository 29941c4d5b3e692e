//! Defines the endpoint for changing the family-wide target balance.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, AccountName, get_all_accounts, set_target_balance},
    history::record_target_change,
};

/// The marker prefixed to the audit reason of every family-wide target change,
/// distinguishing it from single-account changes in the history.
const GLOBAL_UPDATE_MARKER: &str = "[Global Update]";

/// The state needed to update the family target.
#[derive(Debug, Clone)]
pub struct FamilyTargetState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FamilyTargetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a family-wide target change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTargetForm {
    /// The new combined target for both accounts.
    pub new_total: f64,
    /// Why the target is changing. Must be non-empty.
    pub reason: String,
}

/// A route handler for changing the combined family target.
///
/// Responds with both accounts after the change.
pub async fn update_family_target_endpoint(
    State(state): State<FamilyTargetState>,
    Json(form): Json<FamilyTargetForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match update_family_target(&form, &connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Split a combined family target into Mummy's and Vaibhav's portions.
///
/// Mummy holds two thirds, rounded to the nearest whole amount; Vaibhav holds
/// the remainder. Deriving the second portion by subtraction means the two
/// always sum to exactly `new_total`, no matter how the rounding falls.
pub fn split_family_target(new_total: f64) -> (f64, f64) {
    let mummy_portion = (new_total * 2.0 / 3.0).round();
    (mummy_portion, new_total - mummy_portion)
}

/// Change both accounts' targets to their share of `new_total`, recording one
/// audit entry per account.
///
/// The 2:1 split is fixed family policy and is not configurable per call.
/// Both audit appends and both target updates happen inside one SQLite
/// transaction.
pub fn update_family_target(
    form: &FamilyTargetForm,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    if form.reason.trim().is_empty() {
        return Err(Error::EmptyReason);
    }

    let (mummy_portion, vaibhav_portion) = split_family_target(form.new_total);
    let reason = format!("{GLOBAL_UPDATE_MARKER} {}", form.reason);
    let now = OffsetDateTime::now_utc();

    let sql_transaction = connection.unchecked_transaction()?;
    let mut updated = Vec::new();

    for account in get_all_accounts(&sql_transaction)? {
        let portion = match account.name {
            AccountName::Mummy => mummy_portion,
            AccountName::Vaibhav => vaibhav_portion,
        };

        record_target_change(&account, portion, &reason, now, &sql_transaction)?;
        updated.push(set_target_balance(account.id, portion, now, &sql_transaction)?);
    }

    sql_transaction.commit()?;

    Ok(updated)
}
