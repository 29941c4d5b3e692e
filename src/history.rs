//! The append-only audit trails for target changes and balance adjustments,
//! and the endpoints for reading them.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, AccountName},
    database_id::{AccountId, DatabaseId},
};

/// A record of one change to an account's mandated target balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBalanceHistory {
    /// The ID of the history record.
    pub id: DatabaseId,
    /// The ID of the account whose target changed.
    pub account_id: AccountId,
    /// The member the account belongs to, denormalized for display.
    pub account_name: AccountName,
    /// The target balance before the change.
    pub old_target_balance: f64,
    /// The target balance after the change.
    pub new_target_balance: f64,
    /// `new_target_balance - old_target_balance`.
    pub change_amount: f64,
    /// Why the target was changed.
    pub reason: String,
    /// When the target was changed.
    #[serde(with = "time::serde::rfc3339")]
    pub changed_at: OffsetDateTime,
}

/// A record of one manual correction to an account's actual balance.
///
/// Manual corrections bypass the ledger, so they are the only balance changes
/// that do not come with a transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualBalanceAdjustmentHistory {
    /// The ID of the history record.
    pub id: DatabaseId,
    /// The ID of the account whose balance was corrected.
    pub account_id: AccountId,
    /// The member the account belongs to, denormalized for display.
    pub account_name: AccountName,
    /// The actual balance before the correction.
    pub old_actual_balance: f64,
    /// The actual balance after the correction.
    pub new_actual_balance: f64,
    /// Why the balance was corrected.
    pub adjustment_reason: String,
    /// When the balance was corrected.
    #[serde(with = "time::serde::rfc3339")]
    pub adjusted_at: OffsetDateTime,
}

pub fn create_target_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS target_balance_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            account_name TEXT NOT NULL,
            old_target_balance REAL NOT NULL,
            new_target_balance REAL NOT NULL,
            change_amount REAL NOT NULL,
            reason TEXT NOT NULL,
            changed_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn create_adjustment_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS actual_balance_adjustment_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            account_name TEXT NOT NULL,
            old_actual_balance REAL NOT NULL,
            new_actual_balance REAL NOT NULL,
            adjustment_reason TEXT NOT NULL,
            adjusted_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id)
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_target_history(row: &Row) -> Result<TargetBalanceHistory, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let account_name = AccountName::parse(&raw_name).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown account name {raw_name:?}").into(),
        )
    })?;

    Ok(TargetBalanceHistory {
        id: row.get(0)?,
        account_id: row.get(1)?,
        account_name,
        old_target_balance: row.get(3)?,
        new_target_balance: row.get(4)?,
        change_amount: row.get(5)?,
        reason: row.get(6)?,
        changed_at: row.get(7)?,
    })
}

fn map_row_to_adjustment_history(
    row: &Row,
) -> Result<ActualBalanceAdjustmentHistory, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let account_name = AccountName::parse(&raw_name).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown account name {raw_name:?}").into(),
        )
    })?;

    Ok(ActualBalanceAdjustmentHistory {
        id: row.get(0)?,
        account_id: row.get(1)?,
        account_name,
        old_actual_balance: row.get(3)?,
        new_actual_balance: row.get(4)?,
        adjustment_reason: row.get(5)?,
        adjusted_at: row.get(6)?,
    })
}

/// Append a target-change record for `account` and return the stored row.
///
/// The change amount is derived from the account's current target, so the
/// record must be written before the target itself is updated.
pub fn record_target_change(
    account: &Account,
    new_target: f64,
    reason: &str,
    changed_at: OffsetDateTime,
    connection: &Connection,
) -> Result<TargetBalanceHistory, Error> {
    connection
        .prepare(
            "INSERT INTO target_balance_history
             (account_id, account_name, old_target_balance, new_target_balance, change_amount, reason, changed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, account_id, account_name, old_target_balance, new_target_balance, change_amount, reason, changed_at",
        )?
        .query_row(
            params![
                account.id,
                account.name.as_str(),
                account.target_balance,
                new_target,
                new_target - account.target_balance,
                reason,
                changed_at,
            ],
            map_row_to_target_history,
        )
        .map_err(|error| error.into())
}

/// Append a balance-correction record for `account` and return the stored row.
pub fn record_adjustment(
    account: &Account,
    new_actual: f64,
    reason: &str,
    adjusted_at: OffsetDateTime,
    connection: &Connection,
) -> Result<ActualBalanceAdjustmentHistory, Error> {
    connection
        .prepare(
            "INSERT INTO actual_balance_adjustment_history
             (account_id, account_name, old_actual_balance, new_actual_balance, adjustment_reason, adjusted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, account_id, account_name, old_actual_balance, new_actual_balance, adjustment_reason, adjusted_at",
        )?
        .query_row(
            params![
                account.id,
                account.name.as_str(),
                account.actual_balance,
                new_actual,
                reason,
                adjusted_at,
            ],
            map_row_to_adjustment_history,
        )
        .map_err(|error| error.into())
}

/// Get every target-change record, newest first.
pub fn get_target_history(connection: &Connection) -> Result<Vec<TargetBalanceHistory>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, account_name, old_target_balance, new_target_balance, change_amount, reason, changed_at
             FROM target_balance_history ORDER BY id DESC",
        )?
        .query_map([], map_row_to_target_history)?
        .map(|maybe_record| maybe_record.map_err(Error::SqlError))
        .collect()
}

/// Get every balance-correction record, newest first.
pub fn get_adjustment_history(
    connection: &Connection,
) -> Result<Vec<ActualBalanceAdjustmentHistory>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, account_name, old_actual_balance, new_actual_balance, adjustment_reason, adjusted_at
             FROM actual_balance_adjustment_history ORDER BY id DESC",
        )?
        .query_map([], map_row_to_adjustment_history)?
        .map(|maybe_record| maybe_record.map_err(Error::SqlError))
        .collect()
}

/// The state needed to read the audit trails.
#[derive(Debug, Clone)]
pub struct HistoryState {
    /// The database connection holding the audit trails.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing all target-change records, newest first.
pub async fn get_target_history_endpoint(State(state): State<HistoryState>) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match get_target_history(&connection) {
        Ok(records) => Json(records).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for listing all balance-correction records, newest first.
pub async fn get_adjustment_history_endpoint(
    State(state): State<HistoryState>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match get_adjustment_history(&connection) {
        Ok(records) => Json(records).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{account::get_account, db::initialize};

    use super::{
        get_adjustment_history, get_target_history, record_adjustment, record_target_change,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn target_change_records_old_new_and_delta() {
        let conn = get_test_connection();
        let account = get_account(1, &conn).unwrap();

        let record = record_target_change(
            &account,
            250_000.0,
            "annual review",
            OffsetDateTime::now_utc(),
            &conn,
        )
        .unwrap();

        assert_eq!(record.old_target_balance, 200_000.0);
        assert_eq!(record.new_target_balance, 250_000.0);
        assert_eq!(record.change_amount, 50_000.0);
        assert_eq!(record.reason, "annual review");
        assert_eq!(get_target_history(&conn).unwrap(), vec![record]);
    }

    #[test]
    fn adjustment_records_old_and_new_balances() {
        let conn = get_test_connection();
        let account = get_account(2, &conn).unwrap();

        let record = record_adjustment(
            &account,
            98_765.0,
            "bank statement correction",
            OffsetDateTime::now_utc(),
            &conn,
        )
        .unwrap();

        assert_eq!(record.old_actual_balance, 100_000.0);
        assert_eq!(record.new_actual_balance, 98_765.0);
        assert_eq!(record.adjustment_reason, "bank statement correction");
        assert_eq!(get_adjustment_history(&conn).unwrap(), vec![record]);
    }

    #[test]
    fn histories_are_listed_newest_first() {
        let conn = get_test_connection();
        let account = get_account(1, &conn).unwrap();
        let now = OffsetDateTime::now_utc();

        let first = record_target_change(&account, 210_000.0, "first", now, &conn).unwrap();
        let second = record_target_change(&account, 220_000.0, "second", now, &conn).unwrap();

        assert_eq!(get_target_history(&conn).unwrap(), vec![second, first]);
    }
}
