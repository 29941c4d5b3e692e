//! The endpoint for wiping the fund back to its baseline state.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::{Connection, params};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, MEMBERS, get_all_accounts},
};

/// The state needed to reset the fund.
#[derive(Debug, Clone)]
pub struct ResetState {
    /// The database connection holding the fund.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ResetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for resetting the whole fund.
///
/// Responds with both accounts at their baseline balances.
pub async fn reset_endpoint(State(state): State<ResetState>) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    match reset_fund(&connection) {
        Ok(accounts) => {
            tracing::info!("The fund was reset to its baseline state");
            Json(accounts).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Delete every ledger and audit record and restore both accounts to their
/// baseline balances.
///
/// This is destructive and irreversible: there is no soft delete and no
/// recovery path. Everything happens inside one SQLite transaction.
pub fn reset_fund(connection: &Connection) -> Result<Vec<Account>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    sql_transaction.execute("DELETE FROM \"transaction\"", ())?;
    sql_transaction.execute("DELETE FROM target_balance_history", ())?;
    sql_transaction.execute("DELETE FROM actual_balance_adjustment_history", ())?;

    let now = OffsetDateTime::now_utc();
    for member in MEMBERS {
        sql_transaction.execute(
            "UPDATE account SET target_balance = ?1, actual_balance = ?1, updated_at = ?2
             WHERE name = ?3",
            params![member.baseline_balance(), now, member.as_str()],
        )?;
    }

    sql_transaction.commit()?;

    get_all_accounts(connection)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        account::{AdjustBalanceForm, TargetForm, adjust_actual_balance, update_target_balance},
        db::initialize,
        history::{get_adjustment_history, get_target_history},
        transaction::{TransactionForm, TransactionKind, apply_transaction, get_transactions},
    };

    use super::reset_fund;

    fn get_messy_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        apply_transaction(
            &TransactionForm {
                account_id: 1,
                kind: TransactionKind::Spend,
                amount: 12_000.0,
                description: "school books".to_owned(),
            },
            &conn,
        )
        .unwrap();
        update_target_balance(
            2,
            &TargetForm {
                new_target: 120_000.0,
                reason: "growing up".to_owned(),
            },
            &conn,
        )
        .unwrap();
        adjust_actual_balance(
            2,
            &AdjustBalanceForm {
                new_actual: 99_999.0,
                reason: "bank mismatch".to_owned(),
            },
            &conn,
        )
        .unwrap();

        conn
    }

    #[test]
    fn wipes_the_ledger_and_both_audit_trails() {
        let conn = get_messy_connection();

        reset_fund(&conn).unwrap();

        assert_eq!(get_transactions(None, &conn).unwrap(), vec![]);
        assert_eq!(get_target_history(&conn).unwrap(), vec![]);
        assert_eq!(get_adjustment_history(&conn).unwrap(), vec![]);
    }

    #[test]
    fn restores_both_accounts_to_their_baselines() {
        let conn = get_messy_connection();

        let accounts = reset_fund(&conn).unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].target_balance, 200_000.0);
        assert_eq!(accounts[0].actual_balance, 200_000.0);
        assert_eq!(accounts[1].target_balance, 100_000.0);
        assert_eq!(accounts[1].actual_balance, 100_000.0);
    }
}
