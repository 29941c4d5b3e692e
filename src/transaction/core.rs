//! Defines the core data models and database queries for the ledger.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{Account, AccountName},
    database_id::{AccountId, TransactionId},
};

/// The kind of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money spent from the account.
    Spend,
    /// Money paid into the account.
    Deposit,
    /// A reimbursement from Papa for earlier spending.
    ///
    /// Top-ups increase the actual balance like a deposit, but also count
    /// against the account's unreimbursed-spending shortfall.
    PapaTopup,
}

impl TransactionKind {
    /// The kind as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spend => "SPEND",
            Self::Deposit => "DEPOSIT",
            Self::PapaTopup => "PAPA_TOPUP",
        }
    }

    /// Parse a stored transaction kind.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "SPEND" => Some(Self::Spend),
            "DEPOSIT" => Some(Self::Deposit),
            "PAPA_TOPUP" => Some(Self::PapaTopup),
            _ => None,
        }
    }

    /// The signed change that applying a transaction of this kind with
    /// `amount` makes to the account's actual balance.
    pub fn applied_delta(self, amount: f64) -> f64 {
        match self {
            Self::Spend => -amount,
            Self::Deposit | Self::PapaTopup => amount,
        }
    }

    /// The signed change that exactly undoes [TransactionKind::applied_delta].
    ///
    /// Deleting a ledger record applies this to the owning account, whatever
    /// its current balance is.
    pub fn reversal_delta(self, amount: f64) -> f64 {
        -self.applied_delta(amount)
    }
}

/// A single entry in the append-only ledger.
///
/// Ledger records are never edited. The only way to undo one is to delete it,
/// which applies the exact inverse of its original balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the account the transaction belongs to.
    pub account_id: AccountId,
    /// The member the account belongs to, denormalized for display.
    pub account_name: AccountName,
    /// The kind of transaction.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The amount of money moved. Always positive; the kind decides the sign
    /// of the balance change.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            account_name TEXT NOT NULL,
            type TEXT NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let account_id = row.get(1)?;

    let raw_name: String = row.get(2)?;
    let account_name = AccountName::parse(&raw_name).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown account name {raw_name:?}").into(),
        )
    })?;

    let raw_kind: String = row.get(3)?;
    let kind = TransactionKind::parse(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown transaction type {raw_kind:?}").into(),
        )
    })?;

    let amount = row.get(4)?;
    let description = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Transaction {
        id,
        account_id,
        account_name,
        kind,
        amount,
        description,
        created_at,
    })
}

/// Append a record to the ledger and return the stored row.
pub fn insert_transaction(
    account: &Account,
    kind: TransactionKind,
    amount: f64,
    description: &str,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (account_id, account_name, type, amount, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, account_id, account_name, type, amount, description, created_at",
        )?
        .query_row(
            params![
                account.id,
                account.name.as_str(),
                kind.as_str(),
                amount,
                description,
                created_at,
            ],
            map_row_to_transaction,
        )
        .map_err(|error| error.into())
}

/// Get the ledger record with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a transaction, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, account_id, account_name, type, amount, description, created_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_row_to_transaction)
        .map_err(|error| error.into())
}

/// Get ledger records, newest first, optionally restricted to one account.
///
/// The ledger is append-only, so descending IDs give reverse-chronological
/// order without comparing the stored timestamp strings.
pub fn get_transactions(
    account_id: Option<AccountId>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut query_string =
        "SELECT id, account_id, account_name, type, amount, description, created_at
         FROM \"transaction\""
            .to_string();

    if account_id.is_some() {
        query_string.push_str(" WHERE account_id = :account_id");
    }

    query_string.push_str(" ORDER BY id DESC");

    let mut statement = connection.prepare(&query_string)?;

    let rows = match account_id {
        Some(account_id) => {
            statement.query_map(&[(":account_id", &account_id)], map_row_to_transaction)?
        }
        None => statement.query_map([], map_row_to_transaction)?,
    };

    rows.map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use crate::account::create_account_table;

    use super::create_transaction_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
        create_account_table(&connection).unwrap();

        assert_eq!(Ok(()), create_transaction_table(&connection));
    }
}

#[cfg(test)]
mod delta_tests {
    use super::TransactionKind;

    #[test]
    fn spend_reduces_the_balance() {
        assert_eq!(TransactionKind::Spend.applied_delta(4000.0), -4000.0);
    }

    #[test]
    fn deposits_and_topups_increase_the_balance() {
        assert_eq!(TransactionKind::Deposit.applied_delta(4000.0), 4000.0);
        assert_eq!(TransactionKind::PapaTopup.applied_delta(4000.0), 4000.0);
    }

    #[test]
    fn reversal_is_the_exact_inverse_for_every_kind() {
        for kind in [
            TransactionKind::Spend,
            TransactionKind::Deposit,
            TransactionKind::PapaTopup,
        ] {
            let amount = 123.45;
            assert_eq!(
                kind.applied_delta(amount) + kind.reversal_delta(amount),
                0.0,
                "applying then reversing a {kind:?} must cancel out exactly"
            );
        }
    }
}

#[cfg(test)]
mod query_tests {
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        Error,
        account::{create_account_table, get_account, seed_accounts},
    };

    use super::{
        TransactionKind, create_transaction_table, get_transaction, get_transactions,
        insert_transaction,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_account_table(&conn).unwrap();
        create_transaction_table(&conn).unwrap();
        seed_accounts(&conn).unwrap();
        conn
    }

    #[test]
    fn inserted_transaction_round_trips() {
        let conn = get_test_connection();
        let account = get_account(1, &conn).unwrap();

        let inserted = insert_transaction(
            &account,
            TransactionKind::Spend,
            4000.0,
            "groceries",
            OffsetDateTime::now_utc(),
            &conn,
        )
        .unwrap();

        let selected = get_transaction(inserted.id, &conn).unwrap();
        assert_eq!(inserted, selected);
        assert_eq!(selected.account_id, account.id);
        assert_eq!(selected.account_name, account.name);
    }

    #[test]
    fn get_transaction_fails_for_unknown_id() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(99, &conn), Err(Error::NotFound));
    }

    #[test]
    fn transactions_are_listed_newest_first() {
        let conn = get_test_connection();
        let account = get_account(1, &conn).unwrap();
        let now = OffsetDateTime::now_utc();

        let first =
            insert_transaction(&account, TransactionKind::Spend, 1.0, "first", now, &conn).unwrap();
        let second =
            insert_transaction(&account, TransactionKind::Deposit, 2.0, "second", now, &conn)
                .unwrap();

        let transactions = get_transactions(None, &conn).unwrap();

        assert_eq!(transactions, vec![second, first]);
    }

    #[test]
    fn listing_can_be_restricted_to_one_account() {
        let conn = get_test_connection();
        let mummy = get_account(1, &conn).unwrap();
        let vaibhav = get_account(2, &conn).unwrap();
        let now = OffsetDateTime::now_utc();

        let hers =
            insert_transaction(&mummy, TransactionKind::Spend, 1.0, "hers", now, &conn).unwrap();
        insert_transaction(&vaibhav, TransactionKind::Spend, 2.0, "his", now, &conn).unwrap();

        let transactions = get_transactions(Some(mummy.id), &conn).unwrap();

        assert_eq!(transactions, vec![hers]);
    }
}
