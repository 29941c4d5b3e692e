//! Defines the core data models and database queries for the family accounts.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::AccountId};

/// The two family members whose accounts the fund tracks.
///
/// The fund has exactly one account per member. Operations look accounts up by
/// their database ID; the name is carried on ledger and audit records as a
/// display attribute, and decides each member's share of the family target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountName {
    /// The primary account, holding two thirds of the family target.
    Mummy,
    /// The secondary account, holding the remaining third.
    Vaibhav,
}

/// Both members, in the order their accounts are seeded.
pub const MEMBERS: [AccountName; 2] = [AccountName::Mummy, AccountName::Vaibhav];

impl AccountName {
    /// The name as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mummy => "Mummy",
            Self::Vaibhav => "Vaibhav",
        }
    }

    /// Parse a stored account name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Mummy" => Some(Self::Mummy),
            "Vaibhav" => Some(Self::Vaibhav),
            _ => None,
        }
    }

    /// The target and actual balance this member's account starts with, and
    /// returns to on a full reset.
    pub fn baseline_balance(self) -> f64 {
        match self {
            Self::Mummy => 200_000.0,
            Self::Vaibhav => 100_000.0,
        }
    }
}

/// A family member's account: the balance they are mandated to hold and the
/// balance actually in their bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The member the account belongs to.
    pub name: AccountName,
    /// The balance the member is mandated to hold.
    pub target_balance: f64,
    /// The balance currently in the member's bank account.
    pub actual_balance: f64,
    /// When the account was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            target_balance REAL NOT NULL,
            actual_balance REAL NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Insert the two family accounts at their baseline balances.
///
/// Accounts that already exist are left untouched, so calling this on every
/// start up is safe.
pub fn seed_accounts(connection: &Connection) -> Result<(), rusqlite::Error> {
    for member in MEMBERS {
        connection.execute(
            "INSERT OR IGNORE INTO account (name, target_balance, actual_balance, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                member.as_str(),
                member.baseline_balance(),
                member.baseline_balance(),
                OffsetDateTime::now_utc(),
            ],
        )?;
    }

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = AccountName::parse(&raw_name).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown account name {raw_name:?}").into(),
        )
    })?;
    let target_balance = row.get(2)?;
    let actual_balance = row.get(3)?;
    let updated_at = row.get(4)?;

    Ok(Account {
        id,
        name,
        target_balance,
        actual_balance,
        updated_at,
    })
}

/// Get the account with `id`.
///
/// # Errors
/// Returns [Error::AccountNotFound] if `id` does not refer to an account, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, name, target_balance, actual_balance, updated_at
             FROM account WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound(id),
            error => error.into(),
        })
}

/// Get both family accounts, in seeding order.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, name, target_balance, actual_balance, updated_at
             FROM account ORDER BY id ASC",
        )?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::SqlError))
        .collect()
}

/// Set the target balance of the account with `id` and return the updated row.
pub fn set_target_balance(
    id: AccountId,
    new_target: f64,
    updated_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "UPDATE account SET target_balance = ?1, updated_at = ?2 WHERE id = ?3
             RETURNING id, name, target_balance, actual_balance, updated_at",
        )?
        .query_row(params![new_target, updated_at, id], map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound(id),
            error => error.into(),
        })
}

/// Set the actual balance of the account with `id` and return the updated row.
pub fn set_actual_balance(
    id: AccountId,
    new_actual: f64,
    updated_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "UPDATE account SET actual_balance = ?1, updated_at = ?2 WHERE id = ?3
             RETURNING id, name, target_balance, actual_balance, updated_at",
        )?
        .query_row(params![new_actual, updated_at, id], map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound(id),
            error => error.into(),
        })
}


#[cfg(test)]
mod seed_tests {
    use rusqlite::Connection;

    use super::{AccountName, create_account_table, get_all_accounts, seed_accounts};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_account_table(&conn).unwrap();
        conn
    }

    #[test]
    fn creates_both_accounts_at_baseline() {
        let conn = get_test_connection();

        seed_accounts(&conn).unwrap();

        let accounts = get_all_accounts(&conn).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, AccountName::Mummy);
        assert_eq!(accounts[0].target_balance, 200_000.0);
        assert_eq!(accounts[0].actual_balance, 200_000.0);
        assert_eq!(accounts[1].name, AccountName::Vaibhav);
        assert_eq!(accounts[1].target_balance, 100_000.0);
        assert_eq!(accounts[1].actual_balance, 100_000.0);
    }

    #[test]
    fn seeding_twice_does_not_duplicate_accounts() {
        let conn = get_test_connection();

        seed_accounts(&conn).unwrap();
        seed_accounts(&conn).unwrap();

        let accounts = get_all_accounts(&conn).unwrap();
        assert_eq!(accounts.len(), 2);
    }
}

#[cfg(test)]
mod query_tests {
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::Error;

    use super::{
        create_account_table, get_account, seed_accounts, set_actual_balance, set_target_balance,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_account_table(&conn).unwrap();
        seed_accounts(&conn).unwrap();
        conn
    }

    #[test]
    fn get_account_returns_not_found_for_unknown_id() {
        let conn = get_test_connection();

        let result = get_account(1337, &conn);

        assert_eq!(result, Err(Error::AccountNotFound(1337)));
    }

    #[test]
    fn set_target_balance_updates_only_the_target() {
        let conn = get_test_connection();
        let before = get_account(1, &conn).unwrap();

        let updated =
            set_target_balance(1, 250_000.0, OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(updated.target_balance, 250_000.0);
        assert_eq!(updated.actual_balance, before.actual_balance);
    }

    #[test]
    fn set_actual_balance_updates_only_the_actual() {
        let conn = get_test_connection();
        let before = get_account(2, &conn).unwrap();

        let updated =
            set_actual_balance(2, 90_000.0, OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(updated.actual_balance, 90_000.0);
        assert_eq!(updated.target_balance, before.target_balance);
    }

    #[test]
    fn set_target_balance_fails_for_unknown_id() {
        let conn = get_test_connection();

        let result = set_target_balance(42, 1.0, OffsetDateTime::now_utc(), &conn);

        assert_eq!(result, Err(Error::AccountNotFound(42)));
    }
}
