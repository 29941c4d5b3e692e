//! Database initialisation for the application's domain models.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    account::{create_account_table, seed_accounts},
    history::{create_adjustment_history_table, create_target_history_table},
    transaction::create_transaction_table,
};

/// Create the application's tables and seed the two family accounts.
///
/// Everything runs inside one exclusive SQLite transaction, so a partially
/// initialised database cannot be observed.
///
/// # Errors
/// Returns an error if any of the tables cannot be created or the accounts
/// cannot be seeded.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_target_history_table(&transaction)?;
    create_adjustment_history_table(&transaction)?;
    seed_accounts(&transaction)?;

    transaction.commit()?;

    Ok(())
}
