mod bulk_delete_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use bulk_delete_endpoint::{
    BulkDeleteForm, BulkDeleteReceipt, bulk_delete_transactions, bulk_delete_transactions_endpoint,
};
pub use core::{
    Transaction, TransactionKind, create_transaction_table, get_transaction, get_transactions,
    insert_transaction, map_row_to_transaction,
};
pub use create_endpoint::{
    TransactionForm, TransactionReceipt, apply_transaction, create_transaction_endpoint,
};
pub use delete_endpoint::{delete_transaction, delete_transaction_endpoint};
pub use list_endpoint::get_transactions_endpoint;
