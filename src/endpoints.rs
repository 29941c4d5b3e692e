//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}',
//! use [format_endpoint].

/// The route for the liveness check.
pub const HEALTH: &str = "/api/health";
/// The route to list both family accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to access a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to change a single account's target balance.
pub const ACCOUNT_TARGET: &str = "/api/accounts/{account_id}/target";
/// The route to change the combined family target.
pub const FAMILY_TARGET: &str = "/api/accounts/family_target";
/// The route to manually correct an account's actual balance.
pub const ACCOUNT_BALANCE: &str = "/api/accounts/{account_id}/balance";
/// The route to list or record ledger transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single ledger transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete every transaction in a date range.
pub const BULK_DELETE_TRANSACTIONS: &str = "/api/transactions/bulk_delete";
/// The route to list the target-change audit trail.
pub const TARGET_HISTORY: &str = "/api/history/targets";
/// The route to list the balance-correction audit trail.
pub const ADJUSTMENT_HISTORY: &str = "/api/history/adjustments";
/// The route for the fund-wide summary.
pub const SUMMARY: &str = "/api/summary";
/// The route to reset the fund to its baseline state.
pub const RESET: &str = "/api/reset";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a brace-delimited name such as '{account_id}'. This
/// function assumes the path contains at most one parameter; paths without
/// one are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
