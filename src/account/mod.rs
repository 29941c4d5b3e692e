mod accounts_endpoint;
mod adjust_endpoint;
mod core;
mod family_target_endpoint;
mod target_endpoint;

pub use accounts_endpoint::{get_account_endpoint, get_accounts_endpoint};
pub use adjust_endpoint::{AdjustBalanceForm, adjust_actual_balance, adjust_balance_endpoint};
pub use core::{
    Account, AccountName, MEMBERS, create_account_table, get_account, get_all_accounts,
    map_row_to_account, seed_accounts, set_actual_balance, set_target_balance,
};
pub use family_target_endpoint::{
    FamilyTargetForm, split_family_target, update_family_target, update_family_target_endpoint,
};
pub use target_endpoint::{TargetForm, update_target_balance, update_target_endpoint};
