//! Account balances and currency totals.

mod core;
mod query;

pub use core::{
    AccountSummary, CurrencyTotal, ProjectBalanceSummary, aggregate, compute_account_balance,
};
pub use query::{BalanceQuery, get_project_balance, get_project_balances_from_transactions};
