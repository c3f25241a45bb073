//! Folding transactions into account balances and per-currency totals.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    account::Account,
    currency::Currency,
    database_id::{AccountId, ProjectId},
    transaction::Transaction,
};

/// The net balance of one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    /// The ID of the account.
    pub account_id: AccountId,
    /// The name of the account.
    pub name: String,
    /// The currency of the account.
    pub currency: Currency,
    /// Top-ups minus debits.
    pub balance: f64,
}

/// The sum of the balances of every account in one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTotal {
    /// The currency the accounts are recorded in.
    pub currency: Currency,
    /// The summed balance.
    pub balance: f64,
    /// Whether the balance is zero or more.
    pub is_positive: bool,
}

/// The balances of a project's accounts and their totals per currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectBalanceSummary {
    /// The project the accounts belong to.
    pub project_id: ProjectId,
    /// One entry per account, in the order the accounts were given.
    pub account_balances: Vec<AccountSummary>,
    /// One entry per currency with at least one account, in [Currency::all] order.
    pub currency_totals: Vec<CurrencyTotal>,
}

/// The net balance of `account_id` over `transactions`.
///
/// Transactions of other accounts are ignored. Returns zero when no
/// transaction belongs to the account.
pub fn compute_account_balance(account_id: AccountId, transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.account_id == account_id)
        .map(Transaction::signed_value)
        .sum()
}

/// Summarise the balances of `accounts` over `transactions`.
///
/// Every account appears in the summary, with a zero balance if it has no
/// transactions. Transactions of accounts not in `accounts` are ignored.
pub fn aggregate(
    project_id: ProjectId,
    accounts: &[Account],
    transactions: &[Transaction],
) -> ProjectBalanceSummary {
    let mut balances: HashMap<AccountId, f64> = HashMap::new();
    for transaction in transactions {
        *balances.entry(transaction.account_id).or_default() += transaction.signed_value();
    }

    let account_balances: Vec<AccountSummary> = accounts
        .iter()
        .map(|account| AccountSummary {
            account_id: account.id,
            name: account.name.clone(),
            currency: account.currency,
            balance: balances.get(&account.id).copied().unwrap_or_default(),
        })
        .collect();

    let currency_totals = Currency::all()
        .into_iter()
        .filter_map(|currency| {
            let mut in_currency = account_balances
                .iter()
                .filter(|summary| summary.currency == currency)
                .peekable();
            in_currency.peek()?;

            let balance: f64 = in_currency.map(|summary| summary.balance).sum();

            Some(CurrencyTotal {
                currency,
                balance,
                is_positive: balance >= 0.0,
            })
        })
        .collect();

    ProjectBalanceSummary {
        project_id,
        account_balances,
        currency_totals,
    }
}
