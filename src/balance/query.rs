//! Balance summaries computed from the stored transactions.

use time::OffsetDateTime;

use crate::{
    Error,
    balance::{ProjectBalanceSummary, aggregate},
    database_id::{AccountId, ProjectId},
    stores::{AccountStore, ProjectStore, TransactionStore},
    transaction::{DateWindow, Transaction, TransactionQuery},
};

/// Selects the accounts and the period to summarise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceQuery {
    /// The project to summarise.
    pub project_id: ProjectId,
    /// Summarise only this account, which must belong to the project.
    pub account_id: Option<AccountId>,
    /// Only count transactions dated in this year.
    ///
    /// Defaults to the current year when only `month` is set.
    pub year: Option<i32>,
    /// Only count transactions dated in this month, zero meaning the whole year.
    pub month: Option<u8>,
}

impl BalanceQuery {
    /// A query for every account in a project over all time.
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            account_id: None,
            year: None,
            month: None,
        }
    }

    /// The date window to count transactions in, `None` for all time.
    ///
    /// # Errors
    ///
    /// Returns an error from [DateWindow::for_period] for an invalid month or year.
    pub fn window(&self, now: OffsetDateTime) -> Result<Option<DateWindow>, Error> {
        match (self.year, self.month) {
            (None, None) => Ok(None),
            (year, month) => {
                DateWindow::for_period(year.unwrap_or_else(|| now.year()), month).map(Some)
            }
        }
    }
}

/// Summarise the balances of a project, or of one of its accounts.
///
/// # Errors
///
/// Returns:
/// - [Error::ProjectNotFound] or [Error::AccountNotFound] for a missing project or account,
/// - [Error::AccountNotInProject] if the account belongs to another project,
/// - [Error::InvalidMonth] or [Error::InvalidYear] for a bad period,
/// - any error from the stores.
pub fn get_project_balance(
    query: &BalanceQuery,
    projects: &impl ProjectStore,
    accounts: &impl AccountStore,
    transactions: &impl TransactionStore,
) -> Result<ProjectBalanceSummary, Error> {
    let project = projects.get_by_id(query.project_id)?;
    let window = query.window(OffsetDateTime::now_utc())?;

    let (accounts, transaction_query) = match query.account_id {
        Some(account_id) => {
            let account = accounts.get_by_id(account_id)?;
            if account.project_id != project.id {
                return Err(Error::AccountNotInProject);
            }

            (vec![account], TransactionQuery::for_account(account_id))
        }
        None => (
            accounts.get_by_project_id(project.id)?,
            TransactionQuery::for_project(project.id),
        ),
    };

    let transaction_query = match window {
        Some(window) => transaction_query.with_window(window),
        None => transaction_query,
    };

    let transactions = transactions.get_transactions_with_filters(&transaction_query)?;

    Ok(aggregate(project.id, &accounts, &transactions))
}

/// Summarise the balances of every account in a project over transactions
/// that have already been fetched.
///
/// # Errors
///
/// Returns any error from the account store.
pub fn get_project_balances_from_transactions(
    project_id: ProjectId,
    transactions: &[Transaction],
    accounts: &impl AccountStore,
) -> Result<ProjectBalanceSummary, Error> {
    let accounts = accounts.get_by_project_id(project_id)?;

    Ok(aggregate(project_id, &accounts, transactions))
}
