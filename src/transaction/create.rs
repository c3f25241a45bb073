//! Services for recording transactions, singly or as a group.

use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    config::ServiceConfig,
    database_id::{GroupId, ProjectId},
    stores::{AccountStore, TransactionStore},
    transaction::{Transaction, TransactionData},
};

/// How many years back a transaction may be dated.
pub const MAX_TRANSACTION_AGE_YEARS: i32 = 10;

/// Check the user supplied fields of a transaction.
///
/// The name must not be blank, the value must be a finite number greater
/// than zero, and the date, when given, must not be more than
/// [MAX_TRANSACTION_AGE_YEARS] years before `now`. Dates after `now` are
/// rejected only when [ServiceConfig::reject_future_transaction_dates] is set.
///
/// # Errors
///
/// Returns the first of [Error::EmptyName], [Error::NonPositiveValue],
/// [Error::DateTooFarInPast] or [Error::FutureDate] that applies.
pub fn validate_transaction_data(
    data: &TransactionData,
    now: OffsetDateTime,
    config: &ServiceConfig,
) -> Result<(), Error> {
    if data.name.trim().is_empty() {
        return Err(Error::EmptyName);
    }

    if !data.value.is_finite() || data.value <= 0.0 {
        return Err(Error::NonPositiveValue);
    }

    if let Some(transaction_date) = data.transaction_date {
        if transaction_date < years_before(now, MAX_TRANSACTION_AGE_YEARS) {
            return Err(Error::DateTooFarInPast);
        }

        if config.reject_future_transaction_dates && transaction_date > now {
            return Err(Error::FutureDate);
        }
    }

    Ok(())
}

/// The same instant `years` calendar years before `date_time`.
///
/// February 29th maps to March 1st when the target year is not a leap year.
fn years_before(date_time: OffsetDateTime, years: i32) -> OffsetDateTime {
    let year = date_time.year() - years;

    match date_time.replace_year(year) {
        Ok(shifted) => shifted,
        Err(_) => Date::from_calendar_date(year, Month::March, 1)
            .map(|date| date_time.replace_date(date))
            .unwrap_or(date_time),
    }
}

/// Record a single transaction that is not part of a group.
///
/// The account is checked before the transaction data.
///
/// # Errors
///
/// Returns [Error::AccountNotFound] if the account does not exist, a
/// validation error from [validate_transaction_data], or any error from the
/// stores.
pub fn create_single_transaction(
    data: TransactionData,
    accounts: &impl AccountStore,
    transactions: &impl TransactionStore,
    config: &ServiceConfig,
) -> Result<Transaction, Error> {
    accounts.get_by_id(data.account_id)?;

    let now = OffsetDateTime::now_utc();
    validate_transaction_data(&data, now, config)?;

    let transaction = transactions.create(Transaction::new(data, None, now))?;
    tracing::debug!("Created transaction {}", transaction.id);

    Ok(transaction)
}

/// Record a batch of transactions that share a new group ID.
///
/// Every account must exist, and must belong to `project_id` when one is
/// given. Every transaction must be valid before anything is stored. The batch is stored atomically and the
/// created transactions are returned in input order.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyTransactionGroup] if `batch` is empty,
/// - [Error::AccountNotFound] or [Error::AccountNotInProject] for a bad account,
/// - a validation error from [validate_transaction_data],
/// - any error from the stores, in which case nothing was stored.
pub fn create_grouped_transactions(
    project_id: Option<ProjectId>,
    batch: Vec<TransactionData>,
    accounts: &impl AccountStore,
    transactions: &impl TransactionStore,
    config: &ServiceConfig,
) -> Result<Vec<Transaction>, Error> {
    if batch.is_empty() {
        return Err(Error::EmptyTransactionGroup);
    }

    for data in &batch {
        let account = accounts.get_by_id(data.account_id)?;

        if project_id.is_some_and(|project_id| account.project_id != project_id) {
            return Err(Error::AccountNotInProject);
        }
    }

    let now = OffsetDateTime::now_utc();
    for data in &batch {
        validate_transaction_data(data, now, config)?;
    }

    let group_id = GroupId::new();
    let created = transactions.create_batch(
        batch
            .into_iter()
            .map(|data| Transaction::new(data, Some(group_id), now))
            .collect(),
    )?;
    tracing::debug!("Created {} transactions in group {group_id}", created.len());

    Ok(created)
}
