//! Defines the account model and the service for creating accounts.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    currency::Currency,
    database_id::{AccountId, ProjectId},
    stores::AccountStore,
};

/// A named pot of money in a single currency, owned by a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The project that owns the account.
    pub project_id: ProjectId,
    /// The display name, unique within the project.
    pub name: String,
    /// The currency every transaction of the account is recorded in.
    pub currency: Currency,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the account was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Account {
    /// Create a new account with a fresh ID and timestamps.
    pub fn new(project_id: ProjectId, name: &str, currency: Currency) -> Self {
        let now = OffsetDateTime::now_utc();

        Self {
            id: AccountId::new(),
            project_id,
            name: name.to_owned(),
            currency,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create and store an account in a project.
///
/// # Errors
///
/// Returns [Error::EmptyAccountName] if `name` is blank,
/// [Error::DuplicateAccountName] if the project already has an account with
/// that name, or any error from the store.
pub fn create_account(
    project_id: ProjectId,
    name: &str,
    currency: Currency,
    accounts: &impl AccountStore,
) -> Result<Account, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    if accounts.exists_by_name(project_id, name)? {
        return Err(Error::DuplicateAccountName(name.to_owned()));
    }

    let account = accounts
        .create(Account::new(project_id, name, currency))
        .map_err(|error| match error {
            Error::DuplicateEntry => Error::DuplicateAccountName(name.to_owned()),
            error => error,
        })?;
    tracing::info!("Created account \"{}\" ({})", account.name, account.currency);

    Ok(account)
}
