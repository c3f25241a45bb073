//! Defines the account store trait.

use crate::{
    Error,
    account::Account,
    database_id::{AccountId, ProjectId},
};

/// Handles the creation and retrieval of accounts.
pub trait AccountStore {
    /// Store a new account.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEntry] if the name is already used in the project.
    fn create(&self, account: Account) -> Result<Account, Error>;

    /// Retrieve the account with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::AccountNotFound] if there is no such account.
    fn get_by_id(&self, id: AccountId) -> Result<Account, Error>;

    /// Retrieve every account of a project, sorted by name.
    fn get_by_project_id(&self, project_id: ProjectId) -> Result<Vec<Account>, Error>;

    /// Whether the name `name` is already used in a project.
    fn exists_by_name(&self, project_id: ProjectId, name: &str) -> Result<bool, Error>;
}
