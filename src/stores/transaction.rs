//! Defines the transaction store trait.

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{AccountId, GroupId, ProjectId, TransactionId},
    transaction::{Transaction, TransactionQuery},
};

/// Handles the creation, retrieval and deletion of transactions.
///
/// Every method returning many transactions orders them by transaction date,
/// most recent first, except [TransactionStore::get_by_group_id] which keeps
/// the order the group was created in.
pub trait TransactionStore {
    /// Store a new transaction.
    fn create(&self, transaction: Transaction) -> Result<Transaction, Error>;

    /// Store every transaction in `transactions`, or none of them if any fails.
    fn create_batch(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>, Error>;

    /// Retrieve the transaction with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::TransactionNotFound] if there is no such transaction.
    fn get_by_id(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Retrieve every transaction created in the group `group_id`, in creation order.
    fn get_by_group_id(&self, group_id: GroupId) -> Result<Vec<Transaction>, Error>;

    /// Retrieve the transactions matching `query`.
    ///
    /// The query is executed as given. Callers are expected to have checked it
    /// with [TransactionQuery::validate].
    fn get_transactions_with_filters(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error>;

    /// Delete the transaction with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::TransactionNotFound] if there is no such transaction.
    fn delete_by_id(&self, id: TransactionId) -> Result<(), Error>;

    /// Retrieve every transaction of an account.
    fn get_by_account_id(&self, account_id: AccountId) -> Result<Vec<Transaction>, Error> {
        self.get_transactions_with_filters(&TransactionQuery::for_account(account_id))
    }

    /// Retrieve the transactions of an account dated within `start..=end`.
    fn get_by_account_id_with_date_range(
        &self,
        account_id: AccountId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Transaction>, Error> {
        self.get_transactions_with_filters(
            &TransactionQuery::for_account(account_id).with_date_range(start, end),
        )
    }

    /// Retrieve the transactions of every account in a project dated within `start..=end`.
    fn get_by_project_id_with_date_range(
        &self,
        project_id: ProjectId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Transaction>, Error> {
        self.get_transactions_with_filters(
            &TransactionQuery::for_project(project_id).with_date_range(start, end),
        )
    }
}
