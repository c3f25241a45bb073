//! An in-memory implementation of every store, used in tests and for
//! throwaway data.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use time::OffsetDateTime;

use crate::{
    Error,
    access::Access,
    account::Account,
    database_id::{AccessId, AccountId, GroupId, ProjectId, TransactionId},
    project::Project,
    stores::{AccessStore, AccountStore, ProjectStore, TransactionStore},
    transaction::{Transaction, TransactionQuery},
};

#[derive(Debug, Default)]
struct Tables {
    projects: HashMap<ProjectId, Project>,
    accesses: HashMap<AccessId, Access>,
    accounts: HashMap<AccountId, Account>,
    /// Kept in insertion order so groups come back in creation order.
    transactions: Vec<Transaction>,
}

/// Stores projects, accesses, accounts and transactions in memory.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire store lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

/// Expects `transactions` in insertion order. Later inserts win ties.
fn sort_most_recent_first(transactions: &mut [Transaction]) {
    transactions.reverse();
    transactions.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

impl ProjectStore for InMemoryStore {
    fn create(&self, project: Project) -> Result<Project, Error> {
        let mut tables = self.lock()?;

        if tables
            .projects
            .values()
            .any(|existing| existing.slug == project.slug)
        {
            return Err(Error::DuplicateEntry);
        }

        tables.projects.insert(project.id, project.clone());

        Ok(project)
    }

    fn get_by_slug(&self, slug: &str) -> Result<Project, Error> {
        self.lock()?
            .projects
            .values()
            .find(|project| project.slug == slug)
            .cloned()
            .ok_or(Error::ProjectNotFound)
    }

    fn get_by_id(&self, id: ProjectId) -> Result<Project, Error> {
        self.lock()?
            .projects
            .get(&id)
            .cloned()
            .ok_or(Error::ProjectNotFound)
    }

    fn exists_by_slug(&self, slug: &str) -> Result<bool, Error> {
        Ok(self
            .lock()?
            .projects
            .values()
            .any(|project| project.slug == slug))
    }
}

impl AccessStore for InMemoryStore {
    fn create(&self, access: Access) -> Result<Access, Error> {
        let mut tables = self.lock()?;

        if tables
            .accesses
            .values()
            .any(|existing| existing.project_id == access.project_id && existing.uid == access.uid)
        {
            return Err(Error::DuplicateEntry);
        }

        tables.accesses.insert(access.id, access.clone());

        Ok(access)
    }

    fn get_by_id(&self, id: AccessId) -> Result<Access, Error> {
        self.lock()?
            .accesses
            .get(&id)
            .cloned()
            .ok_or(Error::AccessNotFound)
    }

    fn get_by_project_id(&self, project_id: ProjectId) -> Result<Vec<Access>, Error> {
        let mut accesses: Vec<Access> = self
            .lock()?
            .accesses
            .values()
            .filter(|access| access.project_id == project_id)
            .cloned()
            .collect();
        accesses.sort_by_key(|access| access.created_at);

        Ok(accesses)
    }

    fn get_by_uid(&self, project_id: ProjectId, uid: &str) -> Result<Access, Error> {
        self.lock()?
            .accesses
            .values()
            .find(|access| access.project_id == project_id && access.uid == uid)
            .cloned()
            .ok_or(Error::AccessNotFound)
    }

    fn exists_by_uid(&self, project_id: ProjectId, uid: &str) -> Result<bool, Error> {
        Ok(self
            .lock()?
            .accesses
            .values()
            .any(|access| access.project_id == project_id && access.uid == uid))
    }
}

impl AccountStore for InMemoryStore {
    fn create(&self, account: Account) -> Result<Account, Error> {
        let mut tables = self.lock()?;

        if tables
            .accounts
            .values()
            .any(|existing| existing.project_id == account.project_id && existing.name == account.name)
        {
            return Err(Error::DuplicateEntry);
        }

        tables.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    fn get_by_id(&self, id: AccountId) -> Result<Account, Error> {
        self.lock()?
            .accounts
            .get(&id)
            .cloned()
            .ok_or(Error::AccountNotFound)
    }

    fn get_by_project_id(&self, project_id: ProjectId) -> Result<Vec<Account>, Error> {
        let mut accounts: Vec<Account> = self
            .lock()?
            .accounts
            .values()
            .filter(|account| account.project_id == project_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(accounts)
    }

    fn exists_by_name(&self, project_id: ProjectId, name: &str) -> Result<bool, Error> {
        Ok(self
            .lock()?
            .accounts
            .values()
            .any(|account| account.project_id == project_id && account.name == name))
    }
}

impl TransactionStore for InMemoryStore {
    fn create(&self, transaction: Transaction) -> Result<Transaction, Error> {
        let mut tables = self.lock()?;

        if tables
            .transactions
            .iter()
            .any(|existing| existing.id == transaction.id)
        {
            return Err(Error::DuplicateEntry);
        }

        tables.transactions.push(transaction.clone());

        Ok(transaction)
    }

    fn create_batch(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>, Error> {
        let mut tables = self.lock()?;

        let clashes = transactions.iter().enumerate().any(|(index, transaction)| {
            tables
                .transactions
                .iter()
                .chain(&transactions[..index])
                .any(|existing| existing.id == transaction.id)
        });
        if clashes {
            return Err(Error::DuplicateEntry);
        }

        tables.transactions.extend(transactions.iter().cloned());

        Ok(transactions)
    }

    fn get_by_id(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.lock()?
            .transactions
            .iter()
            .find(|transaction| transaction.id == id)
            .cloned()
            .ok_or(Error::TransactionNotFound)
    }

    fn get_by_group_id(&self, group_id: GroupId) -> Result<Vec<Transaction>, Error> {
        Ok(self
            .lock()?
            .transactions
            .iter()
            .filter(|transaction| transaction.group_id == Some(group_id))
            .cloned()
            .collect())
    }

    fn get_transactions_with_filters(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let now = OffsetDateTime::now_utc();
        let tables = self.lock()?;

        let in_scope = |transaction: &Transaction| match (query.account_id, query.project_id) {
            (Some(account_id), _) => transaction.account_id == account_id,
            (None, Some(project_id)) => tables
                .accounts
                .get(&transaction.account_id)
                .is_some_and(|account| account.project_id == project_id),
            (None, None) => true,
        };

        let mut transactions: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|transaction| in_scope(transaction))
            .filter(|transaction| query.includes_date(transaction.transaction_date, now))
            .cloned()
            .collect();
        sort_most_recent_first(&mut transactions);

        Ok(transactions)
    }

    fn delete_by_id(&self, id: TransactionId) -> Result<(), Error> {
        let mut tables = self.lock()?;

        let count_before = tables.transactions.len();
        tables.transactions.retain(|transaction| transaction.id != id);

        if tables.transactions.len() == count_before {
            return Err(Error::TransactionNotFound);
        }

        Ok(())
    }
}
