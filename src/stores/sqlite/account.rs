use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    account::Account,
    database_id::{AccountId, ProjectId},
    datetime::StoredDateTime,
    stores::AccountStore,
};

use super::SQLiteStore;

pub(super) fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            name TEXT NOT NULL,
            currency TEXT NOT NULL CHECK (currency IN ('USD', 'EUR', 'PLN')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(project_id, name),
            FOREIGN KEY(project_id) REFERENCES project(id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT: &str =
    "SELECT id, project_id, name, currency, created_at, updated_at FROM account";

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let created_at: StoredDateTime = row.get(4)?;
    let updated_at: StoredDateTime = row.get(5)?;

    Ok(Account {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        currency: row.get(3)?,
        created_at: created_at.0,
        updated_at: updated_at.0,
    })
}

impl AccountStore for SQLiteStore {
    fn create(&self, account: Account) -> Result<Account, Error> {
        self.lock()?.execute(
            "INSERT INTO account (id, project_id, name, currency, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                account.id,
                account.project_id,
                &account.name,
                account.currency,
                StoredDateTime(account.created_at),
                StoredDateTime(account.updated_at),
            ),
        )?;

        Ok(account)
    }

    fn get_by_id(&self, id: AccountId) -> Result<Account, Error> {
        self.lock()?
            .prepare(&format!("{SELECT_ACCOUNT} WHERE id = ?1"))?
            .query_row((id,), map_account_row)
            .map_err(|error| Error::from(error).or_not_found(Error::AccountNotFound))
    }

    fn get_by_project_id(&self, project_id: ProjectId) -> Result<Vec<Account>, Error> {
        self.lock()?
            .prepare(&format!(
                "{SELECT_ACCOUNT} WHERE project_id = ?1 ORDER BY name"
            ))?
            .query_map((project_id,), map_account_row)?
            .map(|maybe_account| maybe_account.map_err(Error::from))
            .collect()
    }

    fn exists_by_name(&self, project_id: ProjectId, name: &str) -> Result<bool, Error> {
        let found = self
            .lock()?
            .query_row(
                "SELECT 1 FROM account WHERE project_id = ?1 AND name = ?2",
                (project_id, name),
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        account::Account,
        currency::Currency,
        database_id::{AccountId, ProjectId},
        project::Project,
        stores::{AccountStore, ProjectStore, SQLiteStore, sqlite::get_test_store},
    };

    fn store_with_project() -> (SQLiteStore, Project) {
        let store = get_test_store();
        let project = ProjectStore::create(&store, Project::new("Home", "home".to_owned())).unwrap();

        (store, project)
    }

    #[test]
    fn create_then_get() {
        let (store, project) = store_with_project();

        let account = AccountStore::create(&store, Account::new(project.id, "Wallet", Currency::Eur))
            .unwrap();

        assert_eq!(AccountStore::get_by_id(&store, account.id), Ok(account));
    }

    #[test]
    fn missing_account_is_not_found() {
        let (store, _) = store_with_project();

        assert_eq!(
            AccountStore::get_by_id(&store, AccountId::new()),
            Err(Error::AccountNotFound)
        );
    }

    #[test]
    fn duplicate_name_in_project_is_rejected() {
        let (store, project) = store_with_project();
        AccountStore::create(&store, Account::new(project.id, "Wallet", Currency::Eur))
            .unwrap();

        let result = AccountStore::create(&store, Account::new(project.id, "Wallet", Currency::Usd));

        assert_eq!(result, Err(Error::DuplicateEntry));
        assert_eq!(store.exists_by_name(project.id, "Wallet"), Ok(true));
        assert_eq!(store.exists_by_name(project.id, "Bank"), Ok(false));
    }

    #[test]
    fn unknown_project_violates_foreign_key() {
        let store = get_test_store();

        let result = AccountStore::create(&store, Account::new(ProjectId::new(), "Wallet", Currency::Eur));

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn project_accounts_sorted_by_name() {
        let (store, project) = store_with_project();
        let other = ProjectStore::create(&store, Project::new("Work", "work".to_owned())).unwrap();
        for name in ["Savings", "Bank"] {
            AccountStore::create(&store, Account::new(project.id, name, Currency::Pln))
                .unwrap();
        }
        AccountStore::create(&store, Account::new(other.id, "Cash", Currency::Pln))
            .unwrap();

        let names: Vec<String> = AccountStore::get_by_project_id(&store, project.id)
            .unwrap()
            .into_iter()
            .map(|account| account.name)
            .collect();

        assert_eq!(names, ["Bank", "Savings"]);
    }
}
