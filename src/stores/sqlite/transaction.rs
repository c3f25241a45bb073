use rusqlite::{Connection, Row, ToSql, params_from_iter};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{GroupId, TransactionId},
    datetime::StoredDateTime,
    stores::TransactionStore,
    transaction::{Transaction, TransactionQuery},
};

use super::SQLiteStore;

pub(super) fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL,
            value REAL NOT NULL CHECK (value > 0),
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('debit', 'top-up')),
            transaction_date TEXT NOT NULL,
            group_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
        ON \"transaction\"(account_id, transaction_date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_group ON \"transaction\"(group_id)",
        (),
    )?;

    Ok(())
}

const SELECT_TRANSACTION: &str = "SELECT t.id, t.account_id, t.value, t.name, t.type, \
    t.transaction_date, t.group_id, t.created_at, t.updated_at FROM \"transaction\" t";

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let transaction_date: StoredDateTime = row.get(5)?;
    let created_at: StoredDateTime = row.get(7)?;
    let updated_at: StoredDateTime = row.get(8)?;

    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        value: row.get(2)?,
        name: row.get(3)?,
        transaction_type: row.get(4)?,
        transaction_date: transaction_date.0,
        group_id: row.get(6)?,
        created_at: created_at.0,
        updated_at: updated_at.0,
    })
}

fn insert_transaction(connection: &Connection, transaction: &Transaction) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO \"transaction\"
        (id, account_id, value, name, type, transaction_date, group_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            transaction.id,
            transaction.account_id,
            transaction.value,
            &transaction.name,
            transaction.transaction_type,
            StoredDateTime(transaction.transaction_date),
            transaction.group_id,
            StoredDateTime(transaction.created_at),
            StoredDateTime(transaction.updated_at),
        ),
    )?;

    Ok(())
}

/// Build the WHERE clause and parameters for `query` when run at `now`.
fn filter_clause(query: &TransactionQuery, now: OffsetDateTime) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(account_id) = query.account_id {
        conditions.push("t.account_id = ?");
        params.push(Box::new(account_id));
    } else if let Some(project_id) = query.project_id {
        conditions.push("a.project_id = ?");
        params.push(Box::new(project_id));
    }

    if let Some(start_date) = query.start_date {
        conditions.push("t.transaction_date >= ?");
        params.push(Box::new(StoredDateTime(start_date)));
    }

    if let Some(end_date) = query.effective_end_date(now) {
        conditions.push("t.transaction_date <= ?");
        params.push(Box::new(StoredDateTime(end_date)));
    }

    let join = if query.account_id.is_none() && query.project_id.is_some() {
        " JOIN account a ON a.id = t.account_id"
    } else {
        ""
    };

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    (format!("{join}{where_clause}"), params)
}

impl TransactionStore for SQLiteStore {
    fn create(&self, transaction: Transaction) -> Result<Transaction, Error> {
        insert_transaction(&*self.lock()?, &transaction)?;

        Ok(transaction)
    }

    fn create_batch(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;
        // Dropping the transaction without committing rolls back every insert.
        let sql_transaction = connection.unchecked_transaction()?;

        for transaction in &transactions {
            insert_transaction(&sql_transaction, transaction)?;
        }

        sql_transaction.commit()?;

        Ok(transactions)
    }

    fn get_by_id(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.lock()?
            .prepare(&format!("{SELECT_TRANSACTION} WHERE t.id = ?1"))?
            .query_row((id,), map_transaction_row)
            .map_err(|error| Error::from(error).or_not_found(Error::TransactionNotFound))
    }

    fn get_by_group_id(&self, group_id: GroupId) -> Result<Vec<Transaction>, Error> {
        self.lock()?
            .prepare(&format!(
                "{SELECT_TRANSACTION} WHERE t.group_id = ?1 ORDER BY t.rowid"
            ))?
            .query_map((group_id,), map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    fn get_transactions_with_filters(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let (filter, params) = filter_clause(query, OffsetDateTime::now_utc());
        let sql = format!(
            "{SELECT_TRANSACTION}{filter} ORDER BY t.transaction_date DESC, t.created_at DESC, t.rowid DESC"
        );

        self.lock()?
            .prepare(&sql)?
            .query_map(params_from_iter(params.iter()), map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    fn delete_by_id(&self, id: TransactionId) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

        if rows_affected == 0 {
            return Err(Error::TransactionNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        account::Account,
        currency::Currency,
        database_id::{GroupId, TransactionId},
        project::Project,
        stores::{AccountStore, ProjectStore, SQLiteStore, TransactionStore, sqlite::get_test_store},
        transaction::{Transaction, TransactionData, TransactionQuery, TransactionType},
    };

    struct Fixture {
        store: SQLiteStore,
        project: Project,
        account: Account,
    }

    fn fixture() -> Fixture {
        let store = get_test_store();
        let project = ProjectStore::create(&store, Project::new("Home", "home".to_owned())).unwrap();
        let account =
            AccountStore::create(&store, Account::new(project.id, "Wallet", Currency::Pln))
                .unwrap();

        Fixture {
            store,
            project,
            account,
        }
    }

    fn new_transaction(
        account: &Account,
        date: OffsetDateTime,
        group_id: Option<GroupId>,
    ) -> Transaction {
        Transaction::new(
            TransactionData {
                account_id: account.id,
                value: 12.34,
                name: "Groceries".to_owned(),
                transaction_type: TransactionType::Debit,
                transaction_date: Some(date),
            },
            group_id,
            OffsetDateTime::now_utc(),
        )
    }

    #[test]
    fn create_then_get_round_trips() {
        let Fixture { store, account, .. } = fixture();
        let transaction = new_transaction(&account, datetime!(2024-05-06 07:08:09.123456789 UTC), None);

        let created = TransactionStore::create(&store, transaction.clone()).unwrap();

        assert_eq!(created, transaction);
        assert_eq!(TransactionStore::get_by_id(&store, transaction.id), Ok(transaction));
    }

    #[test]
    fn missing_transaction_is_not_found() {
        let Fixture { store, .. } = fixture();

        assert_eq!(
            TransactionStore::get_by_id(&store, TransactionId::new()),
            Err(Error::TransactionNotFound)
        );
        assert_eq!(
            store.delete_by_id(TransactionId::new()),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn non_positive_value_violates_check() {
        let Fixture { store, account, .. } = fixture();
        let mut transaction = new_transaction(&account, datetime!(2024-01-01 00:00 UTC), None);
        transaction.value = 0.0;

        let result = TransactionStore::create(&store, transaction);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn batch_keeps_group_order() {
        let Fixture { store, account, .. } = fixture();
        let group_id = GroupId::new();
        let batch = vec![
            new_transaction(&account, datetime!(2024-02-01 00:00 UTC), Some(group_id)),
            new_transaction(&account, datetime!(2024-01-01 00:00 UTC), Some(group_id)),
            new_transaction(&account, datetime!(2024-03-01 00:00 UTC), Some(group_id)),
        ];

        let created = store.create_batch(batch.clone()).unwrap();

        assert_eq!(created, batch);
        assert_eq!(store.get_by_group_id(group_id), Ok(batch));
    }

    #[test]
    fn failed_batch_stores_nothing() {
        let Fixture { store, account, .. } = fixture();
        let group_id = GroupId::new();
        let first = new_transaction(&account, datetime!(2024-02-01 00:00 UTC), Some(group_id));
        let mut invalid = new_transaction(&account, datetime!(2024-02-02 00:00 UTC), Some(group_id));
        invalid.value = -1.0;

        let result = store.create_batch(vec![first.clone(), invalid]);

        assert!(result.is_err());
        assert_eq!(
            TransactionStore::get_by_id(&store, first.id),
            Err(Error::TransactionNotFound)
        );
        assert_eq!(store.get_by_group_id(group_id), Ok(Vec::new()));
    }

    #[test]
    fn filters_by_inclusive_date_range() {
        let Fixture { store, account, .. } = fixture();
        let before = new_transaction(&account, datetime!(2023-12-31 23:59:59.999999999 UTC), None);
        let start = new_transaction(&account, datetime!(2024-01-01 00:00 UTC), None);
        let end = new_transaction(&account, datetime!(2024-01-31 23:59:59.999999999 UTC), None);
        let after = new_transaction(&account, datetime!(2024-02-01 00:00 UTC), None);
        for transaction in [&before, &start, &end, &after] {
            TransactionStore::create(&store, transaction.clone()).unwrap();
        }

        let got = store
            .get_by_account_id_with_date_range(
                account.id,
                datetime!(2024-01-01 00:00 UTC),
                datetime!(2024-01-31 23:59:59.999999999 UTC),
            )
            .unwrap();

        assert_eq!(got, vec![end, start]);
    }

    #[test]
    fn project_filter_excludes_other_projects() {
        let Fixture {
            store,
            project,
            account,
        } = fixture();
        let other = ProjectStore::create(&store, Project::new("Work", "work".to_owned())).unwrap();
        let other_account =
            AccountStore::create(&store, Account::new(other.id, "Cash", Currency::Pln)).unwrap();
        let mine = TransactionStore::create(
            &store,
            new_transaction(&account, datetime!(2024-01-01 00:00 UTC), None),
        )
        .unwrap();
        TransactionStore::create(
            &store,
            new_transaction(&other_account, datetime!(2024-01-01 00:00 UTC), None),
        )
        .unwrap();

        let got = store
            .get_transactions_with_filters(&TransactionQuery::for_project(project.id))
            .unwrap();

        assert_eq!(got, vec![mine]);
    }

    #[test]
    fn same_date_orders_by_creation_time_descending() {
        let Fixture { store, account, .. } = fixture();
        let date = datetime!(2024-04-01 12:00 UTC);
        let mut newer = new_transaction(&account, date, None);
        newer.created_at = datetime!(2024-04-02 08:00 UTC);
        let mut older = new_transaction(&account, date, None);
        older.created_at = datetime!(2024-04-01 08:00 UTC);
        let newer = TransactionStore::create(&store, newer).unwrap();
        let older = TransactionStore::create(&store, older).unwrap();

        let got = store
            .get_transactions_with_filters(&TransactionQuery::for_account(account.id))
            .unwrap();

        assert_eq!(got, vec![newer, older]);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let Fixture { store, account, .. } = fixture();
        let start = datetime!(2024-05-01 00:00 UTC);
        let end = datetime!(2024-05-31 23:59:59 UTC);
        let mut created = Vec::new();
        for date in [
            start - Duration::seconds(1),
            start,
            end,
            end + Duration::seconds(1),
        ] {
            created.push(
                TransactionStore::create(&store, new_transaction(&account, date, None)).unwrap(),
            );
        }

        let got = store
            .get_transactions_with_filters(
                &TransactionQuery::for_account(account.id).with_date_range(start, end),
            )
            .unwrap();

        assert_eq!(got, vec![created[2].clone(), created[1].clone()]);
    }

    #[test]
    fn future_exclusion_only_without_end_date() {
        let Fixture { store, account, .. } = fixture();
        let now = OffsetDateTime::now_utc();
        let yesterday = new_transaction(&account, now - Duration::days(1), None);
        let today = new_transaction(&account, now - Duration::seconds(1), None);
        let tomorrow = new_transaction(&account, now + Duration::days(1), None);
        for transaction in [&yesterday, &today, &tomorrow] {
            TransactionStore::create(&store, transaction.clone()).unwrap();
        }

        let excluding = store
            .get_transactions_with_filters(&TransactionQuery::for_account(account.id).excluding_future())
            .unwrap();
        let with_end_date = store
            .get_transactions_with_filters(&TransactionQuery {
                end_date: Some(now + Duration::days(2)),
                ..TransactionQuery::for_account(account.id).excluding_future()
            })
            .unwrap();
        let everything = store.get_by_account_id(account.id).unwrap();

        assert_eq!(excluding, vec![today.clone(), yesterday.clone()]);
        assert_eq!(with_end_date, vec![tomorrow.clone(), today.clone(), yesterday.clone()]);
        assert_eq!(everything, vec![tomorrow, today, yesterday]);
    }

    #[test]
    fn delete_removes_transaction() {
        let Fixture { store, account, .. } = fixture();
        let transaction = TransactionStore::create(
            &store,
            new_transaction(&account, datetime!(2024-01-01 00:00 UTC), None),
        )
        .unwrap();

        store.delete_by_id(transaction.id).unwrap();

        assert_eq!(
            TransactionStore::get_by_id(&store, transaction.id),
            Err(Error::TransactionNotFound)
        );
    }
}
