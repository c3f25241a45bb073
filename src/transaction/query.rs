//! Transaction filter queries and the services that run them.

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{AccountId, ProjectId},
    stores::{AccountStore, ProjectStore, TransactionStore},
    transaction::{DateWindow, Transaction},
};

/// Selects the transactions of one project or one account.
///
/// Exactly one of `project_id` and `account_id` must be set, see
/// [TransactionQuery::validate]. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Include transactions from every account in this project.
    pub project_id: Option<ProjectId>,
    /// Include transactions from this account.
    pub account_id: Option<AccountId>,
    /// Include transactions dated at or after this instant.
    pub start_date: Option<OffsetDateTime>,
    /// Include transactions dated at or before this instant.
    pub end_date: Option<OffsetDateTime>,
    /// Leave out transactions dated after the time the query runs.
    ///
    /// Has no effect when `end_date` is set.
    pub exclude_future_transactions: bool,
}

impl TransactionQuery {
    /// A query for every transaction in a project.
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    /// A query for every transaction of an account.
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Default::default()
        }
    }

    /// Restrict the query to transactions dated within `start..=end`.
    pub fn with_date_range(mut self, start: OffsetDateTime, end: OffsetDateTime) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Restrict the query to transactions dated within `window`.
    pub fn with_window(self, window: DateWindow) -> Self {
        self.with_date_range(window.start, window.end)
    }

    /// Leave out transactions dated in the future.
    pub fn excluding_future(mut self) -> Self {
        self.exclude_future_transactions = true;
        self
    }

    /// Check that the query names exactly one of a project or an account and
    /// that its date range is not reversed.
    ///
    /// # Errors
    ///
    /// Returns [Error::MissingQueryScope], [Error::AmbiguousQueryScope] or
    /// [Error::InvalidDateRange].
    pub fn validate(&self) -> Result<(), Error> {
        match (self.project_id, self.account_id) {
            (None, None) => return Err(Error::MissingQueryScope),
            (Some(_), Some(_)) => return Err(Error::AmbiguousQueryScope),
            _ => {}
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err(Error::InvalidDateRange);
        }

        Ok(())
    }

    /// The latest transaction date included by the query when it runs at `now`.
    ///
    /// An explicit end date wins over excluding future transactions.
    pub fn effective_end_date(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        match self.end_date {
            Some(end_date) => Some(end_date),
            None if self.exclude_future_transactions => Some(now),
            None => None,
        }
    }

    /// Whether `transaction_date` falls within the query's date bounds at `now`.
    pub fn includes_date(&self, transaction_date: OffsetDateTime, now: OffsetDateTime) -> bool {
        let after_start = self
            .start_date
            .is_none_or(|start_date| transaction_date >= start_date);
        let before_end = self
            .effective_end_date(now)
            .is_none_or(|end_date| transaction_date <= end_date);

        after_start && before_end
    }
}

/// Validate `query`, check that the project or account it names exists and run it.
///
/// Transactions are returned most recent first.
///
/// # Errors
///
/// Returns a validation error from [TransactionQuery::validate],
/// [Error::ProjectNotFound] or [Error::AccountNotFound] if the scope of the
/// query does not exist, or any error from the stores.
pub fn get_transactions(
    query: &TransactionQuery,
    projects: &impl ProjectStore,
    accounts: &impl AccountStore,
    transactions: &impl TransactionStore,
) -> Result<Vec<Transaction>, Error> {
    query.validate()?;

    if let Some(project_id) = query.project_id {
        projects.get_by_id(project_id)?;
    }

    if let Some(account_id) = query.account_id {
        accounts.get_by_id(account_id)?;
    }

    transactions.get_transactions_with_filters(query)
}

/// Get the transactions of a project dated within a year, or a month of that year.
///
/// A `month` of zero means the whole year. See [DateWindow::for_period].
pub fn get_project_transactions(
    project_id: ProjectId,
    year: i32,
    month: u8,
    transactions: &impl TransactionStore,
) -> Result<Vec<Transaction>, Error> {
    let window = DateWindow::for_period(year, Some(month))?;

    transactions
        .get_transactions_with_filters(&TransactionQuery::for_project(project_id).with_window(window))
}


#[cfg(test)]
mod get_transactions_tests {
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        account::Account,
        currency::Currency,
        database_id::{AccountId, ProjectId},
        project::Project,
        stores::{AccountStore, InMemoryStore, ProjectStore, TransactionStore},
        transaction::{Transaction, TransactionData, TransactionType},
    };

    use super::{TransactionQuery, get_project_transactions, get_transactions};

    struct Fixture {
        store: InMemoryStore,
        project: Project,
        account: Account,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
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

    fn insert(store: &InMemoryStore, account_id: AccountId, date: OffsetDateTime) -> Transaction {
        let data = TransactionData {
            account_id,
            value: 10.0,
            name: "Test".to_owned(),
            transaction_type: TransactionType::Debit,
            transaction_date: Some(date),
        };

        TransactionStore::create(store, Transaction::new(data, None, OffsetDateTime::now_utc()))
            .unwrap()
    }

    #[test]
    fn future_transactions_excluded_without_end_date() {
        let Fixture { store, account, .. } = fixture();
        let now = OffsetDateTime::now_utc();
        let yesterday = insert(&store, account.id, now - Duration::days(1));
        let today = insert(&store, account.id, now - Duration::seconds(1));
        let tomorrow = insert(&store, account.id, now + Duration::days(1));

        let got = get_transactions(
            &TransactionQuery::for_account(account.id).excluding_future(),
            &store,
            &store,
            &store,
        )
        .unwrap();
        assert_eq!(got, vec![today.clone(), yesterday.clone()]);

        let got = get_transactions(
            &TransactionQuery::for_account(account.id),
            &store,
            &store,
            &store,
        )
        .unwrap();
        assert_eq!(got, vec![tomorrow, today, yesterday]);
    }

    #[test]
    fn transaction_dated_at_end_date_is_included() {
        let Fixture { store, account, .. } = fixture();
        let end = datetime!(2024-05-01 12:00 UTC);
        let before = insert(&store, account.id, end - Duration::seconds(1));
        let at_end = insert(&store, account.id, end);
        insert(&store, account.id, end + Duration::seconds(1));

        let got = get_transactions(
            &TransactionQuery::for_account(account.id)
                .with_date_range(end - Duration::days(1), end)
                .excluding_future(),
            &store,
            &store,
            &store,
        )
        .unwrap();
        assert_eq!(got, vec![at_end.clone(), before]);

        let got = get_transactions(
            &TransactionQuery::for_account(account.id).with_date_range(end, end),
            &store,
            &store,
            &store,
        )
        .unwrap();
        assert_eq!(got, vec![at_end]);
    }

    #[test]
    fn rejects_invalid_query_before_lookup() {
        let Fixture { store, .. } = fixture();

        let result = get_transactions(&TransactionQuery::default(), &store, &store, &store);

        assert_eq!(result, Err(Error::MissingQueryScope));
    }

    #[test]
    fn missing_account_is_not_found() {
        let Fixture { store, .. } = fixture();

        let result = get_transactions(
            &TransactionQuery::for_account(AccountId::new()),
            &store,
            &store,
            &store,
        );

        assert_eq!(result, Err(Error::AccountNotFound));
    }

    #[test]
    fn missing_project_is_not_found() {
        let Fixture { store, .. } = fixture();

        let result = get_transactions(
            &TransactionQuery::for_project(ProjectId::new()),
            &store,
            &store,
            &store,
        );

        assert_eq!(result, Err(Error::ProjectNotFound));
    }

    #[test]
    fn project_transactions_filtered_by_month() {
        let Fixture {
            store,
            project,
            account,
        } = fixture();
        insert(&store, account.id, datetime!(2024-02-29 23:59:59 UTC));
        let in_march = insert(&store, account.id, datetime!(2024-03-15 12:00 UTC));
        insert(&store, account.id, datetime!(2024-04-01 00:00 UTC));

        let got = get_project_transactions(project.id, 2024, 3, &store).unwrap();

        assert_eq!(got, vec![in_march]);
    }

    #[test]
    fn month_zero_covers_whole_year() {
        let Fixture {
            store,
            project,
            account,
        } = fixture();
        let first = insert(&store, account.id, datetime!(2024-01-01 00:00 UTC));
        let last = insert(&store, account.id, datetime!(2024-12-31 23:59:59 UTC));
        insert(&store, account.id, datetime!(2025-01-01 00:00 UTC));

        let got = get_project_transactions(project.id, 2024, 0, &store).unwrap();

        assert_eq!(got, vec![last, first]);
    }
}
