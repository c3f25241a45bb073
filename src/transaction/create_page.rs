//! The page and form handler for recording a group of transactions at once.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{
    AppState, Error,
    account::Account,
    config::ServiceConfig,
    dashboard::{SuccessMessage, dashboard_url_with_success},
    database_id::AccountId,
    datetime::parse_date_time,
    endpoints::{self, format_endpoint},
    error::ErrorKind,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, link, loading_spinner, project_header,
    },
    project::Project,
    stores::{AccountStore, SQLiteStore},
    timezone::get_local_offset,
    transaction::{TransactionData, TransactionType, create_grouped_transactions},
};

/// How many transaction rows the form shows.
const ROW_COUNT: usize = 5;

pub const NO_TRANSACTIONS_ERROR_MSG: &str = "At least one transaction is required";

/// The state needed for the create transactions page and its form handler.
#[derive(Debug, Clone)]
pub struct CreateTransactionsState {
    /// The database connection for reading accounts and storing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Warsaw".
    pub local_timezone: String,
    /// Limits and policies for creating transactions.
    pub service_config: ServiceConfig,
}

impl FromRef<AppState> for CreateTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            service_config: state.service_config,
        }
    }
}

/// The submitted rows of the create transactions form.
///
/// Each field holds one entry per row, in row order. A row with a blank
/// value is skipped.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreateTransactionsForm {
    /// The transaction names.
    #[serde(default)]
    pub name: Vec<String>,
    /// The transaction amounts.
    #[serde(default)]
    pub value: Vec<String>,
    /// "debit" or "top-up".
    #[serde(default, rename = "type")]
    pub transaction_type: Vec<String>,
    /// The IDs of the accounts.
    #[serde(default)]
    pub account_id: Vec<String>,
    /// Local date-times from a `datetime-local` input, blank for now.
    #[serde(default)]
    pub date: Vec<String>,
}

/// One row of the form as typed in by the user.
#[derive(Debug, Default, Clone, PartialEq)]
struct FormRow {
    name: String,
    value: String,
    transaction_type: String,
    account_id: String,
    date: String,
}

impl CreateTransactionsForm {
    fn rows(&self) -> Vec<FormRow> {
        let row_count = [
            self.name.len(),
            self.value.len(),
            self.transaction_type.len(),
            self.account_id.len(),
            self.date.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        fn field(values: &[String], index: usize) -> String {
            values.get(index).cloned().unwrap_or_default()
        }

        (0..row_count)
            .map(|index| FormRow {
                name: field(&self.name, index),
                value: field(&self.value, index),
                transaction_type: field(&self.transaction_type, index),
                account_id: field(&self.account_id, index),
                date: field(&self.date, index),
            })
            .collect()
    }
}

/// Turn the rows with a value into transaction data.
///
/// Row numbers in error messages count from one and include skipped rows.
/// Dates are read in `local_offset`.
fn parse_rows(rows: &[FormRow], local_offset: UtcOffset) -> Result<Vec<TransactionData>, String> {
    let mut batch = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let group = index + 1;
        let value = row.value.trim();
        if value.is_empty() {
            continue;
        }

        let value: f64 = value
            .parse()
            .map_err(|_| format!("Invalid value for group {group}"))?;

        if row.account_id.trim().is_empty() {
            return Err(format!("Account is required for group {group}"));
        }
        let account_id: AccountId = row
            .account_id
            .parse()
            .map_err(|_| format!("Invalid account for group {group}"))?;

        if row.transaction_type.trim().is_empty() {
            return Err(format!("Type is required for group {group}"));
        }
        let transaction_type: TransactionType = row
            .transaction_type
            .parse()
            .map_err(|_| format!("Invalid type for group {group}"))?;

        let transaction_date = match row.date.trim() {
            "" => None,
            date => Some(
                parse_date_time(date)
                    .map(|date_time| date_time.replace_offset(local_offset).to_offset(UtcOffset::UTC))
                    .map_err(|_| format!("Invalid date for group {group}"))?,
            ),
        };

        batch.push(TransactionData {
            account_id,
            value,
            name: row.name.trim().to_owned(),
            transaction_type,
            transaction_date,
        });
    }

    if batch.is_empty() {
        return Err(NO_TRANSACTIONS_ERROR_MSG.to_owned());
    }

    Ok(batch)
}

fn transaction_row(
    index: usize,
    row: &FormRow,
    accounts: &[Account],
    default_date: &str,
) -> Markup {
    let date = if row.date.is_empty() {
        default_date
    } else {
        row.date.as_str()
    };

    html! {
        fieldset class="grid grid-cols-1 md:grid-cols-5 gap-2 border-b pb-4"
        {
            legend class="text-sm font-semibold" { "Transaction " (index + 1) }

            div
            {
                label for={"name-" (index)} class=(FORM_LABEL_STYLE) { "Name" }
                input
                    type="text"
                    name="name"
                    id={"name-" (index)}
                    value=(row.name)
                    placeholder="Groceries"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for={"value-" (index)} class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    type="number"
                    name="value"
                    id={"value-" (index)}
                    value=(row.value)
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    autofocus[index == 0]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for={"type-" (index)} class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id={"type-" (index)} class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for transaction_type in TransactionType::all() {
                        option
                            value=(transaction_type)
                            selected[row.transaction_type == transaction_type.as_str()]
                        {
                            (transaction_type)
                        }
                    }
                }
            }

            div
            {
                label for={"account-" (index)} class=(FORM_LABEL_STYLE) { "Account" }
                select name="account_id" id={"account-" (index)} class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[row.account_id == account.id.to_string()]
                        {
                            (account.name) " (" (account.currency.code()) ")"
                        }
                    }
                }
            }

            div
            {
                label for={"date-" (index)} class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="datetime-local"
                    name="date"
                    id={"date-" (index)}
                    value=(date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn create_transactions_form(
    create_route: &str,
    accounts: &[Account],
    rows: &[FormRow],
    default_date: &str,
    error_message: Option<&str>,
) -> Markup {
    let empty_row = FormRow::default();

    html! {
        form
            hx-post=(create_route)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="w-full space-y-4"
        {
            div class="text-sm text-gray-500" { "Rows without an amount are skipped." }

            @for index in 0..ROW_COUNT.max(rows.len()) {
                (transaction_row(index, rows.get(index).unwrap_or(&empty_row), accounts, default_date))
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="htmx-indicator" { (loading_spinner()) }
                "Create transactions"
            }
        }
    }
}

fn create_transactions_view(project: &Project, accounts: &[Account], default_date: &str) -> Markup {
    let create_route = format_endpoint(endpoints::NEW_TRANSACTIONS_VIEW, &[&project.slug]);
    let dashboard_url = format_endpoint(endpoints::DASHBOARD_VIEW, &[&project.slug]);
    let new_account_url = format_endpoint(endpoints::NEW_ACCOUNT_VIEW, &[&project.slug]);

    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            (project_header(&project.name, &[(dashboard_url.as_str(), "Dashboard")]))

            h2 class="text-xl font-bold mb-4" { "New transactions" }

            @if accounts.is_empty() {
                p
                {
                    "This project has no accounts. "
                    (link(&new_account_url, "Create an account"))
                    " before recording transactions."
                }
            } @else {
                (create_transactions_form(&create_route, accounts, &[], default_date, None))
            }
        }
    };

    base("New transactions", &content)
}

/// The current local time formatted for a `datetime-local` input.
fn default_date(local_timezone: &str) -> Result<String, Error> {
    let local_offset = local_offset(local_timezone)?;

    OffsetDateTime::now_utc()
        .to_offset(local_offset)
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .map_err(|error| {
            tracing::error!("could not format the current date: {error}");
            Error::InvalidDate(error.to_string())
        })
}

fn local_offset(local_timezone: &str) -> Result<UtcOffset, Error> {
    get_local_offset(local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {local_timezone}");
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })
}

/// Display the form for recording a group of transactions.
pub async fn get_create_transactions_page(
    State(state): State<CreateTransactionsState>,
    Extension(project): Extension<Project>,
) -> Result<Response, Error> {
    let store = SQLiteStore::new(state.db_connection);
    let accounts = AccountStore::get_by_project_id(&store, project.id)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;
    let default_date = default_date(&state.local_timezone)?;

    Ok(create_transactions_view(&project, &accounts, &default_date).into_response())
}

/// Handler for the create transactions form.
///
/// Every submitted row with an amount becomes one transaction of a new group.
/// On success the client is redirected to the dashboard, otherwise the form is
/// returned with the entered values and an error message.
pub async fn create_transactions_endpoint(
    State(state): State<CreateTransactionsState>,
    Extension(project): Extension<Project>,
    Form(form): Form<CreateTransactionsForm>,
) -> Result<Response, Error> {
    let create_route = format_endpoint(endpoints::NEW_TRANSACTIONS_VIEW, &[&project.slug]);
    let local_offset = local_offset(&state.local_timezone)?;
    let default_date = default_date(&state.local_timezone)?;

    let store = SQLiteStore::new(state.db_connection);
    let accounts = AccountStore::get_by_project_id(&store, project.id)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let rows = form.rows();
    let render_error = |message: &str| {
        create_transactions_form(&create_route, &accounts, &rows, &default_date, Some(message))
            .into_response()
    };

    let batch = match parse_rows(&rows, local_offset) {
        Ok(batch) => batch,
        Err(message) => return Ok(render_error(&message)),
    };

    let result = create_grouped_transactions(
        Some(project.id),
        batch,
        &store,
        &store,
        &state.service_config,
    );

    match result {
        Ok(created) => {
            tracing::info!(
                "Created {} transactions in project {}",
                created.len(),
                project.slug
            );

            Ok((
                StatusCode::SEE_OTHER,
                HxRedirect(dashboard_url_with_success(
                    &project.slug,
                    SuccessMessage::TransactionsCreated,
                )),
                (),
            )
                .into_response())
        }
        Err(error) if error.kind() == ErrorKind::Storage => {
            tracing::error!("Failed to create transactions: {error}");
            Ok(render_error("An internal error occurred. Please try again later."))
        }
        Err(error) => Ok(render_error(&format!("Failed to create transactions: {error}"))),
    }
}

#[cfg(test)]
mod parse_rows_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::{database_id::AccountId, transaction::TransactionType};

    use super::{CreateTransactionsForm, FormRow, NO_TRANSACTIONS_ERROR_MSG, parse_rows};

    fn row(account_id: AccountId, value: &str) -> FormRow {
        FormRow {
            name: "Coffee".to_owned(),
            value: value.to_owned(),
            transaction_type: "debit".to_owned(),
            account_id: account_id.to_string(),
            date: String::new(),
        }
    }

    #[test]
    fn repeated_fields_become_rows() {
        let form_data = "name=Coffee&value=4.5&type=debit&account_id=a&date=\
            &name=Rent&value=&type=debit&account_id=b&date=2024-05-01T10%3A00";

        let form: CreateTransactionsForm = serde_html_form::from_str(form_data).unwrap();
        let rows = form.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Coffee");
        assert_eq!(rows[0].transaction_type, "debit");
        assert_eq!(rows[1].value, "");
        assert_eq!(rows[1].account_id, "b");
        assert_eq!(rows[1].date, "2024-05-01T10:00");
    }

    #[test]
    fn skips_rows_without_value() {
        let account_id = AccountId::new();
        let rows = [row(account_id, "4.5"), row(account_id, " "), row(account_id, "10")];

        let batch = parse_rows(&rows, UtcOffset::UTC).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].value, 4.5);
        assert_eq!(batch[0].transaction_type, TransactionType::Debit);
        assert_eq!(batch[0].transaction_date, None);
        assert_eq!(batch[1].value, 10.0);
    }

    #[test]
    fn requires_one_row() {
        let rows = [row(AccountId::new(), "")];

        assert_eq!(
            parse_rows(&rows, UtcOffset::UTC),
            Err(NO_TRANSACTIONS_ERROR_MSG.to_owned())
        );
        assert_eq!(
            parse_rows(&[], UtcOffset::UTC),
            Err(NO_TRANSACTIONS_ERROR_MSG.to_owned())
        );
    }

    #[test]
    fn reports_row_number_of_bad_field() {
        let account_id = AccountId::new();

        let bad_value = [row(account_id, "1"), row(account_id, "abc")];
        assert_eq!(
            parse_rows(&bad_value, UtcOffset::UTC),
            Err("Invalid value for group 2".to_owned())
        );

        let bad_account = [FormRow {
            account_id: "not-an-id".to_owned(),
            ..row(account_id, "1")
        }];
        assert_eq!(
            parse_rows(&bad_account, UtcOffset::UTC),
            Err("Invalid account for group 1".to_owned())
        );

        let missing_account = [FormRow {
            account_id: String::new(),
            ..row(account_id, "1")
        }];
        assert_eq!(
            parse_rows(&missing_account, UtcOffset::UTC),
            Err("Account is required for group 1".to_owned())
        );

        let bad_type = [FormRow {
            transaction_type: "refund".to_owned(),
            ..row(account_id, "1")
        }];
        assert_eq!(
            parse_rows(&bad_type, UtcOffset::UTC),
            Err("Invalid type for group 1".to_owned())
        );

        let bad_date = [FormRow {
            date: "yesterday".to_owned(),
            ..row(account_id, "1")
        }];
        assert_eq!(
            parse_rows(&bad_date, UtcOffset::UTC),
            Err("Invalid date for group 1".to_owned())
        );
    }

    #[test]
    fn reads_dates_in_local_offset() {
        let rows = [FormRow {
            date: "2025-03-01T09:30".to_owned(),
            ..row(AccountId::new(), "1")
        }];
        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();

        let batch = parse_rows(&rows, offset).unwrap();

        assert_eq!(
            batch[0].transaction_date,
            Some(datetime!(2025-03-01 07:30 UTC))
        );
    }
}

#[cfg(test)]
mod endpoint_tests {
    use axum::{
        Extension,
        extract::State,
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use scraper::Selector;

    use crate::{
        account::Account,
        config::ServiceConfig,
        currency::Currency,
        project::Project,
        stores::{
            AccountStore, ProjectStore, SQLiteStore, TransactionStore, sqlite::get_test_store,
        },
        test_utils::{
            assert_form_error_message, assert_form_submit_button, assert_hx_endpoint,
            assert_hx_redirect, assert_status_ok, assert_valid_html, must_get_form,
            parse_html_document, parse_html_fragment,
        },
        transaction::{TransactionQuery, TransactionType},
    };

    use super::{
        CreateTransactionsForm, CreateTransactionsState, NO_TRANSACTIONS_ERROR_MSG, ROW_COUNT,
        create_transactions_endpoint, get_create_transactions_page,
    };

    struct Fixture {
        store: SQLiteStore,
        state: CreateTransactionsState,
        project: Project,
        wallet: Account,
    }

    fn fixture() -> Fixture {
        let store = get_test_store();
        let project = ProjectStore::create(&store, Project::new("Home", "home".to_owned())).unwrap();
        let wallet =
            AccountStore::create(&store, Account::new(project.id, "Wallet", Currency::Pln))
                .unwrap();
        let state = CreateTransactionsState {
            db_connection: store.connection(),
            local_timezone: "Etc/UTC".to_owned(),
            service_config: ServiceConfig::for_tests(),
        };

        Fixture {
            store,
            state,
            project,
            wallet,
        }
    }

    fn form(rows: &[(&str, &str, &str, String)]) -> CreateTransactionsForm {
        CreateTransactionsForm {
            name: rows.iter().map(|row| row.0.to_owned()).collect(),
            value: rows.iter().map(|row| row.1.to_owned()).collect(),
            transaction_type: rows.iter().map(|row| row.2.to_owned()).collect(),
            account_id: rows.iter().map(|row| row.3.clone()).collect(),
            date: rows.iter().map(|_| String::new()).collect(),
        }
    }

    #[tokio::test]
    async fn page_shows_form_with_account_options() {
        let fixture = fixture();

        let response = get_create_transactions_page(
            State(fixture.state.clone()),
            Extension(fixture.project.clone()),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, "/home/transactions/create", "hx-post");
        assert_form_submit_button(&form);

        let value_inputs = form
            .select(&Selector::parse("input[name='value']").unwrap())
            .count();
        assert_eq!(value_inputs, ROW_COUNT);

        let wallet_id = fixture.wallet.id.to_string();
        let account_options = form
            .select(&Selector::parse("select[name='account_id'] option").unwrap())
            .filter(|option| option.value().attr("value") == Some(wallet_id.as_str()))
            .count();
        assert_eq!(account_options, ROW_COUNT);
    }

    #[tokio::test]
    async fn page_without_accounts_links_to_account_creation() {
        let store = get_test_store();
        let project = ProjectStore::create(&store, Project::new("Empty", "empty".to_owned())).unwrap();
        let state = CreateTransactionsState {
            db_connection: store.connection(),
            local_timezone: "Etc/UTC".to_owned(),
            service_config: ServiceConfig::for_tests(),
        };

        let response = get_create_transactions_page(State(state), Extension(project))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(document.select(&Selector::parse("form").unwrap()).count(), 0);
        assert_eq!(
            document
                .select(&Selector::parse("a[href='/empty/accounts/create']").unwrap())
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn creates_group_and_redirects() {
        let fixture = fixture();
        let wallet_id = fixture.wallet.id.to_string();

        let response = create_transactions_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.project.clone()),
            Form(form(&[
                ("Salary", "1000", "top-up", wallet_id.clone()),
                ("", "", "debit", wallet_id.clone()),
                ("Rent", "400", "debit", wallet_id.clone()),
            ])),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/home/dashboard?success=transactions_created");

        let created = fixture
            .store
            .get_transactions_with_filters(&TransactionQuery::for_project(fixture.project.id))
            .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created[0].group_id.is_some());
        assert_eq!(created[0].group_id, created[1].group_id);
        assert!(
            created
                .iter()
                .any(|transaction| transaction.name == "Salary"
                    && transaction.transaction_type == TransactionType::TopUp)
        );
    }

    #[tokio::test]
    async fn empty_form_shows_error() {
        let fixture = fixture();

        let response = create_transactions_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.project.clone()),
            Form(CreateTransactionsForm::default()),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(&form, NO_TRANSACTIONS_ERROR_MSG);
    }

    #[tokio::test]
    async fn invalid_row_keeps_entered_values() {
        let fixture = fixture();
        let wallet_id = fixture.wallet.id.to_string();

        let response = create_transactions_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.project.clone()),
            Form(form(&[("Lunch", "-3", "debit", wallet_id)])),
        )
        .await
        .unwrap();

        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(
            &form,
            "Failed to create transactions: value must be positive",
        );
        let name = form
            .select(&Selector::parse("input[name='name']").unwrap())
            .next()
            .unwrap();
        assert_eq!(name.value().attr("value"), Some("Lunch"));
        assert!(
            fixture
                .store
                .get_transactions_with_filters(&TransactionQuery::for_project(fixture.project.id))
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn rejects_account_of_other_project() {
        let fixture = fixture();
        let other =
            ProjectStore::create(&fixture.store, Project::new("Other", "other".to_owned()))
                .unwrap();
        let foreign =
            AccountStore::create(&fixture.store, Account::new(other.id, "Bank", Currency::Usd))
                .unwrap();

        let response = create_transactions_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.project.clone()),
            Form(form(&[("Coffee", "3", "debit", foreign.id.to_string())])),
        )
        .await
        .unwrap();

        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(
            &form,
            "Failed to create transactions: account does not belong to the specified project",
        );
    }
}
