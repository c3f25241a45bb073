//! The project dashboard: account balances, currency totals and the
//! transactions of a month or a whole year.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Month, OffsetDateTime, UtcOffset};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    access::Access,
    balance::{AccountSummary, CurrencyTotal, get_project_balances_from_transactions},
    database_id::AccountId,
    datetime::display_date_time,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
        project_header, success_banner,
    },
    project::Project,
    stores::SQLiteStore,
    timezone::get_local_offset,
    transaction::{Transaction, get_project_transactions},
};

/// How many years either side of the current year the dashboard may show.
const MAX_YEAR_DISTANCE: i32 = 10;

/// Transaction names longer than this many graphemes are cut short in the table.
const MAX_NAME_GRAPHEMES: usize = 32;

const AMOUNT_POSITIVE_STYLE: &str = "text-green-600 dark:text-green-400";
const AMOUNT_NEGATIVE_STYLE: &str = "text-red-600 dark:text-red-400";

/// A message shown on the dashboard after a redirect from a completed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessMessage {
    /// The user just logged in.
    LoginSuccessful,
    /// A group of transactions was recorded.
    TransactionsCreated,
    /// A new account was added to the project.
    AccountCreated,
}

impl SuccessMessage {
    /// The value of the `success` query parameter for this message.
    pub fn as_query_value(self) -> &'static str {
        match self {
            SuccessMessage::LoginSuccessful => "login_successful",
            SuccessMessage::TransactionsCreated => "transactions_created",
            SuccessMessage::AccountCreated => "account_created",
        }
    }

    /// The text shown to the user.
    pub fn text(self) -> &'static str {
        match self {
            SuccessMessage::LoginSuccessful => "Login successful!",
            SuccessMessage::TransactionsCreated => "Transactions created successfully!",
            SuccessMessage::AccountCreated => "Account created successfully!",
        }
    }

    fn from_query_value(value: &str) -> Option<Self> {
        [
            SuccessMessage::LoginSuccessful,
            SuccessMessage::TransactionsCreated,
            SuccessMessage::AccountCreated,
        ]
        .into_iter()
        .find(|message| message.as_query_value() == value)
    }
}

/// The URL of a project's dashboard that displays `message`.
pub fn dashboard_url_with_success(project_slug: &str, message: SuccessMessage) -> String {
    format!(
        "{}?success={}",
        format_endpoint(endpoints::DASHBOARD_VIEW, &[project_slug]),
        message.as_query_value()
    )
}

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading accounts and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/Warsaw".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string of the dashboard page.
///
/// The fields are kept as strings so that malformed values fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// The year to show, defaults to the current year.
    pub year: Option<String>,
    /// The month to show from 1 to 12, or 0 for the whole year. Defaults to the current month.
    pub month: Option<String>,
    /// The query value of a [SuccessMessage].
    pub success: Option<String>,
}

/// Parse the requested year, falling back to `current_year` when it is
/// missing, malformed or more than [MAX_YEAR_DISTANCE] years away.
fn resolve_year(raw: Option<&str>, current_year: i32) -> i32 {
    raw.and_then(|year| year.trim().parse::<i32>().ok())
        .filter(|year| (year - current_year).abs() <= MAX_YEAR_DISTANCE)
        .unwrap_or(current_year)
}

/// Parse the requested month, falling back to `current_month` when it is
/// missing, malformed or above 12. Zero selects the whole year.
fn resolve_month(raw: Option<&str>, current_month: u8) -> u8 {
    raw.and_then(|month| month.trim().parse::<u8>().ok())
        .filter(|month| *month <= 12)
        .unwrap_or(current_month)
}

fn amount_style(amount: f64) -> &'static str {
    if amount >= 0.0 {
        AMOUNT_POSITIVE_STYLE
    } else {
        AMOUNT_NEGATIVE_STYLE
    }
}

/// Returns the name to display and, if it had to be cut short, the full name.
fn shorten_name(name: &str) -> (String, Option<&str>) {
    if name.graphemes(true).count() <= MAX_NAME_GRAPHEMES {
        return (name.to_owned(), None);
    }

    let truncated: String = name.graphemes(true).take(MAX_NAME_GRAPHEMES - 3).collect();
    (truncated + "...", Some(name))
}

fn period_label(year: i32, month: u8) -> String {
    match Month::try_from(month) {
        Ok(month) => format!("{month} {year}"),
        Err(_) => year.to_string(),
    }
}

fn period_form(dashboard_url: &str, year: i32, month: u8) -> Markup {
    html! {
        form method="get" action=(dashboard_url) class="flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                select name="month" id="month" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="0" selected[month == 0] { "Whole year" }
                    @for number in 1..=12u8 {
                        @if let Ok(name) = Month::try_from(number) {
                            option value=(number) selected[month == number] { (name) }
                        }
                    }
                }
            }

            div
            {
                label for="year" class=(FORM_LABEL_STYLE) { "Year" }
                input
                    type="number"
                    name="year"
                    id="year"
                    value=(year)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class="px-4 py-2 bg-blue-500 text-white rounded hover:bg-blue-600"
            {
                "Show"
            }
        }
    }
}

fn balances_table(
    account_balances: &[AccountSummary],
    currency_totals: &[CurrencyTotal],
) -> Markup {
    html! {
        section class="w-full max-w-4xl mb-8"
        {
            h2 class="text-xl font-semibold mb-4" { "Balances" }

            @if account_balances.is_empty() {
                p { "This project has no accounts yet." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table id="balances" class="w-full text-sm text-left"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Currency" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                            }
                        }

                        tbody
                        {
                            @for summary in account_balances {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (summary.name) }
                                    td class=(TABLE_CELL_STYLE) { (summary.currency.code()) }
                                    td class={(TABLE_CELL_STYLE) " " (amount_style(summary.balance))}
                                    {
                                        (format_currency(summary.balance, summary.currency))
                                    }
                                }
                            }
                        }
                    }
                }

                ul id="currency-totals" class="mt-4 space-y-1"
                {
                    @for total in currency_totals {
                        li
                        {
                            span class="font-semibold" { "Total " (total.currency.code()) ": " }
                            span class=(amount_style(total.balance))
                            {
                                (format_currency(total.balance, total.currency))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transactions_table(
    transactions: &[Transaction],
    accounts: &HashMap<AccountId, &AccountSummary>,
    project_slug: &str,
    local_offset: UtcOffset,
    can_delete: bool,
) -> Markup {
    html! {
        section class="w-full max-w-4xl"
        {
            h2 class="text-xl font-semibold mb-4" { "Transactions" }

            @if transactions.is_empty() {
                p { "No transactions in this period." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table id="transactions" class="w-full text-sm text-left"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                @if can_delete {
                                    th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                                }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                @let account = accounts.get(&transaction.account_id);
                                @let amount = transaction.signed_value();

                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (display_date_time(transaction.transaction_date, local_offset))
                                    }
                                    @let (name, full_name) = shorten_name(&transaction.name);
                                    td class=(TABLE_CELL_STYLE) title=[full_name] { (name) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if let Some(account) = account { (account.name) }
                                    }
                                    td class={(TABLE_CELL_STYLE) " " (amount_style(amount))}
                                    {
                                        @match account {
                                            Some(account) => {
                                                (format_currency(amount, account.currency))
                                            }
                                            None => {
                                                (format!("{amount:.2}"))
                                            }
                                        }
                                    }
                                    @if can_delete {
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            button
                                                hx-post=(format_endpoint(
                                                    endpoints::DELETE_TRANSACTION,
                                                    &[project_slug, &transaction.id.to_string()],
                                                ))
                                                hx-confirm={"Delete the transaction '" (transaction.name) "'?"}
                                                class=(BUTTON_DELETE_STYLE)
                                            {
                                                "Delete"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Display the balances and transactions of a project for a month or a year.
///
/// Readonly accesses see the same data without the links and buttons that
/// change it.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(project): Extension<Project>,
    Extension(access): Extension<Access>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();
    let year = resolve_year(query.year.as_deref(), today.year());
    let month = resolve_month(query.month.as_deref(), u8::from(today.month()));
    let success = query
        .success
        .as_deref()
        .and_then(SuccessMessage::from_query_value);

    let store = SQLiteStore::new(state.db_connection);
    let transactions = get_project_transactions(project.id, year, month, &store)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
    let summary = get_project_balances_from_transactions(project.id, &transactions, &store)
        .inspect_err(|error| tracing::error!("could not get balances: {error}"))?;

    let accounts: HashMap<AccountId, &AccountSummary> = summary
        .account_balances
        .iter()
        .map(|account| (account.account_id, account))
        .collect();

    let dashboard_url = format_endpoint(endpoints::DASHBOARD_VIEW, &[&project.slug]);
    let new_transactions_url = format_endpoint(endpoints::NEW_TRANSACTIONS_VIEW, &[&project.slug]);
    let new_account_url = format_endpoint(endpoints::NEW_ACCOUNT_VIEW, &[&project.slug]);
    let log_out_url = format_endpoint(endpoints::LOG_OUT, &[&project.slug]);

    let mut links = Vec::new();
    if !access.readonly {
        links.push((new_transactions_url.as_str(), "New transactions"));
        links.push((new_account_url.as_str(), "New account"));
    }
    links.push((log_out_url.as_str(), "Log out"));

    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            (project_header(&project.name, &links))

            @if let Some(success) = success {
                (success_banner(success.text()))
            }

            (period_form(&dashboard_url, year, month))

            h2 class="text-lg mb-4" { (period_label(year, month)) }

            (balances_table(&summary.account_balances, &summary.currency_totals))
            (transactions_table(&transactions, &accounts, &project.slug, local_offset, !access.readonly))
        }
    };

    Ok(base("Dashboard", &content).into_response())
}
