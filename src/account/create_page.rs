//! The page and form handler for adding an account to a project.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    account::create_account,
    currency::Currency,
    dashboard::{SuccessMessage, dashboard_url_with_success},
    endpoints::{self, format_endpoint},
    error::ErrorKind,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner, project_header,
    },
    project::Project,
    stores::SQLiteStore,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for storing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The fields of the create account form.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountForm {
    /// The name of the new account.
    pub name: String,
    /// The currency code, e.g. "PLN".
    pub currency: String,
}

fn create_account_form(
    create_route: &str,
    form: Option<&AccountForm>,
    error_message: Option<&str>,
) -> Markup {
    let name = form.map(|form| form.name.as_str()).unwrap_or_default();
    let selected_currency = form.map(|form| form.currency.as_str()).unwrap_or_default();

    html! {
        form
            hx-post=(create_route)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                input
                    type="text"
                    name="name"
                    id="name"
                    value=(name)
                    placeholder="Savings"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                select name="currency" id="currency" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for currency in Currency::all() {
                        option
                            value=(currency.code())
                            selected[selected_currency.eq_ignore_ascii_case(currency.code())]
                        {
                            (currency.code()) " (" (currency.symbol()) ")"
                        }
                    }
                }
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="htmx-indicator" { (loading_spinner()) }
                "Create account"
            }
        }
    }
}

/// Display the form for adding an account to the project.
pub async fn get_create_account_page(Extension(project): Extension<Project>) -> Response {
    let create_route = format_endpoint(endpoints::NEW_ACCOUNT_VIEW, &[&project.slug]);
    let dashboard_url = format_endpoint(endpoints::DASHBOARD_VIEW, &[&project.slug]);

    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            (project_header(&project.name, &[(dashboard_url.as_str(), "Dashboard")]))

            div class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-xl font-bold mb-4" { "New account" }
                (create_account_form(&create_route, None, None))
            }
        }
    };

    base("New account", &content).into_response()
}

/// Handler for the create account form.
///
/// Redirects to the dashboard on success, otherwise returns the form with an
/// error message.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(project): Extension<Project>,
    Form(form): Form<AccountForm>,
) -> Response {
    let create_route = format_endpoint(endpoints::NEW_ACCOUNT_VIEW, &[&project.slug]);

    let currency: Currency = match form.currency.parse() {
        Ok(currency) => currency,
        Err(error) => {
            return create_account_form(&create_route, Some(&form), Some(&error.to_string()))
                .into_response();
        }
    };

    let store = SQLiteStore::new(state.db_connection);

    match create_account(project.id, &form.name, currency, &store) {
        Ok(_) => (
            StatusCode::SEE_OTHER,
            HxRedirect(dashboard_url_with_success(
                &project.slug,
                SuccessMessage::AccountCreated,
            )),
            (),
        )
            .into_response(),
        Err(error) if error.kind() == ErrorKind::Storage => {
            tracing::error!("Failed to create account: {error}");
            create_account_form(
                &create_route,
                Some(&form),
                Some("An internal error occurred. Please try again later."),
            )
            .into_response()
        }
        Err(error) => {
            create_account_form(&create_route, Some(&form), Some(&error.to_string()))
                .into_response()
        }
    }
}
