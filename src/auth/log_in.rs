//! The log-in page and form handler for numeric UID and PIN credentials.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    access::{
        authenticate,
        pin::{PIN_LENGTH, UID_LENGTH},
    },
    auth::cookie::{get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie},
    dashboard::{SuccessMessage, dashboard_url_with_success},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, base, loading_spinner,
        log_in_card,
    },
    project::Project,
    stores::SQLiteStore,
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up accesses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

const DIGIT_INPUT_STYLE: &str = "w-10 h-12 p-0 text-center text-lg rounded \
    text-gray-900 dark:text-white bg-gray-50 dark:bg-gray-700 \
    border border-gray-300 dark:border-gray-600 focus:ring-blue-600 \
    focus:border-blue-600";

fn digit_inputs(prefix: &str, count: usize, autofocus: bool) -> Markup {
    html! {
        div class="flex gap-2"
        {
            @for index in 0..count
            {
                input
                    type="password"
                    inputmode="numeric"
                    name=(format!("{prefix}_{index}"))
                    id=(format!("{prefix}_{index}"))
                    maxlength="1"
                    pattern="[0-9]"
                    autocomplete="off"
                    class=(DIGIT_INPUT_STYLE)
                    required
                    autofocus[autofocus && index == 0];
            }
        }
    }
}

fn log_in_form(log_in_route: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(log_in_route)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="uid_0" class=(FORM_LABEL_STYLE) { "UID" }
                (digit_inputs("uid", UID_LENGTH, true))
            }

            div
            {
                label for="pin_0" class=(FORM_LABEL_STYLE) { "PIN" }
                (digit_inputs("pin", PIN_LENGTH, false))
            }

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="htmx-indicator" { (loading_spinner()) }
                "Log in"
            }
        }
    }
}

fn log_in_view(project: &Project) -> Markup {
    let log_in_route = format_endpoint(endpoints::LOG_IN_VIEW, &[&project.slug]);
    let content = log_in_card(&project.name, "Log in", &log_in_form(&log_in_route, None));

    base("Log in", &content)
}

/// Display the log-in page, or go straight to the dashboard if already logged in to the project.
pub async fn get_log_in_page(
    jar: PrivateCookieJar,
    Extension(project): Extension<Project>,
) -> Response {
    match get_token_from_cookies(&jar) {
        Ok(token) if token.project_id == project.id => Redirect::to(&dashboard_url_with_success(
            &project.slug,
            SuccessMessage::LoginSuccessful,
        ))
        .into_response(),
        _ => log_in_view(&project).into_response(),
    }
}

/// Join the single digit form fields `{prefix}_0` to `{prefix}_{count - 1}`.
///
/// Returns an empty string if any digit is missing or blank.
fn join_digits(form: &HashMap<String, String>, prefix: &str, count: usize) -> String {
    let mut joined = String::with_capacity(count);

    for index in 0..count {
        match form.get(&format!("{prefix}_{index}")).map(|digit| digit.trim()) {
            Some(digit) if !digit.is_empty() => joined.push_str(digit),
            _ => return String::new(),
        }
    }

    joined
}

pub const INVALID_FORMAT_ERROR_MSG: &str = "Invalid UID or PIN format";
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid credentials";

/// Handler for log-in requests via the POST method.
///
/// The form holds one field per digit: `uid_0` and `uid_1` for the UID and
/// `pin_0` to `pin_7` for the PIN. On a successful log-in the session cookie is
/// set and the client is redirected to the dashboard. Otherwise, the form is
/// returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Extension(project): Extension<Project>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let log_in_route = format_endpoint(endpoints::LOG_IN_VIEW, &[&project.slug]);
    let uid = join_digits(&form, "uid", UID_LENGTH);
    let pin = join_digits(&form, "pin", PIN_LENGTH);

    let store = SQLiteStore::new(state.db_connection);
    let access = match authenticate(project.id, &uid, &pin, &store) {
        Ok(access) => access,
        Err(Error::InvalidCredentialFormat) => {
            return log_in_form(&log_in_route, Some(INVALID_FORMAT_ERROR_MSG)).into_response();
        }
        Err(Error::InvalidCredentials) => {
            tracing::info!("Failed log-in attempt for project {}", project.slug);
            return log_in_form(&log_in_route, Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(
                &log_in_route,
                Some("An internal error occurred. Please try again later."),
            )
            .into_response();
        }
    };

    match set_auth_cookie(jar.clone(), access.id, project.id, state.cookie_duration) {
        Ok(updated_jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(dashboard_url_with_success(
                &project.slug,
                SuccessMessage::LoginSuccessful,
            )),
            updated_jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                invalidate_auth_cookie(jar),
                log_in_form(&log_in_route, Some("Failed to create session")),
            )
                .into_response()
        }
    }
}
