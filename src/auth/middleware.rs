//! Middleware that resolves the project in the URL, checks the session cookie and
//! enforces write access.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, FromRequestParts, Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    access::Access,
    auth::cookie::{get_token_from_cookies, invalidate_auth_cookie},
    endpoints::{self, format_endpoint},
    html::error_view,
    project::Project,
    stores::{AccessStore, ProjectStore, SQLiteStore},
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up projects and accesses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that loads the project named by the `project_slug`
/// path parameter.
///
/// The project is placed into the request extensions, otherwise a 404 page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(project): Extension<Project>` to receive the project.
pub async fn project_guard(
    State(state): State<AuthState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(project_slug) = params.get("project_slug") else {
        tracing::error!("project_guard used on a route without a project_slug parameter");
        return Error::ProjectNotFound.into_response();
    };

    let store = SQLiteStore::new(state.db_connection);
    let project = match store.get_by_slug(project_slug) {
        Ok(project) => project,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(project);
    next.run(request).await
}

/// Check the session token in `jar` against `project` and return the access it belongs to.
fn authenticate_session(
    jar: &PrivateCookieJar,
    project: &Project,
    accesses: &impl AccessStore,
) -> Result<Access, Error> {
    let token = get_token_from_cookies(jar)?;

    if token.project_id != project.id {
        tracing::debug!("Session token is for a different project than {}", project.slug);
        return Err(Error::InvalidSessionToken);
    }

    let access = accesses
        .get_by_id(token.access_id)
        .map_err(|error| match error {
            Error::AccessNotFound => Error::InvalidSessionToken,
            error => error,
        })?;

    if access.project_id != project.id {
        return Err(Error::InvalidSessionToken);
    }

    Ok(access)
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    project: Project,
    request: Request,
    next: Next,
    get_redirect: impl Fn(PrivateCookieJar, String) -> Response,
) -> Response {
    let log_in_url = format_endpoint(endpoints::LOG_IN_VIEW, &[&project.slug]);

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return Redirect::to(&log_in_url).into_response();
        }
    };

    let store = SQLiteStore::new(state.db_connection.clone());
    let access = match authenticate_session(&jar, &project, &store) {
        Ok(access) => access,
        Err(Error::CookieMissing) => return get_redirect(jar, log_in_url),
        Err(Error::InvalidSessionToken) => {
            return get_redirect(invalidate_auth_cookie(jar), log_in_url);
        }
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(access);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

/// Middleware function that checks for a valid session cookie for the project in the request extensions.
/// The access is placed into request and then the request executed normally if the cookie is valid, otherwise a redirect to the log-in page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(access): Extension<Access>` to receive the access.
///
/// **Note**: Must run after [project_guard].
pub async fn auth_guard(
    State(state): State<AuthState>,
    Extension(project): Extension<Project>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, project, request, next, |jar, redirect_url| {
        (jar, Redirect::to(&redirect_url)).into_response()
    })
    .await
}

/// Middleware function that checks for a valid session cookie for the project in the request extensions.
/// The access is placed into request and then the request executed normally if the cookie is valid, otherwise a HTMX redirect to the log-in page is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(access): Extension<Access>` to receive the access.
///
/// **Note**: Must run after [project_guard].
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    Extension(project): Extension<Project>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, project, request, next, |jar, redirect_url| {
        (jar, HxRedirect(redirect_url), StatusCode::OK).into_response()
    })
    .await
}

/// Middleware function that rejects read-only accesses with 403 Forbidden.
///
/// **Note**: Must run after [auth_guard] or [auth_guard_hx].
pub async fn require_write_access(
    Extension(access): Extension<Access>,
    request: Request,
    next: Next,
) -> Response {
    if access.readonly {
        tracing::info!("Read-only access {} tried to modify the project", access.id);
        return (
            StatusCode::FORBIDDEN,
            Html(
                error_view(
                    "Forbidden",
                    "403",
                    "Read-only access",
                    "Your access can view this project but not change it.",
                )
                .into_string(),
            ),
        )
            .into_response();
    }

    next.run(request).await
}
