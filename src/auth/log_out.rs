//! Log-out route handler that invalidates the session cookie and redirects to the log-in page.

use axum::{
    Extension,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth::cookie::invalidate_auth_cookie,
    endpoints::{self, format_endpoint},
    project::Project,
};

/// Invalidate the session cookie and redirect the client to the project's log-in page.
pub async fn get_log_out(
    jar: PrivateCookieJar,
    Extension(project): Extension<Project>,
) -> Response {
    let jar = invalidate_auth_cookie(jar);
    tracing::debug!("Logged out of project {}", project.slug);

    (
        jar,
        Redirect::to(&format_endpoint(endpoints::LOG_IN_VIEW, &[&project.slug])),
    )
        .into_response()
}
