//! Application router configuration with public and protected project routes.

use axum::{
    Extension, Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::PrivateCookieJar;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{create_account_endpoint, get_create_account_page},
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_token_from_cookies,
        post_log_in, project_guard, require_write_access,
    },
    dashboard::get_dashboard_page,
    endpoints::{self, format_endpoint},
    not_found::get_404_not_found,
    project::Project,
    transaction::{
        create_transactions_endpoint, delete_transaction_endpoint, get_create_transactions_page,
    },
};

/// Return a router with all the app's routes.
///
/// Every route lives under a project slug. Unknown projects get a 404 page
/// before any other middleware runs.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route(endpoints::PROJECT_ROOT, get(get_project_root))
        .route(
            endpoints::LOG_IN_VIEW,
            get(get_log_in_page).post(post_log_in),
        )
        .route(endpoints::LOG_OUT, get(get_log_out));

    let read_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let write_pages = Router::new()
        .route(
            endpoints::NEW_TRANSACTIONS_VIEW,
            get(get_create_transactions_page),
        )
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_create_account_page))
        .route_layer(middleware::from_fn(require_write_access))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let write_endpoints = Router::new()
        .route(
            endpoints::NEW_TRANSACTIONS_VIEW,
            post(create_transactions_endpoint),
        )
        .route(endpoints::NEW_ACCOUNT_VIEW, post(create_account_endpoint))
        .route(
            endpoints::DELETE_TRANSACTION,
            post(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn(require_write_access))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    public_routes
        .merge(read_routes)
        .merge(write_pages)
        .merge(write_endpoints)
        .route_layer(middleware::from_fn_with_state(state.clone(), project_guard))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The project root redirects to the dashboard when logged in to the project,
/// otherwise to the log-in page.
async fn get_project_root(
    jar: PrivateCookieJar,
    Extension(project): Extension<Project>,
) -> Redirect {
    match get_token_from_cookies(&jar) {
        Ok(token) if token.project_id == project.id => {
            Redirect::to(&format_endpoint(endpoints::DASHBOARD_VIEW, &[&project.slug]))
        }
        _ => Redirect::to(&format_endpoint(endpoints::LOG_IN_VIEW, &[&project.slug])),
    }
}
