//! The paths of every route in the app.
//!
//! Project pages are nested under the project slug. Use [format_endpoint] to
//! fill in the parameters before linking to a route.

/// Redirects to the project dashboard or log-in page.
pub const PROJECT_ROOT: &str = "/{project_slug}";
/// The page and form handler for logging in to a project.
pub const LOG_IN_VIEW: &str = "/{project_slug}/login";
/// Clears the session cookie.
pub const LOG_OUT: &str = "/{project_slug}/logout";
/// The project dashboard with balances and transactions.
pub const DASHBOARD_VIEW: &str = "/{project_slug}/dashboard";
/// The page and form handler for creating a group of transactions.
pub const NEW_TRANSACTIONS_VIEW: &str = "/{project_slug}/transactions/create";
/// Deletes a single transaction.
pub const DELETE_TRANSACTION: &str = "/{project_slug}/transactions/{transaction_id}/delete";
/// The page and form handler for creating an account.
pub const NEW_ACCOUNT_VIEW: &str = "/{project_slug}/accounts/create";
/// Static files such as stylesheets and scripts.
pub const STATIC: &str = "/static";

/// Replace the parameters in `endpoint_path` with `values`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/{project_slug}/login', '{project_slug}'
/// is the parameter.
///
/// Parameters without a matching value are left as is and extra values are
/// ignored.
pub fn format_endpoint(endpoint_path: &str, values: &[&str]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut rest = endpoint_path;
    let mut values = values.iter();

    while let Some(param_start) = rest.find('{') {
        let Some(param_length) = rest[param_start..].find('}') else {
            break;
        };
        let Some(value) = values.next() else {
            break;
        };

        formatted.push_str(&rest[..param_start]);
        formatted.push_str(value);
        rest = &rest[param_start + param_length + 1..];
    }

    formatted.push_str(rest);
    formatted
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::PROJECT_ROOT,
            endpoints::LOG_IN_VIEW,
            endpoints::LOG_OUT,
            endpoints::DASHBOARD_VIEW,
            endpoints::NEW_TRANSACTIONS_VIEW,
            endpoints::DELETE_TRANSACTION,
            endpoints::NEW_ACCOUNT_VIEW,
            endpoints::STATIC,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, &["home", "1"]));
        }
    }

    #[test]
    fn fills_parameters_in_order() {
        let formatted_path = format_endpoint(endpoints::DELETE_TRANSACTION, &["home", "abc"]);

        assert_eq!(formatted_path, "/home/transactions/abc/delete");
        assert_endpoint_is_valid_uri(&formatted_path);
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", &["home"]);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn leaves_parameters_without_values() {
        let formatted_path = format_endpoint(endpoints::DELETE_TRANSACTION, &["home"]);

        assert_eq!(formatted_path, "/home/transactions/{transaction_id}/delete");
    }
}
