//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Request and response bodies longer than this many characters are truncated
/// in `info` logs and logged in full at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level. The PIN
/// digits of submitted log-in forms are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/x-www-form-urlencoded"));

    if parts.method == Method::POST && is_form {
        log_request(&parts, &redact_pin(&body_text));
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

fn is_pin_field(name: &str) -> bool {
    name.strip_prefix("pin_")
        .is_some_and(|index| !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()))
}

/// Replace the values of the `pin_N` fields in a URL encoded form.
///
/// Text that cannot be parsed as a form is returned fully redacted.
fn redact_pin(form_text: &str) -> String {
    let Ok(fields) = serde_urlencoded::from_str::<Vec<(String, String)>>(form_text) else {
        return REDACTED.to_owned();
    };

    let fields: Vec<(String, String)> = fields
        .into_iter()
        .map(|(name, value)| {
            if is_pin_field(&name) {
                (name, REDACTED.to_owned())
            } else {
                (name, value)
            }
        })
        .collect();

    serde_urlencoded::to_string(&fields).unwrap_or_else(|_| REDACTED.to_owned())
}

fn truncate(body: &str) -> Option<String> {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        Some(body.chars().take(LOG_BODY_LENGTH_LIMIT).collect())
    } else {
        None
    }
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::post};
    use axum_test::TestServer;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_pin, truncate};

    #[test]
    fn redacts_every_pin_digit() {
        let form = "uid_0=4&uid_1=2&pin_0=1&pin_1=2&pin_7=8";

        assert_eq!(
            redact_pin(form),
            "uid_0=4&uid_1=2&pin_0=********&pin_1=********&pin_7=********"
        );
    }

    #[test]
    fn leaves_other_fields_alone() {
        let form = "name=Rent&value=400&pinned=yes";

        assert_eq!(redact_pin(form), form);
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        let body = "ł".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        assert_eq!(truncate(&body), Some("ł".repeat(LOG_BODY_LENGTH_LIMIT)));
        assert_eq!(truncate("short"), None);
    }

    #[tokio::test]
    async fn passes_body_through_unchanged() {
        async fn echo(body: String) -> String {
            body
        }

        let app = Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/echo")
            .form(&[("pin_0", "1"), ("name", "Coffee")])
            .await;

        response.assert_status(StatusCode::OK);
        response.assert_text("pin_0=1&name=Coffee");
    }
}
