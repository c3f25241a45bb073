//! Defines the app level error type and conversions to rendered HTML pages.
use axum::response::{IntoResponse, Response};

use crate::{
    internal_server_error::{InternalServerError, bad_request_response},
    not_found::get_404_not_found_response,
    slug::SlugError,
};

/// The broad category an [Error] falls into.
///
/// Callers use the kind to decide how to report an error, e.g. as a form
/// message, a 404 page or a generic 500 page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied input that can never succeed as given.
    Validation,
    /// A referenced project, account, access or transaction does not exist.
    NotFound,
    /// A unique slug or UID could not be found within the retry limit.
    UniquenessExhausted,
    /// The backing store failed.
    Storage,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A project was created without a name.
    #[error("project name is required")]
    EmptyProjectName,

    /// An account was created without a name.
    #[error("account name is required")]
    EmptyAccountName,

    /// A transaction or access was created without a name.
    #[error("name is required")]
    EmptyName,

    /// A custom project slug failed validation.
    #[error("invalid slug: {0}")]
    InvalidSlug(SlugError),

    /// A custom project slug is already used by another project.
    #[error("slug '{0}' is already taken")]
    SlugTaken(String),

    /// The currency code is not one of the supported currencies.
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    /// The account name is already used by another account in the same project.
    #[error("account with name '{0}' already exists for this project")]
    DuplicateAccountName(String),

    /// A transaction value was zero or negative.
    #[error("value must be positive")]
    NonPositiveValue,

    /// The transaction type is neither debit nor top-up.
    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// The transaction date is further in the past than transactions may be recorded.
    #[error("transaction date cannot be more than 10 years in the past")]
    DateTooFarInPast,

    /// The transaction date is after the current time.
    #[error("transaction date cannot be in the future")]
    FutureDate,

    /// A grouped creation was attempted with no transactions.
    #[error("at least one transaction is required")]
    EmptyTransactionGroup,

    /// A grouped transaction references an account from a different project.
    #[error("account does not belong to the specified project")]
    AccountNotInProject,

    /// A transaction query did not name a project or an account.
    #[error("either project_id or account_id must be provided")]
    MissingQueryScope,

    /// A transaction query named both a project and an account.
    #[error("cannot specify both project_id and account_id")]
    AmbiguousQueryScope,

    /// A transaction query had an end date before its start date.
    #[error("end_date cannot be before start_date")]
    InvalidDateRange,

    /// A month outside 0 to 12 was used to build a date window.
    #[error("invalid month {0}, expected a value from 0 to 12")]
    InvalidMonth(u8),

    /// A year that cannot be represented was used to build a date window.
    #[error("invalid year {0}")]
    InvalidYear(i32),

    /// A date string did not match any of the accepted formats.
    #[error("invalid date \"{0}\"")]
    InvalidDate(String),

    /// A string could not be parsed as an ID.
    #[error("invalid ID \"{0}\"")]
    InvalidId(String),

    /// A log-in attempt used a UID or PIN with the wrong number of digits.
    #[error("invalid UID or PIN format")]
    InvalidCredentialFormat,

    /// The UID or PIN did not match any access for the project.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// The session cookie could not be decoded or has expired.
    #[error("the session token is invalid or has expired")]
    InvalidSessionToken,

    /// No project exists with the given slug or ID.
    #[error("project not found")]
    ProjectNotFound,

    /// No account exists with the given ID.
    #[error("account not found")]
    AccountNotFound,

    /// No transaction exists with the given ID.
    #[error("transaction not found")]
    TransactionNotFound,

    /// No access exists with the given ID or UID.
    #[error("access not found")]
    AccessNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    /// Services translate it into one of the specific not found variants.
    #[error("the requested resource could not be found")]
    NotFound,

    /// No free project slug was found within the retry limit.
    #[error("unable to generate unique slug after {0} attempts")]
    SlugAttemptsExhausted(u32),

    /// No free access UID was found within the retry limit.
    #[error("unable to generate unique UID after {0} attempts")]
    UidAttemptsExhausted(u32),

    /// A row with the same unique key already exists.
    #[error("a record with the same unique key already exists")]
    DuplicateEntry,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl Error {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ProjectNotFound
            | Error::AccountNotFound
            | Error::TransactionNotFound
            | Error::AccessNotFound
            | Error::NotFound => ErrorKind::NotFound,
            Error::SlugAttemptsExhausted(_) | Error::UidAttemptsExhausted(_) => {
                ErrorKind::UniquenessExhausted
            }
            Error::DuplicateEntry
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::HashingError(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_) => ErrorKind::Storage,
            _ => ErrorKind::Validation,
        }
    }

    /// Replace the generic [Error::NotFound] produced by a store with `specific`.
    pub(crate) fn or_not_found(self, specific: Error) -> Error {
        match self {
            Error::NotFound => specific,
            error => error,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed, 1555 for a PRIMARY KEY.
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == 2067 || sql_error.extended_code == 1555 =>
            {
                Error::DuplicateEntry
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::NotFound => get_404_not_found_response(),
            ErrorKind::Validation => bad_request_response(&self.to_string()),
            ErrorKind::UniquenessExhausted | ErrorKind::Storage => match self {
                Error::InvalidTimezoneError(timezone) => InternalServerError {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                }
                .into_response(),
                Error::DatabaseLockError => InternalServerError::default().into_response(),
                // Any errors that are not handled above are not intended to be shown to the client.
                error => {
                    tracing::error!("An unexpected error occurred: {}", error);
                    InternalServerError::default().into_response()
                }
            },
        }
    }
}
