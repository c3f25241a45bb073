//! Date-time storage and parsing.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::Error;

/// Fixed width UTC format used in the database, e.g. "2024-03-01T09:30:00.000000000Z".
///
/// Every stored value has the same width and offset, so comparing the text
/// in SQL gives the same order as comparing the date-times.
const STORAGE_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
);

/// Formats accepted for date-times typed in by a user, tried in order.
const DATE_TIME_INPUT_FORMATS: &[&[BorrowedFormatItem]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
];

/// Date-only formats accepted from a user, interpreted as midnight.
const DATE_INPUT_FORMATS: &[&[BorrowedFormatItem]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[year]/[month]/[day]"),
];

/// Format used when displaying a date-time.
pub const DISPLAY_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Wraps an [OffsetDateTime] so that it is stored in [STORAGE_FORMAT].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredDateTime(pub OffsetDateTime);

impl ToSql for StoredDateTime {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0
            .to_offset(UtcOffset::UTC)
            .format(STORAGE_FORMAT)
            .map(ToSqlOutput::from)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
    }
}

impl FromSql for StoredDateTime {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        PrimitiveDateTime::parse(value.as_str()?, STORAGE_FORMAT)
            .map(|date_time| StoredDateTime(date_time.assume_utc()))
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Parse a date-time typed in by a user as UTC.
///
/// Accepts "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DDTHH:MM:SS", "YYYY-MM-DD HH:MM",
/// "YYYY-MM-DDTHH:MM", "YYYY/MM/DD HH:MM:SS" and the date-only formats
/// "YYYY-MM-DD" and "YYYY/MM/DD", which give midnight.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `text` matches none of the formats.
pub fn parse_date_time(text: &str) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    for format in DATE_TIME_INPUT_FORMATS {
        if let Ok(date_time) = PrimitiveDateTime::parse(text, format) {
            return Ok(date_time.assume_utc());
        }
    }

    for format in DATE_INPUT_FORMATS {
        if let Ok(date) = Date::parse(text, format) {
            return Ok(date.midnight().assume_utc());
        }
    }

    Err(Error::InvalidDate(text.to_owned()))
}

/// Format `date_time` for display in the given offset.
pub fn display_date_time(date_time: OffsetDateTime, offset: UtcOffset) -> String {
    date_time
        .to_offset(offset)
        .format(DISPLAY_FORMAT)
        .unwrap_or_else(|_| date_time.to_string())
}
