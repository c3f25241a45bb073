//! Calendar windows used to filter transactions by year and month.

use time::{Date, Month, OffsetDateTime};

use crate::Error;

/// An inclusive range of instants in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// The first instant in the window.
    pub start: OffsetDateTime,
    /// The last instant in the window.
    pub end: OffsetDateTime,
}

impl DateWindow {
    /// The window for a calendar year, or a single month of it.
    ///
    /// A `month` of `None` or `Some(0)` gives January 1st 00:00:00 through
    /// December 31st 23:59:59.999999999. A month from 1 to 12 gives the first
    /// through the last instant of that month.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] for a month above 12 and
    /// [Error::InvalidYear] for a year that cannot be represented.
    pub fn for_period(year: i32, month: Option<u8>) -> Result<Self, Error> {
        let (first_month, last_month) = match month {
            None | Some(0) => (Month::January, Month::December),
            Some(month) => {
                let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;
                (month, month)
            }
        };

        let start = Date::from_calendar_date(year, first_month, 1)
            .map_err(|_| Error::InvalidYear(year))?;
        let end = Date::from_calendar_date(year, last_month, last_day_of_month(year, last_month))
            .map_err(|_| Error::InvalidYear(year))?;

        Ok(Self {
            start: start.midnight().assume_utc(),
            end: end
                .with_hms_nano(23, 59, 59, 999_999_999)
                .map_err(|_| Error::InvalidYear(year))?
                .assume_utc(),
        })
    }

    /// Whether `date_time` falls within the window.
    pub fn contains(&self, date_time: OffsetDateTime) -> bool {
        self.start <= date_time && date_time <= self.end
    }
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if time::util::is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}
