//! Helpers for working with the server's configured timezone.

use time::{Date, OffsetDateTime, PrimitiveDateTime};
use time_tz::{OffsetDateTimeExt, OffsetResult, PrimitiveDateTimeExt, Tz};

use crate::Error;

/// Look up a canonical timezone, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns an [Error::InvalidTimezoneError] if the timezone is not known.
pub fn get_timezone(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}

/// Get today's date in the timezone `canonical_timezone`.
///
/// # Errors
///
/// Returns an [Error::InvalidTimezoneError] if the timezone is not known.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let timezone = get_timezone(canonical_timezone)?;

    Ok(OffsetDateTime::now_utc().to_timezone(timezone).date())
}

/// The calendar date of `date_time` in `timezone`, using the offset in effect
/// at that instant.
pub fn local_date(date_time: OffsetDateTime, timezone: &Tz) -> Date {
    date_time.to_timezone(timezone).date()
}

/// Attach the offset that `timezone` uses on `date_time`'s date.
///
/// An ambiguous local time takes the earlier offset. A local time skipped by
/// a DST change takes the offset in effect at the same UTC wall time.
pub fn assume_local(date_time: PrimitiveDateTime, timezone: &Tz) -> OffsetDateTime {
    match date_time.assume_timezone(timezone) {
        OffsetResult::Some(local) | OffsetResult::Ambiguous(local, _) => local,
        OffsetResult::None => date_time.assume_timezone_utc(timezone),
    }
}

#[cfg(test)]
mod timezone_tests {
    use time::macros::{date, datetime};

    use crate::{
        Error,
        timezone::{assume_local, get_timezone, local_date, local_today},
    };

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            get_timezone("Middle/Earth").err(),
            Some(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }

    #[test]
    fn local_today_fails_on_unknown_timezone() {
        assert_eq!(
            local_today("Middle/Earth"),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }

    #[test]
    fn local_date_uses_offset_of_that_instant() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        // NZDT (+13) applies in January and NZST (+12) in July.
        assert_eq!(
            local_date(datetime!(2024-12-31 11:30 UTC), auckland),
            date!(2025 - 01 - 01)
        );
        assert_eq!(
            local_date(datetime!(2025-06-30 11:30 UTC), auckland),
            date!(2025 - 06 - 30)
        );
    }

    #[test]
    fn assume_local_uses_offset_of_that_date() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        assert_eq!(
            assume_local(datetime!(2025-01-01 00:00), auckland),
            datetime!(2025-01-01 00:00 +13:00)
        );
        assert_eq!(
            assume_local(datetime!(2025-07-01 00:00), auckland),
            datetime!(2025-07-01 00:00 +12:00)
        );
    }
}
