//! Timestamp utilities
//!
//! Daily quota windows are computed in UTC so that every instance of the
//! service agrees on when counters reset.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Calendar day (UTC) containing `at`
pub fn day_of(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// First instant of the UTC day following `at`
///
/// Used as the `resetsAt` value of quota information.
pub fn next_utc_midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = at.date_naive() + Duration::days(1);
    tomorrow
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(at + Duration::days(1))
}
