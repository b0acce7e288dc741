//! Time helpers for the TDB Julian-date parameter used throughout the crate
//!
//! Every time-varying quantity in this crate is evaluated at a `tdb` instant:
//! barycentric dynamical time expressed as a Julian date. The helpers here
//! convert between calendar dates and Julian dates. Sub-second TT/TDB/UTC
//! distinctions are far below the precision any consumer of this core needs,
//! so no delta-T tables or leap-second data are carried.

use crate::constants::{DAY_S, J2000};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Convert a calendar date and time (proleptic Gregorian) to a Julian date.
pub fn julian_date(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> f64 {
    // Fliegel & Van Flandern day-number algorithm.
    let (y, m) = (year as i64, month as i64);
    let a = (14 - m) / 12;
    let y2 = y + 4800 - a;
    let m2 = m + 12 * a - 3;
    let jdn = day as i64 + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - y2 / 100 + y2 / 400 - 32045;
    let day_fraction = (hour as f64 * 3600.0 + minute as f64 * 60.0 + second) / DAY_S;
    jdn as f64 - 0.5 + day_fraction
}

/// Convert a `chrono` UTC timestamp to a Julian date.
pub fn datetime_to_jd(dt: &DateTime<Utc>) -> f64 {
    julian_date(
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second() as f64 + dt.nanosecond() as f64 * 1e-9,
    )
}

/// Days elapsed since the J2000.0 epoch.
pub fn days_since_j2000(tdb: f64) -> f64 {
    tdb - J2000
}

/// Julian date for an offset in days from the J2000.0 epoch.
pub fn j2000_offset(days: f64) -> f64 {
    J2000 + days
}
