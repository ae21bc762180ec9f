//! UTC timestamp helpers
//!
//! Every timestamp this crate produces or parses is in UTC. Inputs without
//! an offset are treated as UTC rather than local time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::fmt::Write;
use thiserror::Error;

/// Default record time format. `%f` stands for the 3-digit millisecond value.
pub const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S.%fZ";

/// Microsecond-precision format used by search indexes such as Solr
pub const SOLR_TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Input could not be interpreted as a date
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized date: {input:?}")]
pub struct DateParseError {
    pub input: String,
}

/// Parse `timestr` into a UTC datetime, or return the current time.
///
/// Offsets are converted to UTC; inputs without an offset are taken to be
/// UTC already.
pub fn get_date(timestr: Option<&str>) -> Result<DateTime<Utc>, DateParseError> {
    let Some(input) = timestr.map(str::trim) else {
        return Ok(Utc::now());
    };

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(input, format) {
            return Ok(date.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(date.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }

    Err(DateParseError {
        input: input.to_string(),
    })
}

/// Render `date` with microsecond precision and a trailing `Z`
pub fn date_to_solr_stamp(date: &DateTime<Utc>) -> String {
    date.format(SOLR_TIMESTAMP_FMT).to_string()
}

/// Render a record creation time.
///
/// With a format string, `%f` is replaced by the zero-padded millisecond
/// value before the rest is handed to chrono. Without one (or when the
/// format is not understood) the result is RFC 3339 with milliseconds and
/// a `Z` suffix.
pub fn format_record_time(created: &DateTime<Utc>, datefmt: Option<&str>) -> String {
    let canonical = || created.to_rfc3339_opts(SecondsFormat::Millis, true);
    let Some(datefmt) = datefmt else {
        return canonical();
    };

    // a leap second carries 1000..=1999 ms
    let millis = created.timestamp_subsec_millis().min(999);
    let datefmt = datefmt.replace("%f", &format!("{millis:03}"));
    let mut out = String::new();
    match write!(out, "{}", created.format(&datefmt)) {
        Ok(()) => out,
        Err(_) => canonical(),
    }
}
