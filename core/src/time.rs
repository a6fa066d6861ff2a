//! Time related utils.
//!
//! All signing times are UTC; formats follow what OSS expects on the wire.

use crate::{Error, Result};
use chrono::Utc;

/// DateTime is the UTC date time used across the workspace.
pub type DateTime = chrono::DateTime<Utc>;

/// Create a date time with current time.
#[inline]
pub fn now() -> DateTime {
    Utc::now()
}

/// Date format: `20220313`
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Basic ISO 8601 format: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// HTTP date format: `Sun, 13 Mar 2022 07:20:04 GMT`
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// RFC 3339 format: `2022-03-13T07:20:04Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a RFC 3339 timestamp like `2022-03-13T07:20:04.000Z`.
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("parse '{s}' into rfc3339 failed")).with_source(e))
}

/// Parse an HTTP date like `Sun, 13 Mar 2022 07:20:04 GMT`.
pub fn parse_http_date(s: &str) -> Result<DateTime> {
    chrono::DateTime::parse_from_rfc2822(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("parse '{s}' into http date failed")).with_source(e))
}
