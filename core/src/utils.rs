//! Utility functions and types.

use std::fmt::Debug;

use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

/// Characters left as-is by [`uri_encode`]: `A-Z a-z 0-9 - . _ ~`.
pub const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Same as [`UNRESERVED`] but keeps `/` for object paths.
pub const UNRESERVED_PATH: &AsciiSet = &UNRESERVED.remove(b'/');

/// Percent-encode every byte outside the unreserved set with upper-case hex.
///
/// Set `keep_slash` to leave `/` untouched, which is how object keys are
/// placed into paths.
pub fn uri_encode(s: &str, keep_slash: bool) -> String {
    if keep_slash {
        utf8_percent_encode(s, UNRESERVED_PATH).to_string()
    } else {
        utf8_percent_encode(s, UNRESERVED).to_string()
    }
}

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - Inputs shorter than 12 characters are fully redacted.
/// - Longer inputs keep their first three and last three characters.
///
/// Secrets stay distinguishable in logs without leaking.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or_default())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 || !self.0.is_char_boundary(3) || !self.0.is_char_boundary(length - 3) {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}
