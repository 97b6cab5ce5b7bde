//! Bounds-checked scalar conversions.
//!
//! # Responsibilities
//! - Parse base-10 integers into a specific signed/unsigned width
//! - Parse booleans and RFC 3339 timestamps
//!
//! # Design Decisions
//! - Every integer goes through an `i128` intermediate; range checks happen
//!   before narrowing so nothing wraps
//! - A value that does not parse at all is a syntax error, a value that parses
//!   but does not fit is a range error naming the inclusive bounds

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ParseError;

/// A fixed-width integer type the scalar parser can produce.
pub trait Integer: Copy {
    const MIN: i128;
    const MAX: i128;
    const NAME: &'static str;

    /// Narrow a value already checked against `MIN..=MAX`.
    fn from_wide(value: i128) -> Self;
}

macro_rules! integer {
    ($($t:ty),*) => {$(
        impl Integer for $t {
            const MIN: i128 = <$t>::MIN as i128;
            const MAX: i128 = <$t>::MAX as i128;
            const NAME: &'static str = stringify!($t);

            fn from_wide(value: i128) -> Self {
                value as $t
            }
        }
    )*};
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Parse a base-10 integer into `T`, rejecting values outside its range.
pub fn parse_integer<T: Integer>(s: &str) -> Result<T, ParseError> {
    let wide: i128 = s
        .parse()
        .map_err(|e| ParseError::syntax(s, T::NAME, e))?;

    if wide < T::MIN || wide > T::MAX {
        return Err(ParseError::Range {
            value: wide,
            min: T::MIN,
            max: T::MAX,
            type_name: T::NAME,
        });
    }
    Ok(T::from_wide(wide))
}

/// Parse a boolean in any of the accepted spellings.
pub fn parse_bool(s: &str) -> Result<bool, ParseError> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseError::syntax(s, "bool", "invalid syntax")),
    }
}

/// Parse an RFC 3339 timestamp, normalised to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ParseError::syntax(s, "timestamp", e))
}

/// Canonical RFC 3339 form: `Z` suffix, sub-second digits only when present.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
