//! Built-in value types.
//!
//! A type becomes usable as a configuration value by implementing
//! [`Setting`]. Built-in types supply a converter from the canonical string
//! form and, for the types a flag can carry directly, a [`FlagKind`]. User
//! types only need [`Setting::format_setting`] and a custom parser on their
//! [`VarConfig`](crate::var::VarConfig).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ParseError;
use crate::var::duration::{format_duration, parse_duration};
use crate::var::scalar::{format_timestamp, parse_bool, parse_integer, parse_timestamp};

/// How a flag-backed variable is exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    Str,
    Int,
    Uint,
    Float,
    Duration,
    /// Free-form string handed to a custom parser.
    Custom,
}

/// A value type that can live in a configuration variable.
pub trait Setting: Serialize + Send + Sync + Sized + 'static {
    /// Flag binder for this type, `None` when it cannot be a flag on its own.
    const FLAG_KIND: Option<FlagKind> = None;

    /// Built-in conversion from the canonical string form.
    fn parse_setting(s: &str) -> Result<Self, ParseError> {
        Err(ParseError::Unsupported {
            input: s.to_string(),
            type_name: std::any::type_name::<Self>(),
        })
    }

    /// Canonical string form, `None` when there is no live value.
    fn format_setting(&self) -> Option<String>;

    /// JSON form used by snapshots.
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl Setting for String {
    const FLAG_KIND: Option<FlagKind> = Some(FlagKind::Str);

    fn parse_setting(s: &str) -> Result<Self, ParseError> {
        Ok(s.to_string())
    }

    fn format_setting(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl Setting for bool {
    const FLAG_KIND: Option<FlagKind> = Some(FlagKind::Bool);

    fn parse_setting(s: &str) -> Result<Self, ParseError> {
        parse_bool(s)
    }

    fn format_setting(&self) -> Option<String> {
        Some(self.to_string())
    }
}

// Serialized as the canonical text so snapshots can be posted back verbatim.
impl Setting for Duration {
    const FLAG_KIND: Option<FlagKind> = Some(FlagKind::Duration);

    fn parse_setting(s: &str) -> Result<Self, ParseError> {
        parse_duration(s)
    }

    fn format_setting(&self) -> Option<String> {
        Some(format_duration(*self))
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        Ok(serde_json::Value::String(format_duration(*self)))
    }
}

impl Setting for DateTime<Utc> {
    fn parse_setting(s: &str) -> Result<Self, ParseError> {
        parse_timestamp(s)
    }

    fn format_setting(&self) -> Option<String> {
        Some(format_timestamp(self))
    }
}

macro_rules! integer_setting {
    ($flag:expr => $($t:ty),*) => {$(
        impl Setting for $t {
            const FLAG_KIND: Option<FlagKind> = $flag;

            fn parse_setting(s: &str) -> Result<Self, ParseError> {
                parse_integer::<$t>(s)
            }

            fn format_setting(&self) -> Option<String> {
                Some(self.to_string())
            }
        }
    )*};
}

integer_setting!(Some(FlagKind::Int) => i64, isize);
integer_setting!(Some(FlagKind::Uint) => u64, usize);
integer_setting!(None => i8, i16, i32, u8, u16, u32);

macro_rules! float_setting {
    ($flag:expr => $($t:ty),*) => {$(
        impl Setting for $t {
            const FLAG_KIND: Option<FlagKind> = $flag;

            fn parse_setting(s: &str) -> Result<Self, ParseError> {
                s.parse::<$t>()
                    .map_err(|e| ParseError::syntax(s, stringify!($t), e))
            }

            fn format_setting(&self) -> Option<String> {
                Some(self.to_string())
            }

            // JSON has no NaN or infinity.
            fn to_json(&self) -> serde_json::Result<serde_json::Value> {
                if !self.is_finite() {
                    return Err(serde::ser::Error::custom(format!(
                        "{} has no JSON representation",
                        self
                    )));
                }
                serde_json::to_value(self)
            }
        }
    )*};
}

float_setting!(Some(FlagKind::Float) => f64);
float_setting!(None => f32);

/// An optional value: the empty string is `None`, and `None` is "unset".
///
/// The empty string always reads as `None`, so `Some` of a value whose text
/// form is empty (such as `Some(String::new())`) cannot round-trip.
impl<T: Setting> Setting for Option<T> {
    fn parse_setting(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() {
            Ok(None)
        } else {
            T::parse_setting(s).map(Some)
        }
    }

    fn format_setting(&self) -> Option<String> {
        self.as_ref().and_then(T::format_setting)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Some(v) => v.to_json(),
            None => Ok(serde_json::Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Setting + PartialEq + std::fmt::Debug>(value: T) {
        let text = value.format_setting().unwrap_or_default();
        let back = T::parse_setting(&text).unwrap();
        assert_eq!(back, value, "{}", text);
    }

    #[test]
    fn test_builtin_round_trips() {
        round_trip(String::from("hello, world"));
        round_trip(String::new());
        round_trip(true);
        round_trip(false);
        round_trip(i8::MIN);
        round_trip(i16::MAX);
        round_trip(-1i32);
        round_trip(i64::MIN);
        round_trip(isize::MAX);
        round_trip(u8::MAX);
        round_trip(u16::MAX);
        round_trip(u32::MAX);
        round_trip(u64::MAX);
        round_trip(usize::MAX);
        round_trip(0.1f64);
        round_trip(-1.5e300f64);
        round_trip(f64::INFINITY);
        round_trip(3.4e38f32);
        round_trip(Duration::from_millis(8 * 3_600_000 + 47 * 60_000 + 1));
        round_trip(parse_timestamp("1999-12-31T23:59:59.123456789Z").unwrap());
        round_trip(Some(42u16));
        round_trip(None::<u16>);
    }

    #[test]
    fn test_flag_kinds() {
        assert_eq!(<bool as Setting>::FLAG_KIND, Some(FlagKind::Bool));
        assert_eq!(<i64 as Setting>::FLAG_KIND, Some(FlagKind::Int));
        assert_eq!(<usize as Setting>::FLAG_KIND, Some(FlagKind::Uint));
        assert_eq!(<Duration as Setting>::FLAG_KIND, Some(FlagKind::Duration));
        assert_eq!(<i32 as Setting>::FLAG_KIND, None);
        assert_eq!(<DateTime<Utc> as Setting>::FLAG_KIND, None);
    }

    #[test]
    fn test_option_empty_text_is_none() {
        assert_eq!(Option::<String>::parse_setting("").unwrap(), None);
        assert_eq!(Some(String::new()).format_setting(), Some(String::new()));
        round_trip(Some(String::from("x")));
    }

    #[test]
    fn test_non_finite_float_has_no_json() {
        assert!(f64::NAN.to_json().is_err());
        assert!(f64::NEG_INFINITY.to_json().is_err());
        assert!(f32::INFINITY.to_json().is_err());
        assert_eq!(1.5f64.to_json().unwrap(), serde_json::json!(1.5));
        assert!(Some(f64::NAN).to_json().is_err());
    }

    #[test]
    fn test_duration_json_is_text() {
        let json = Duration::from_secs(90).to_json().unwrap();
        assert_eq!(json, serde_json::json!("1m30s"));
    }
}
