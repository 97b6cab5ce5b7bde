//! Error types for variable parsing, assignment and bulk operations.
//!
//! # Design Decisions
//! - Per-value failures are data-dependent and always recoverable
//! - Bulk operations never stop at the first failure; they return a
//!   [`JoinedError`] with one [`KeyedError`] per failing key
//! - Declaring a flag for a type with no binder is a panic, not an error value

use std::fmt;

/// Boxed error returned by caller-supplied parsers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to convert a string into a typed value.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The text is not a valid representation of the target type.
    #[error("invalid {type_name} {input:?}: {reason}")]
    Syntax {
        input: String,
        type_name: &'static str,
        reason: String,
    },

    /// The text is a valid integer but outside the target width.
    #[error("integer {value} exceeds {type_name} size ({min} to {max})")]
    Range {
        value: i128,
        min: i128,
        max: i128,
        type_name: &'static str,
    },

    /// The target type has neither a built-in converter nor a custom parser.
    #[error("can't parse string {input:?} to variable of type {type_name}")]
    Unsupported {
        input: String,
        type_name: &'static str,
    },

    /// A custom parser rejected the text.
    #[error("invalid value {input:?}: {source}")]
    Custom {
        input: String,
        #[source]
        source: BoxError,
    },
}

impl ParseError {
    pub(crate) fn syntax(input: &str, type_name: &'static str, reason: impl fmt::Display) -> Self {
        ParseError::Syntax {
            input: input.to_string(),
            type_name,
            reason: reason.to_string(),
        }
    }
}

/// Failure of an operation on a single variable.
#[derive(Debug, thiserror::Error)]
pub enum VarError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A boxed value of the wrong concrete type was assigned.
    #[error("can't assign value of type {found} to variable of type {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The process environment could not hold the name or value.
    #[error("environment variable {name:?}: {reason}")]
    Env { name: String, reason: &'static str },
}

/// A variable error attributed to the key that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{key}: {source}")]
pub struct KeyedError {
    pub key: String,
    #[source]
    pub source: VarError,
}

/// All per-key failures of one bulk operation.
#[derive(Debug)]
pub struct JoinedError {
    errors: Vec<KeyedError>,
}

impl JoinedError {
    /// `Ok(())` when `errors` is empty, otherwise the joined error.
    pub fn check(errors: Vec<KeyedError>) -> Result<(), JoinedError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(JoinedError { errors })
        }
    }

    pub fn errors(&self) -> &[KeyedError] {
        &self.errors
    }

    /// Keys that failed, in the order they were processed.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.key.as_str())
    }
}

impl fmt::Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for JoinedError {}
