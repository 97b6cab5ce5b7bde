//! Typed configuration variables.
//!
//! # Data Flow
//! ```text
//! VarConfig<T> (names, default, optional parser)
//!     → TypedVar<T> (default + live cell)
//!     → Value<T> handle given to application code
//!     → Arc<dyn Variable> given to the registry
//!
//! environment / flag / HTTP string
//!     → Variable::parse_and_assign
//!     → custom parser, else Setting::parse_setting
//!     → new value stored in the shared cell
//! ```
//!
//! # Design Decisions
//! - The live value sits in one `ArcSwap` cell shared by every handle; the
//!   cell is never replaced, only its contents
//! - Readers never block; writers swap in a whole new value
//! - The registry only sees the object-safe [`Variable`] trait

pub mod duration;
pub mod scalar;
pub mod setting;

mod env;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use crate::error::{BoxError, ParseError, VarError};

pub(crate) use env::{check_env, set_env};
pub use setting::{FlagKind, Setting};

/// Caller-supplied conversion from text to a value.
pub type ParseFn<T> = Arc<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;

/// Handle to the live value of a variable.
///
/// Clones share the same cell: a value assigned through the registry, a flag
/// or the control endpoint is visible through every handle.
pub struct Value<T> {
    cell: Arc<ArcSwap<T>>,
}

impl<T> Value<T> {
    /// Current value.
    pub fn get(&self) -> Arc<T> {
        self.cell.load_full()
    }

    /// Borrow the current value without touching the reference count.
    pub fn load(&self) -> Guard<Arc<T>> {
        self.cell.load()
    }

    /// Replace the current value.
    pub fn set(&self, value: T) {
        self.cell.store(Arc::new(value));
    }

    /// True when both handles point at the same variable.
    pub fn ptr_eq(&self, other: &Value<T>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn store(&self, value: Arc<T>) {
        self.cell.store(value);
    }
}

impl<T: Clone> Value<T> {
    /// Copy of the current value.
    pub fn cloned(&self) -> T {
        T::clone(&self.cell.load())
    }
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&**self.cell.load()).finish()
    }
}

/// A value of any type, tagged with its type name for error reporting.
pub struct BoxedValue {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl BoxedValue {
    pub fn new<V: Any + Send>(value: V) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<V>(),
        }
    }
}

/// Declaration of a variable.
pub struct VarConfig<T> {
    env_name: String,
    flag_name: String,
    default: T,
    description: String,
    parser: Option<ParseFn<T>>,
}

impl<T: Setting> VarConfig<T> {
    pub fn new(default: T) -> Self {
        Self {
            env_name: String::new(),
            flag_name: String::new(),
            default,
            description: String::new(),
            parser: None,
        }
    }

    /// Back the variable with an environment variable.
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env_name = name.into();
        self
    }

    /// Back the variable with a `--name` command-line flag.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.flag_name = name.into();
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Use `parse` instead of the built-in converter for every string source.
    pub fn parse_with<F, E>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.parser = Some(Arc::new(move |s: &str| -> Result<T, BoxError> {
            parse(s).map_err(Into::into)
        }));
        self
    }
}

/// Type-erased view of a variable.
pub trait Variable: Send + Sync + fmt::Debug {
    /// Parse `s` and store the result. The single write path for every
    /// string source.
    fn parse_and_assign(&self, s: &str) -> Result<(), VarError>;

    /// Store a value of the variable's own type.
    fn assign_boxed(&self, value: BoxedValue) -> Result<(), VarError>;

    fn env_name(&self) -> &str;

    fn flag_name(&self) -> &str;

    /// Current value, boxed.
    fn value(&self) -> Arc<dyn Any + Send + Sync>;

    /// Default value, boxed.
    fn default_value(&self) -> Arc<dyn Any + Send + Sync>;

    /// Canonical string form of the current value.
    fn format(&self) -> String;

    /// JSON form of the current value.
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    /// Restore the current default.
    fn reset(&self);

    /// Make the current value the default and write it to the environment.
    fn persist(&self) -> Result<(), VarError>;

    fn description(&self) -> &str;

    fn type_name(&self) -> &'static str;

    /// Flag binder to use, `None` when the type cannot be a flag.
    fn flag_kind(&self) -> Option<FlagKind>;
}

/// A named configuration cell of type `T`.
pub struct TypedVar<T> {
    env_name: String,
    flag_name: String,
    description: String,
    default: ArcSwap<T>,
    value: Value<T>,
    parser: Option<ParseFn<T>>,
}

impl<T: Setting> TypedVar<T> {
    pub fn new(config: VarConfig<T>) -> Self {
        let default = Arc::new(config.default);
        let value = Value {
            cell: Arc::new(ArcSwap::new(Arc::clone(&default))),
        };
        Self {
            env_name: config.env_name,
            flag_name: config.flag_name,
            description: config.description,
            default: ArcSwap::new(default),
            value,
            parser: config.parser,
        }
    }

    /// A handle to the live value.
    pub fn handle(&self) -> Value<T> {
        self.value.clone()
    }

    pub fn assign(&self, value: T) {
        self.value.set(value);
    }

    fn parse(&self, s: &str) -> Result<T, ParseError> {
        match &self.parser {
            Some(parse) => parse(s).map_err(|source| ParseError::Custom {
                input: s.to_string(),
                source,
            }),
            None => T::parse_setting(s),
        }
    }
}

impl<T: Setting> Variable for TypedVar<T> {
    fn parse_and_assign(&self, s: &str) -> Result<(), VarError> {
        let value = self.parse(s)?;
        self.assign(value);
        Ok(())
    }

    fn assign_boxed(&self, boxed: BoxedValue) -> Result<(), VarError> {
        let found = boxed.type_name;
        match boxed.value.downcast::<T>() {
            Ok(value) => {
                self.assign(*value);
                Ok(())
            }
            Err(_) => Err(VarError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            }),
        }
    }

    fn env_name(&self) -> &str {
        &self.env_name
    }

    fn flag_name(&self) -> &str {
        &self.flag_name
    }

    fn value(&self) -> Arc<dyn Any + Send + Sync> {
        self.value.get()
    }

    fn default_value(&self) -> Arc<dyn Any + Send + Sync> {
        self.default.load_full()
    }

    fn format(&self) -> String {
        self.value.load().format_setting().unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        self.value.load().to_json()
    }

    fn reset(&self) {
        self.value.store(self.default.load_full());
    }

    fn persist(&self) -> Result<(), VarError> {
        let current = self.value.get();
        // The environment write validates before it writes, so a failure
        // leaves both the default and the environment as they were.
        if !self.env_name.is_empty() {
            match current.format_setting() {
                Some(text) => env::set_env(&self.env_name, &text)?,
                None => env::unset_env(&self.env_name)?,
            }
        }
        self.default.store(current);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn flag_kind(&self) -> Option<FlagKind> {
        if self.parser.is_some() {
            Some(FlagKind::Custom)
        } else {
            T::FLAG_KIND
        }
    }
}

impl<T> fmt::Debug for TypedVar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedVar")
            .field("type", &std::any::type_name::<T>())
            .field("env_name", &self.env_name)
            .field("flag_name", &self.flag_name)
            .field("custom_parser", &self.parser.is_some())
            .finish()
    }
}
