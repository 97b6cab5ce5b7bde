//! Variable registry.
//!
//! # Data Flow
//! ```text
//! Registry::declare(VarConfig<T>)
//!     → TypedVar<T> created, flag binder checked
//!     → indexed in all / by_env / by_flag
//!
//! Registry::read_all
//!     → read_env: every env-indexed variable with a non-empty value
//!     → flags::parse: every flag supplied on the command line
//!
//! Registry::apply (control endpoint)
//!     → env name lookup, else flag name lookup
//!     → parse_and_assign, env write for env-backed keys
//! ```
//!
//! # Design Decisions
//! - Registering a name that is already taken replaces the lookup entry
//!   (last registration wins) and logs a warning
//! - Batch operations collect one error per failing key and never roll back
//! - No lock is held while a variable parses its input

pub mod flags;
pub mod global;

use std::any::Any;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{JoinedError, KeyedError};
use crate::var::{check_env, set_env, Setting, TypedVar, Value, VarConfig, Variable};

/// Point-in-time view of current values keyed by variable name.
pub type Snapshot = BTreeMap<String, Arc<dyn Any + Send + Sync>>;

#[derive(Default)]
struct Inner {
    all: Vec<Arc<dyn Variable>>,
    by_env: BTreeMap<String, Arc<dyn Variable>>,
    by_flag: BTreeMap<String, Arc<dyn Variable>>,
}

/// A collection of configuration variables.
///
/// Cloning is cheap; clones share the same variables.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("registry lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("registry lock poisoned")
    }

    /// Declare a variable and register it under its names.
    ///
    /// # Panics
    /// When the config names a flag, has no custom parser, and `T` has no
    /// flag binder.
    pub fn declare<T: Setting>(&self, config: VarConfig<T>) -> (Value<T>, Arc<dyn Variable>) {
        let var = TypedVar::new(config);
        let handle = var.handle();
        let var: Arc<dyn Variable> = Arc::new(var);
        self.register([Arc::clone(&var)]);
        (handle, var)
    }

    /// Add variables and index them by env and flag name.
    ///
    /// # Panics
    /// When a flag-backed variable has no flag binder.
    pub fn register<I>(&self, vars: I)
    where
        I: IntoIterator<Item = Arc<dyn Variable>>,
    {
        let vars: Vec<Arc<dyn Variable>> = vars.into_iter().collect();
        for var in vars.iter().filter(|var| !var.flag_name().is_empty()) {
            flags::require_binder(var.as_ref());
        }

        let mut inner = self.write();
        for var in vars {
            let env_name = var.env_name().to_string();
            if !env_name.is_empty() {
                if let Some(prev) = inner.by_env.insert(env_name.clone(), Arc::clone(&var)) {
                    if !Arc::ptr_eq(&prev, &var) {
                        tracing::warn!(env = %env_name, "Environment name re-registered; previous variable shadowed");
                    }
                }
            }

            let flag_name = var.flag_name().to_string();
            if !flag_name.is_empty() {
                if let Some(prev) = inner.by_flag.insert(flag_name.clone(), Arc::clone(&var)) {
                    if !Arc::ptr_eq(&prev, &var) {
                        tracing::warn!(flag = %flag_name, "Flag name re-registered; previous variable shadowed");
                    }
                }
            }

            inner.all.push(var);
        }
    }

    /// Read the process environment, then parse the process arguments.
    ///
    /// Flag errors print a usage message and exit the process.
    pub fn read_all(&self) -> Result<(), JoinedError> {
        self.read_all_from(std::env::args_os())
    }

    /// [`read_all`](Self::read_all) with explicit arguments, starting with
    /// the binary name.
    pub fn read_all_from<I, T>(&self, args: I) -> Result<(), JoinedError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let env = self.read_env();
        self.parse_flags_from(args);
        env
    }

    /// Assign every env-backed variable whose environment value is non-empty.
    pub fn read_env(&self) -> Result<(), JoinedError> {
        let vars: Vec<(String, Arc<dyn Variable>)> = self
            .read()
            .by_env
            .iter()
            .map(|(name, var)| (name.clone(), Arc::clone(var)))
            .collect();

        let mut applied = 0;
        let mut errors = Vec::new();
        for (name, var) in vars {
            let text = match std::env::var(&name) {
                Ok(text) if !text.is_empty() => text,
                Ok(_) | Err(std::env::VarError::NotPresent) => continue,
                Err(std::env::VarError::NotUnicode(_)) => {
                    tracing::warn!(env = %name, "Environment value is not valid UTF-8; skipped");
                    continue;
                }
            };
            match var.parse_and_assign(&text) {
                Ok(()) => {
                    tracing::debug!(env = %name, "Environment value applied");
                    applied += 1;
                }
                Err(source) => {
                    tracing::warn!(env = %name, error = %source, "Environment value rejected");
                    errors.push(KeyedError { key: name, source });
                }
            }
        }

        tracing::info!(applied, failed = errors.len(), "Environment read");
        JoinedError::check(errors)
    }

    /// Parse flags from `args`; on error print the clap message and exit.
    pub fn parse_flags_from<I, T>(&self, args: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if let Err(e) = self.try_parse_flags_from(args) {
            e.exit();
        }
    }

    /// Parse flags from `args`, returning clap errors instead of exiting.
    pub fn try_parse_flags_from<I, T>(&self, args: I) -> Result<(), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let bound: Vec<(String, Arc<dyn Variable>)> = self
            .read()
            .by_flag
            .iter()
            .map(|(name, var)| (name.clone(), Arc::clone(var)))
            .collect();

        let applied = flags::parse(&bound, args)?;
        tracing::info!(applied, bound = bound.len(), "Flags parsed");
        Ok(())
    }

    /// Current values of flag-backed variables, keyed by flag name.
    pub fn flags_snapshot(&self) -> Snapshot {
        snapshot(&self.read().by_flag)
    }

    /// Current values of env-backed variables, keyed by env name.
    pub fn env_snapshot(&self) -> Snapshot {
        snapshot(&self.read().by_env)
    }

    /// JSON form of [`env_snapshot`](Self::env_snapshot).
    pub fn env_json(&self) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        self.read()
            .by_env
            .iter()
            .map(|(name, var)| Ok((name.clone(), var.to_json()?)))
            .collect()
    }

    /// Bulk mutation from name/string pairs.
    ///
    /// Each name is looked up by env name, then by flag name; unknown names
    /// are ignored. Keys matched by env name are also written to the process
    /// environment once assigned; a value the environment cannot hold fails
    /// the key without assigning it. Keys that succeed stay applied even when
    /// others fail.
    pub fn apply<I, K, V>(&self, pairs: I) -> Result<(), JoinedError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut errors = Vec::new();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());

            let found = {
                let inner = self.read();
                match inner.by_env.get(key) {
                    Some(var) => Some((Arc::clone(var), true)),
                    None => inner.by_flag.get(key).map(|var| (Arc::clone(var), false)),
                }
            };
            let Some((var, env_backed)) = found else {
                tracing::debug!(key = %key, "Unknown variable ignored");
                continue;
            };

            // An env-backed key is only assigned once its environment write
            // is known to succeed.
            let result = if env_backed {
                check_env(key, value)
                    .and_then(|()| var.parse_and_assign(value))
                    .and_then(|()| set_env(key, value))
            } else {
                var.parse_and_assign(value)
            };
            match result {
                Ok(()) => tracing::debug!(key = %key, "Variable updated"),
                Err(source) => {
                    tracing::warn!(key = %key, error = %source, "Variable update rejected");
                    errors.push(KeyedError {
                        key: key.to_string(),
                        source,
                    });
                }
            }
        }
        JoinedError::check(errors)
    }

    /// Every registered variable in registration order.
    pub fn vars(&self) -> Vec<Arc<dyn Variable>> {
        self.read().all.clone()
    }

    pub fn lookup_env(&self, name: &str) -> Option<Arc<dyn Variable>> {
        self.read().by_env.get(name).cloned()
    }

    pub fn lookup_flag(&self, name: &str) -> Option<Arc<dyn Variable>> {
        self.read().by_flag.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().all.is_empty()
    }
}

fn snapshot(index: &BTreeMap<String, Arc<dyn Variable>>) -> Snapshot {
    index
        .iter()
        .map(|(name, var)| (name.clone(), var.value()))
        .collect()
}
