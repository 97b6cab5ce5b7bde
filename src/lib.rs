//! Runtime configuration registry.
//!
//! Declare typed variables backed by environment variables and command-line
//! flags, read them at startup, and inspect or change them while the process
//! runs through an HTTP control endpoint.
//!
//! ```no_run
//! use live_config::VarConfig;
//!
//! let (port, _) = live_config::declare(VarConfig::new(8080u16).env("PORT").flag("port"));
//! live_config::read_all().expect("invalid environment");
//! println!("listening on {}", port.get());
//! ```

pub mod control;
pub mod error;
pub mod logging;
pub mod registry;
pub mod var;

pub use control::ControlEndpoint;
pub use error::{JoinedError, KeyedError, ParseError, VarError};
pub use registry::global::{control_router, declare, env, flags, global, read_all, vars};
pub use registry::{Registry, Snapshot};
pub use var::{BoxedValue, FlagKind, Setting, TypedVar, Value, VarConfig, Variable};

/// Serialises unit tests that read or write the process environment.
#[cfg(test)]
pub(crate) fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
