//! Process-wide default registry.
//!
//! Created on first use and never torn down. Every function here forwards to
//! the same [`Registry`] returned by [`global`].

use std::sync::{Arc, OnceLock};

use axum::Router;

use crate::control::ControlEndpoint;
use crate::error::JoinedError;
use crate::registry::{Registry, Snapshot};
use crate::var::{Setting, Value, VarConfig, Variable};

static DEFAULT: OnceLock<Registry> = OnceLock::new();

/// The default registry.
pub fn global() -> &'static Registry {
    DEFAULT.get_or_init(Registry::new)
}

/// Declare a variable in the default registry.
pub fn declare<T: Setting>(config: VarConfig<T>) -> (Value<T>, Arc<dyn Variable>) {
    global().declare(config)
}

/// Read the environment and process arguments into the default registry.
pub fn read_all() -> Result<(), JoinedError> {
    global().read_all()
}

pub fn flags() -> Snapshot {
    global().flags_snapshot()
}

pub fn env() -> Snapshot {
    global().env_snapshot()
}

pub fn vars() -> Vec<Arc<dyn Variable>> {
    global().vars()
}

/// Control endpoint router over the default registry.
pub fn control_router() -> Router {
    ControlEndpoint::new(global().clone()).into_router()
}
