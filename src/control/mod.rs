//! HTTP control endpoint.
//!
//! # Routes
//! ```text
//! GET  /          → env-keyed snapshot as a JSON object
//! POST /  {json}  → bulk update from a JSON object of strings
//! PUT  /?k=v      → bulk update from the query string
//! ```
//!
//! # Design Decisions
//! - Bulk updates are serialised by one mutex per router; reads are not
//! - Optional bearer-token auth guards every route
//! - Request IDs are assigned before tracing so every span carries one

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::sync::Mutex;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::registry::Registry;
use self::auth::require_api_key;
use self::handlers::{get_vars, post_vars, put_vars};

/// State shared by the control handlers.
#[derive(Clone)]
pub struct ControlState {
    pub registry: Registry,
    api_key: Option<Arc<str>>,
    mutation: Arc<Mutex<()>>,
}

/// Builder for the control endpoint router.
pub struct ControlEndpoint {
    registry: Registry,
    api_key: Option<String>,
    request_timeout: Duration,
}

impl ControlEndpoint {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            api_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Require `Authorization: Bearer <key>`. An empty key disables auth.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the router, mounted at `/`.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let state = ControlState {
            registry: self.registry,
            api_key: self.api_key.map(Arc::from),
            mutation: Arc::new(Mutex::new(())),
        };

        Router::new()
            .route("/", get(get_vars).post(post_vars).put(put_vars))
            .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
            .with_state(state)
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }
}
