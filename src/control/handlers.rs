use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::control::ControlState;

pub async fn get_vars(State(state): State<ControlState>) -> Response {
    match state.registry.env_json() {
        Ok(vars) => Json(vars).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert variables to JSON");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to marshal variables to JSON",
            )
                .into_response()
        }
    }
}

pub async fn post_vars(State(state): State<ControlState>, body: Bytes) -> Response {
    if body.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let params: BTreeMap<String, String> = match serde_json::from_slice(&body) {
        Ok(params) => params,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)).into_response();
        }
    };

    apply(&state, params).await
}

/// Query pairs; a key given several times is joined with commas.
pub async fn put_vars(
    State(state): State<ControlState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        params.entry(key).or_default().push(value);
    }
    let params = params
        .into_iter()
        .map(|(key, values)| (key, values.join(",")));

    apply(&state, params).await
}

async fn apply<I>(state: &ControlState, params: I) -> Response
where
    I: IntoIterator<Item = (String, String)>,
{
    let _guard = state.mutation.lock().await;
    match state.registry.apply(params) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error setting config variables\n{}", e),
        )
            .into_response(),
    }
}
