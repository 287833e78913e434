//! Name availability endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use registration::{NameCheck, check_names};
use serde::Deserialize;
use store::OrderStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Upper bound on names per request.
const MAX_NAMES: usize = 50;

#[derive(Deserialize)]
pub struct CheckQuery {
    /// Comma-separated full names, e.g. `pulse.eth,pulse.sol`.
    pub names: String,
}

/// GET /names/check — batch availability lookup.
#[tracing::instrument(skip(state, query))]
pub async fn check<S: OrderStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<Vec<NameCheck>>, ApiError> {
    let names: Vec<String> = query
        .names
        .split(',')
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Err(ApiError::BadRequest("no names given".to_string()));
    }
    if names.len() > MAX_NAMES {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_NAMES} names per request"
        )));
    }

    let results = check_names(state.availability.as_ref(), &names).await;
    Ok(Json(results))
}
