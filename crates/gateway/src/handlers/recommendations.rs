//! Recommendation handlers
//!
//! Thin adapters over the engine: validate the limit, run the request with
//! a cancellation token tied to the handler future, and serialize results.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation_error;
use crate::AppState;
use alumnet_common::errors::{AppError, Result};
use alumnet_recommender::{CancellationToken, ProfileId, RankedResult};

/// Upper bound accepted before the configured `max_limit` check
const LIMIT_CEILING: usize = 1000;

#[derive(Debug, Deserialize, Validate)]
pub struct LimitQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// Requested limit, defaulted and checked against the configured maximum
    fn resolve(self, state: &AppState) -> Result<usize> {
        self.validate().map_err(validation_error)?;

        let settings = state.engine.settings();
        bounded_limit(self.limit, settings.default_limit, settings.max_limit)
    }
}

fn bounded_limit(requested: Option<usize>, default_limit: usize, max_limit: usize) -> Result<usize> {
    let max = max_limit.min(LIMIT_CEILING);
    let limit = requested.unwrap_or(default_limit);
    if limit > max {
        return Err(AppError::Validation {
            message: format!("limit must be between 1 and {}", max),
            field: Some("limit".to_string()),
        });
    }
    Ok(limit)
}

fn no_store<T: Serialize>(results: Vec<RankedResult<T>>) -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-store")], Json(results))
}

/// GET /v1/recommendations/events/{profile_id}
pub async fn recommend_events(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.resolve(&state)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.cancel_on_drop();

    let results = state
        .engine
        .recommend_events(profile_id, limit, &cancel)
        .await
        .map_err(AppError::from)?;

    Ok(no_store(results))
}

/// GET /v1/recommendations/users/{profile_id}
pub async fn recommend_users(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.resolve(&state)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.cancel_on_drop();

    let results = state
        .engine
        .recommend_peers(profile_id, limit, &cancel)
        .await
        .map_err(AppError::from)?;

    Ok(no_store(results))
}

/// GET /v1/recommendations/jobs/{profile_id}
pub async fn recommend_jobs(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.resolve(&state)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.cancel_on_drop();

    let results = state
        .engine
        .recommend_jobs(profile_id, limit, &cancel)
        .await
        .map_err(AppError::from)?;

    Ok(no_store(results))
}
