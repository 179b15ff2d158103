//! Connection discovery handler

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation_error;
use crate::AppState;
use alumnet_common::errors::{AppError, Result};
use alumnet_recommender::{CancellationToken, DegreeMap, ProfileId};

const DEFAULT_MAX_DEGREE: u32 = 2;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DegreeQuery {
    #[validate(range(min = 1, max = 3))]
    pub max_degree: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsResponse {
    pub profile_id: ProfileId,
    pub max_degree: u32,
    pub total: usize,
    pub degrees: DegreeMap,
}

/// GET /v1/connections/{profile_id}
pub async fn discover_connections(
    State(state): State<AppState>,
    Path(profile_id): Path<ProfileId>,
    Query(query): Query<DegreeQuery>,
) -> Result<Json<ConnectionsResponse>> {
    query.validate().map_err(validation_error)?;
    let max_degree = query.max_degree.unwrap_or(DEFAULT_MAX_DEGREE);

    let cancel = CancellationToken::new();
    let _guard = cancel.cancel_on_drop();

    let degrees = state
        .engine
        .discover_connections(profile_id, max_degree, &cancel)
        .await
        .map_err(AppError::from)?;

    Ok(Json(ConnectionsResponse {
        profile_id,
        max_degree,
        total: degrees.len(),
        degrees,
    }))
}
