use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{RankedCentre, RecommendationQuery, RecommendationRequest},
    routes::{
        extract::{AppJson, AppQuery},
        AppState,
    },
};

/// Handler for the daycare recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    AppQuery(query): AppQuery<RecommendationQuery>,
    AppJson(request): AppJson<RecommendationRequest>,
) -> AppResult<Json<Vec<RankedCentre>>> {
    if query.limit == 0 {
        return Err(AppError::InvalidInput(
            "limit must be a positive integer".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        limit = query.limit,
        with_location = request.location.is_some(),
        "Processing recommendation request"
    );

    let ranked = state
        .recommendations
        .rank(request.location.as_deref(), query.limit)
        .await?;

    tracing::info!(
        request_id = %request_id,
        returned = ranked.len(),
        "Recommendations completed"
    );

    Ok(Json(ranked))
}
