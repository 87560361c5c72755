use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
};

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload?;

    tracing::info!(
        request_id = %request_id,
        ratings = request.ratings.len(),
        has_likes = request.likes.is_some(),
        has_dislikes = request.dislikes.is_some(),
        "Processing recommendation request"
    );

    let response = state.recommender.recommend(request).await.map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            retryable = e.is_retryable(),
            "Recommendation request failed"
        );
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        returned = response.recommendations.len(),
        "Recommendation request completed"
    );

    Ok(Json(response))
}
