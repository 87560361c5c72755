use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{SearchRequest, SearchResponse},
    routes::AppState,
};

/// Handler for plain description search
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<SearchResponse>> {
    let Json(request) = payload?;

    tracing::info!(
        request_id = %request_id,
        match_count = ?request.match_count,
        "Processing description search"
    );

    let response = state.recommender.search(request).await.map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            retryable = e.is_retryable(),
            "Description search failed"
        );
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        returned = response.movies.len(),
        "Description search completed"
    );

    Ok(Json(response))
}
