use axum::{extract::rejection::JsonRejection, Extension, Json};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{FeedbackMarker, FeedbackRequest, FeedbackState},
};

/// Records one more/less-like-this action and returns the new state
///
/// The state lives with the caller; this only validates and extends it.
pub async fn record(
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> AppResult<Json<FeedbackState>> {
    let Json(request) = payload?;

    let marker = FeedbackMarker {
        title: request.title,
        categories: request.categories,
    };
    let state = request.state.record(request.direction, marker)?;

    tracing::info!(
        request_id = %request_id,
        direction = ?request.direction,
        more = state.more_like_this.len(),
        less = state.less_like_this.len(),
        "Feedback recorded"
    );

    Ok(Json(state))
}
