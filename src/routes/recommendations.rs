use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{CurrentUser, Limit, RequestId},
    models::BookSummary,
    routes::AppState,
};

/// Handler for personalized recommendations of the calling user
pub async fn for_user(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Limit(limit): Limit,
) -> AppResult<Json<Vec<BookSummary>>> {
    tracing::info!(
        request_id = %request_id,
        user_id,
        limit,
        "Processing user recommendation request"
    );

    let books = state
        .recommendations
        .recommend_for_user(user_id, limit)
        .await?;

    Ok(Json(books))
}

/// Handler for recommendations without a user context
pub async fn general(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Limit(limit): Limit,
) -> AppResult<Json<Vec<BookSummary>>> {
    tracing::info!(
        request_id = %request_id,
        limit,
        "Processing general recommendation request"
    );

    let books = state.recommendations.recommend_general(limit).await?;

    Ok(Json(books))
}
