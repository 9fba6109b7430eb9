//! Book review handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bookshop_common::{
    db::{ListParams, ReviewChanges, ReviewInput, ReviewView},
    errors::{AppError, ErrorResponse, Result},
};

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

/// List reviews; search on text and book title
#[utoipa::path(
    get,
    path = "/api/reviews/",
    tag = "reviews",
    params(ListParams),
    responses((status = 200, description = "Reviews, newest first", body = Vec<ReviewView>))
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReviewView>>> {
    Ok(Json(state.repo().list_reviews(&params).await?))
}

/// Review a book
#[utoipa::path(
    post,
    path = "/api/reviews/",
    tag = "reviews",
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review created", body = ReviewView),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ReviewInput>,
) -> Result<(StatusCode, Json<ReviewView>)> {
    let review = state.repo().create_review(input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_review(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<ReviewView>> {
    state
        .repo()
        .find_review(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Review", id))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<ReviewInput>,
) -> Result<Json<ReviewView>> {
    Ok(Json(state.repo().update_review(id, input.into()).await?))
}

pub async fn patch_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(changes): ValidatedJson<ReviewChanges>,
) -> Result<Json<ReviewView>> {
    Ok(Json(state.repo().update_review(id, changes).await?))
}

pub async fn delete_review(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_review(id).await? {
        return Err(AppError::not_found("Review", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
