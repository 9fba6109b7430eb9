//! Product and product review handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bookshop_common::{
    auth::AuthContext,
    db::{models::{Product, ProductReview}, ProductInput, ProductQuery, ProductReviewInput, ProductWithRating},
    errors::{AppError, Result},
    queries::shop::ProductOrderCount,
};
use serde::Deserialize;

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    /// Maximum number of products (default 10)
    pub limit: Option<usize>,
}

/// Filtered product listing with order counts
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductOrderCount>>> {
    Ok(Json(state.repo().list_products(&query).await?))
}

pub async fn popular_products(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> Result<Json<Vec<ProductOrderCount>>> {
    let products = state.repo().popular_products(params.limit.unwrap_or(10)).await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.repo().create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductWithRating>> {
    state
        .repo()
        .find_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Product", id))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(state.repo().update_product(id, input).await?))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_product(id).await? {
        return Err(AppError::not_found("Product", id));
    }

    tracing::info!(product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ProductReview>>> {
    Ok(Json(state.repo().list_product_reviews(id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<ProductReviewInput>,
) -> Result<(StatusCode, Json<ProductReview>)> {
    let review = state.repo().create_product_review(id, auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
