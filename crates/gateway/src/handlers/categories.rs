//! Category handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use bookshop_common::{
    db::{models::Category, CategoryInput},
    errors::{AppError, Result},
    queries::shop::CategoryProductCount,
};
use serde::Serialize;

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct DescendantsResponse {
    pub category_id: i32,
    /// The category itself first, then every category below it
    pub ids: Vec<i32>,
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryProductCount>>> {
    Ok(Json(state.repo().list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = state.repo().create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Category>> {
    state
        .repo()
        .find_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Category", id))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<Json<Category>> {
    Ok(Json(state.repo().update_category(id, input).await?))
}

pub async fn delete_category(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_category(id).await? {
        return Err(AppError::not_found("Category", id));
    }

    tracing::info!(category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn descendants(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DescendantsResponse>> {
    let ids = state.repo().category_descendants(id).await?;
    Ok(Json(DescendantsResponse { category_id: id, ids }))
}
