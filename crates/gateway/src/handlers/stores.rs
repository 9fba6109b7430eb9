//! Store handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bookshop_common::{
    db::{BookListItem, ListParams, StoreChanges, StoreInput, StoreWithCount},
    errors::{AppError, Result},
};

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

/// List stores by city; search on name and city
#[utoipa::path(
    get,
    path = "/api/stores/",
    tag = "stores",
    params(ListParams),
    responses((status = 200, description = "Stores with book counts", body = Vec<StoreWithCount>))
)]
pub async fn list_stores(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoreWithCount>>> {
    Ok(Json(state.repo().list_stores(&params).await?))
}

pub async fn create_store(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<StoreInput>,
) -> Result<(StatusCode, Json<StoreWithCount>)> {
    let store = state.repo().create_store(input).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn get_store(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<StoreWithCount>> {
    state
        .repo()
        .find_store(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Store", id))
}

pub async fn update_store(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<StoreInput>,
) -> Result<Json<StoreWithCount>> {
    Ok(Json(state.repo().update_store(id, input.into()).await?))
}

pub async fn patch_store(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(changes): ValidatedJson<StoreChanges>,
) -> Result<Json<StoreWithCount>> {
    Ok(Json(state.repo().update_store(id, changes).await?))
}

pub async fn delete_store(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_store(id).await? {
        return Err(AppError::not_found("Store", id));
    }

    tracing::info!(store_id = id, "Store deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Books sold by one store
#[utoipa::path(
    get,
    path = "/api/stores/{id}/books/",
    tag = "stores",
    params(("id" = i32, Path, description = "Store ID")),
    responses((status = 200, description = "The store's books", body = Vec<BookListItem>))
)]
pub async fn store_books(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<BookListItem>>> {
    Ok(Json(state.repo().store_books(id).await?))
}
