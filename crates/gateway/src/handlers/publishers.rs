//! Publisher handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bookshop_common::{
    db::{BookListItem, ListParams, PublisherChanges, PublisherInput, PublisherWithCount},
    errors::{AppError, Result},
};

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

/// List publishers; search on name and country
#[utoipa::path(
    get,
    path = "/api/publishers/",
    tag = "publishers",
    params(ListParams),
    responses((status = 200, description = "Publishers with book counts", body = Vec<PublisherWithCount>))
)]
pub async fn list_publishers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PublisherWithCount>>> {
    Ok(Json(state.repo().list_publishers(&params).await?))
}

pub async fn create_publisher(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<PublisherInput>,
) -> Result<(StatusCode, Json<PublisherWithCount>)> {
    let publisher = state.repo().create_publisher(input).await?;
    Ok((StatusCode::CREATED, Json(publisher)))
}

pub async fn get_publisher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PublisherWithCount>> {
    state
        .repo()
        .find_publisher(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Publisher", id))
}

pub async fn update_publisher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<PublisherInput>,
) -> Result<Json<PublisherWithCount>> {
    Ok(Json(state.repo().update_publisher(id, input.into()).await?))
}

pub async fn patch_publisher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(changes): ValidatedJson<PublisherChanges>,
) -> Result<Json<PublisherWithCount>> {
    Ok(Json(state.repo().update_publisher(id, changes).await?))
}

pub async fn delete_publisher(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_publisher(id).await? {
        return Err(AppError::not_found("Publisher", id));
    }

    tracing::info!(publisher_id = id, "Publisher deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Books of one publisher
#[utoipa::path(
    get,
    path = "/api/publishers/{id}/books/",
    tag = "publishers",
    params(("id" = i32, Path, description = "Publisher ID")),
    responses((status = 200, description = "The publisher's books", body = Vec<BookListItem>))
)]
pub async fn publisher_books(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<BookListItem>>> {
    Ok(Json(state.repo().publisher_books(id).await?))
}
