//! Book handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bookshop_common::{
    db::{BookChanges, BookDetail, BookInput, BookListItem, ListParams},
    errors::{AppError, ErrorResponse, Result},
    queries::library::LibraryStatistics,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopRatedParams {
    /// Minimum number of reviews (default 3)
    pub min_reviews: Option<i64>,
    /// Maximum number of books (default 10)
    pub limit: Option<u64>,
}

/// List books; search on title, author and description
#[utoipa::path(
    get,
    path = "/api/books/",
    tag = "books",
    params(ListParams),
    responses((status = 200, description = "Books with publisher, stores and rating", body = Vec<BookListItem>))
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<BookListItem>>> {
    Ok(Json(state.repo().list_books(&params).await?))
}

/// Create a book together with its store links
#[utoipa::path(
    post,
    path = "/api/books/",
    tag = "books",
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = BookDetail),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<BookInput>,
) -> Result<(StatusCode, Json<BookDetail>)> {
    let book = state.repo().create_book(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Book detail with its reviews
#[utoipa::path(
    get,
    path = "/api/books/{id}/",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "The book", body = BookDetail),
        (status = 404, description = "No such book", body = ErrorResponse)
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<BookDetail>> {
    state
        .repo()
        .find_book(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book", id))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<BookInput>,
) -> Result<Json<BookDetail>> {
    Ok(Json(state.repo().update_book(id, input.into()).await?))
}

pub async fn patch_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(changes): ValidatedJson<BookChanges>,
) -> Result<Json<BookDetail>> {
    Ok(Json(state.repo().update_book(id, changes).await?))
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_book(id).await? {
        return Err(AppError::not_found("Book", id));
    }

    tracing::info!(book_id = id, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Best rated books with enough reviews
#[utoipa::path(
    get,
    path = "/api/books/top_rated/",
    tag = "books",
    params(TopRatedParams),
    responses((status = 200, description = "Books by average rating", body = Vec<BookListItem>))
)]
pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<TopRatedParams>,
) -> Result<Json<Vec<BookListItem>>> {
    let books = state
        .repo()
        .top_rated_books(params.min_reviews.unwrap_or(3), params.limit.unwrap_or(10))
        .await?;
    Ok(Json(books))
}

/// Totals and the overall average rating
#[utoipa::path(
    get,
    path = "/api/books/statistics/",
    tag = "books",
    responses((status = 200, description = "Library statistics", body = LibraryStatistics))
)]
pub async fn statistics(State(state): State<AppState>) -> Result<Json<LibraryStatistics>> {
    Ok(Json(state.repo().library_statistics().await?))
}
