//! Article demo handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use bookshop_common::{
    db::{models::Article, ArticleChanges, NewArticle},
    errors::{AppError, ErrorResponse, Result},
};

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

/// List articles, newest first
#[utoipa::path(
    get,
    path = "/api/demo/articles/",
    tag = "articles",
    responses((status = 200, description = "All articles", body = Vec<Article>))
)]
pub async fn list_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>> {
    Ok(Json(state.repo().list_articles().await?))
}

/// Create an article
#[utoipa::path(
    post,
    path = "/api/demo/articles/",
    tag = "articles",
    request_body = NewArticle,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_article(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<NewArticle>,
) -> Result<(StatusCode, Json<Article>)> {
    let article = state.repo().create_article(input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// Get one article
#[utoipa::path(
    get,
    path = "/api/demo/articles/{id}/",
    tag = "articles",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "The article", body = Article),
        (status = 404, description = "No such article", body = ErrorResponse)
    )
)]
pub async fn get_article(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Article>> {
    state
        .repo()
        .find_article(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Article", id))
}

/// Replace an article; `is_published` falls back to false when omitted
#[utoipa::path(
    put,
    path = "/api/demo/articles/{id}/",
    tag = "articles",
    params(("id" = i32, Path, description = "Article ID")),
    request_body = NewArticle,
    responses(
        (status = 200, description = "Article replaced", body = Article),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "No such article", body = ErrorResponse)
    )
)]
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<NewArticle>,
) -> Result<Json<Article>> {
    Ok(Json(state.repo().update_article(id, input).await?))
}

/// Change some fields of an article
#[utoipa::path(
    patch,
    path = "/api/demo/articles/{id}/",
    tag = "articles",
    params(("id" = i32, Path, description = "Article ID")),
    request_body = ArticleChanges,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "No such article", body = ErrorResponse)
    )
)]
pub async fn patch_article(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(changes): ValidatedJson<ArticleChanges>,
) -> Result<Json<Article>> {
    Ok(Json(state.repo().patch_article(id, changes).await?))
}

/// Delete an article
#[utoipa::path(
    delete,
    path = "/api/demo/articles/{id}/",
    tag = "articles",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 404, description = "No such article", body = ErrorResponse)
    )
)]
pub async fn delete_article(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    if !state.repo().delete_article(id).await? {
        return Err(AppError::not_found("Article", id));
    }

    tracing::info!(article_id = id, "Article deleted");
    Ok(StatusCode::NO_CONTENT)
}
