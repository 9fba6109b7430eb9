//! OpenAPI document for the article demo, auth and library endpoints

use axum::Json;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::{articles, auth, books, publishers, reviews, stores};

#[derive(OpenApi)]
#[openapi(
    info(title = "Bookshop API", description = "Article demo, library and shop endpoints"),
    paths(
        articles::list_articles,
        articles::create_article,
        articles::get_article,
        articles::update_article,
        articles::patch_article,
        articles::delete_article,
        auth::token,
        auth::register,
        books::list_books,
        books::create_book,
        books::get_book,
        books::top_rated,
        books::statistics,
        publishers::list_publishers,
        publishers::publisher_books,
        stores::list_stores,
        stores::store_books,
        reviews::list_reviews,
        reviews::create_review,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "articles", description = "Article demo CRUD"),
        (name = "auth", description = "Tokens and accounts"),
        (name = "books", description = "Books with publishers, stores and reviews"),
        (name = "publishers", description = "Publishers"),
        (name = "stores", description = "Bookstores"),
        (name = "reviews", description = "Book reviews"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

/// `GET /api/schema/`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
