//! Bookshop HTTP API
//!
//! Routes the article demo, the library and the shop endpoints.
//! Handles:
//! - Authentication (bearer tokens) and role-based write access
//! - Request validation
//! - Observability (request ids, tracing, metrics)

pub mod docs;
pub mod extract;
pub mod handlers;
pub mod middleware;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use bookshop_common::{auth::JwtManager, config::AppConfig, db::DbPool, Repository};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, sync::oneshot};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.jwt_expiration_secs);
        Self {
            config: Arc::new(config),
            db,
            jwt: Arc::new(jwt),
        }
    }

    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    use handlers::*;

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Article demo: open to everyone
    let article_routes = Router::new()
        .route("/demo/articles/", get(articles::list_articles).post(articles::create_article))
        .route(
            "/demo/articles/{id}/",
            get(articles::get_article)
                .put(articles::update_article)
                .patch(articles::patch_article)
                .delete(articles::delete_article),
        );

    // Publishers, stores and books: managers write, admins delete
    let catalog_routes = Router::new()
        .route("/books/", get(books::list_books).post(books::create_book))
        .route("/books/top_rated/", get(books::top_rated))
        .route("/books/statistics/", get(books::statistics))
        .route(
            "/books/{id}/",
            get(books::get_book)
                .put(books::update_book)
                .patch(books::patch_book)
                .delete(books::delete_book),
        )
        .route("/publishers/", get(publishers::list_publishers).post(publishers::create_publisher))
        .route(
            "/publishers/{id}/",
            get(publishers::get_publisher)
                .put(publishers::update_publisher)
                .patch(publishers::patch_publisher)
                .delete(publishers::delete_publisher),
        )
        .route("/publishers/{id}/books/", get(publishers::publisher_books))
        .route("/stores/", get(stores::list_stores).post(stores::create_store))
        .route(
            "/stores/{id}/",
            get(stores::get_store)
                .put(stores::update_store)
                .patch(stores::patch_store)
                .delete(stores::delete_store),
        )
        .route("/stores/{id}/books/", get(stores::store_books))
        .route_layer(from_fn_with_state(state.clone(), middleware::manager_or_read_only));

    // Reviews: any user may post, admins edit
    let review_routes = Router::new()
        .route("/reviews/", get(reviews::list_reviews).post(reviews::create_review))
        .route(
            "/reviews/{id}/",
            get(reviews::get_review)
                .put(reviews::update_review)
                .patch(reviews::patch_review)
                .delete(reviews::delete_review),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::review_access));

    let shop_catalog = Router::new()
        .route("/categories/", get(categories::list_categories).post(categories::create_category))
        .route(
            "/categories/{id}/",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/categories/{id}/descendants/", get(categories::descendants))
        .route("/products/", get(products::list_products).post(products::create_product))
        .route("/products/popular/", get(products::popular_products))
        .route(
            "/products/{id}/",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::manager_or_read_only));

    // Per-user resources; handlers extract the caller themselves
    let shop_account = Router::new()
        .route(
            "/products/{id}/reviews/",
            get(products::list_reviews).post(products::create_review),
        )
        .route("/cart/", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items/", post(cart::add_item))
        .route(
            "/cart/items/{id}/",
            axum::routing::patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/orders/", get(orders::list_orders).post(orders::checkout))
        .route("/orders/{id}/", get(orders::get_order))
        .route("/orders/{id}/status/", post(orders::update_status))
        .route("/orders/{id}/total/", get(orders::order_total))
        .route("/users/recent_orders/", get(orders::users_with_recent_orders));

    let api = Router::new()
        .route("/auth/token/", post(auth::token))
        .route("/auth/register/", post(auth::register))
        .route("/schema/", get(docs::openapi_json))
        .merge(article_routes)
        .merge(catalog_routes)
        .merge(review_routes)
        .nest("/shop", shop_catalog.merge(shop_account));

    // Compose the app
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/api", api)
        .route_layer(from_fn(middleware::track_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(state.config.request_timeout())),
        )
        .with_state(state)
}

/// Serve `app` until `shutdown` resolves, then give in-flight requests at
/// most `drain_timeout` to finish before returning
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining_tx, draining_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = draining_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let deadline = async {
        if draining_rx.await.is_ok() {
            info!(timeout_secs = drain_timeout.as_secs_f64(), "Draining in-flight requests");
            tokio::time::sleep(drain_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = &mut server => result,
        _ = deadline => {
            warn!("Shutdown timeout elapsed, dropping unfinished requests");
            Ok(())
        }
    }
}
