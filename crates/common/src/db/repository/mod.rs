//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

mod articles;
mod library;
mod shop;
mod users;

pub use articles::{ArticleChanges, NewArticle};
pub use library::{
    BookChanges, BookDetail, BookInput, BookListItem, ListParams, PublisherChanges, PublisherInput,
    PublisherWithCount, ReviewChanges, ReviewInput, ReviewView, StoreChanges, StoreInput,
    StoreWithCount,
};
pub use shop::{
    CartItemInput, CartItemView, CartQuantity, CartView, CategoryInput, OrderItemView, OrderView,
    ProductInput, ProductQuery, ProductReviewInput, ProductWithRating,
};
pub use users::RegisterUser;

use crate::db::DbPool;
use crate::errors::Result;
use sea_orm::DatabaseConnection;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
    chrono::Utc::now().into()
}
