//! Database layer for Bookshop
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - Connection pool management
//! - Schema bootstrap from entity definitions

pub mod models;
mod repository;

pub use repository::{
    ArticleChanges, BookChanges, BookDetail, BookInput, BookListItem, CartItemInput, CartItemView,
    CartQuantity, CartView, CategoryInput, ListParams, NewArticle, OrderItemView, OrderView,
    ProductInput, ProductQuery, ProductReviewInput, ProductWithRating, PublisherChanges,
    PublisherInput, PublisherWithCount, RegisterUser, Repository, ReviewChanges, ReviewInput,
    ReviewView, StoreChanges, StoreInput, StoreWithCount,
};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use models::*;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Database::connect(connect_options(config, &config.url))
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to primary: {}", e)
            })?;

        // Connect to replica if configured
        let replica = if let Some(ref read_url) = config.read_url {
            info!("Connecting to read replica...");

            let replica_conn = Database::connect(connect_options(config, read_url))
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to connect to replica: {}", e)
                })?;

            Some(replica_conn)
        } else {
            None
        };

        info!("Database connections established");

        Ok(Self { primary, replica })
    }

    /// Wrap an already open connection (no replica)
    pub fn from_connection(primary: DatabaseConnection) -> Self {
        Self { primary, replica: None }
    }

    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }

        Ok(())
    }
}

fn connect_options(config: &DatabaseConfig, url: &str) -> ConnectOptions {
    let mut opts = ConnectOptions::new(url);
    // every pooled connection to `sqlite::memory:` would see its own empty database
    let max_connections = if url.contains(":memory:") { 1 } else { config.max_connections };
    opts.max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(true);
    opts
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

/// Create every table from its entity definition, parents before children
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, ArticleEntity).await?;

    create_table(db, &schema, PublisherEntity).await?;
    create_table(db, &schema, StoreEntity).await?;
    create_table(db, &schema, BookEntity).await?;
    create_table(db, &schema, BookStoreEntity).await?;
    create_table(db, &schema, ReviewEntity).await?;

    create_table(db, &schema, UserEntity).await?;
    create_table(db, &schema, CategoryEntity).await?;
    create_table(db, &schema, ProductEntity).await?;
    create_table(db, &schema, ProductReviewEntity).await?;
    create_table(db, &schema, OrderEntity).await?;
    create_table(db, &schema, OrderItemEntity).await?;
    create_table(db, &schema, CartEntity).await?;
    create_table(db, &schema, CartItemEntity).await?;

    let product_name_index = Index::create()
        .name("idx_products_category_name")
        .table(ProductEntity)
        .col(ProductColumn::CategoryId)
        .col(ProductColumn::Name)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&product_name_index)).await?;

    info!(backend = ?backend, "Database schema ready");
    Ok(())
}
