//! Shared setup for integration tests: an in-memory SQLite database with the
//! schema created from the entities, optionally loaded with fixtures.

#![allow(dead_code)]

use bookshop_common::config::DatabaseConfig;
use bookshop_common::db::{create_schema, DbPool};
use bookshop_common::seed;

pub async fn empty_pool() -> DbPool {
    let pool = DbPool::new(&DatabaseConfig::with_url("sqlite::memory:"))
        .await
        .expect("open sqlite");
    create_schema(pool.write()).await.expect("create schema");
    pool
}

pub async fn seeded_pool() -> DbPool {
    let pool = empty_pool().await;
    seed::seed(pool.write()).await.expect("load fixtures");
    pool
}

pub fn titles<T, F: Fn(&T) -> &str>(rows: &[T], title: F) -> Vec<String> {
    rows.iter().map(|r| title(r).to_string()).collect()
}

/// Seeded primary with a replica that has the schema but none of the rows,
/// as a replica lagging behind every write would
pub async fn lagging_replica_pool() -> DbPool {
    let primary = seeded_pool().await;
    let replica = empty_pool().await;
    DbPool {
        primary: primary.primary,
        replica: Some(replica.primary),
    }
}
