//! Bookshop fixture loader
//!
//! Creates any missing tables, then inserts the development dataset:
//! 1. Publishers, stores, books with store links and reviews
//! 2. Admin, manager and customer accounts
//! 3. Category tree and products
//!
//! Rows that already exist are skipped, so running it twice is harmless.

use bookshop_common::{config::AppConfig, db::create_schema, seed, DbPool, VERSION};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = EnvFilter::try_new(&config.observability.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    info!("Starting Bookshop seeder v{}", VERSION);

    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    create_schema(db.write()).await?;

    let report = seed::seed(db.write()).await?;
    info!(
        publishers = report.publishers,
        stores = report.stores,
        books = report.books,
        reviews = report.reviews,
        users = report.users,
        categories = report.categories,
        products = report.products,
        "Seeding finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
