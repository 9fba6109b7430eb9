//! Deterministic fixture data for development and tests
//!
//! Every row is keyed by a natural key (name, title, username); rows that
//! already exist are left alone, so seeding twice is harmless.

use crate::auth::{hash_password, Role};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

pub const ADMIN_USERNAME: &str = "admin";
pub const MANAGER_USERNAME: &str = "manager";
pub const CUSTOMER_USERNAME: &str = "customer";

/// Password shared by the fixture accounts
pub const FIXTURE_PASSWORD: &str = "bookshop-pass";

const PUBLISHERS: &[(&str, &str)] = &[
    ("Penguin Random House", "USA"),
    ("HarperCollins", "USA"),
    ("Bloomsbury", "UK"),
    ("Eksmo", "Russia"),
    ("Gallimard", "France"),
];

const STORES: &[(&str, &str)] = &[
    ("Moscow Books", "Moscow"),
    ("Biblio-Globus", "Moscow"),
    ("Dom Knigi", "Saint Petersburg"),
    ("Foyles", "London"),
    ("Shakespeare and Company", "Paris"),
];

struct BookFixture {
    title: &'static str,
    author: &'static str,
    published: (i32, u32, u32),
    publisher: &'static str,
    stores: &'static [&'static str],
    ratings: &'static [i32],
}

const BOOKS: &[BookFixture] = &[
    BookFixture {
        title: "1984",
        author: "George Orwell",
        published: (1949, 6, 8),
        publisher: "Penguin Random House",
        stores: &["Moscow Books", "Foyles"],
        ratings: &[5, 5, 4],
    },
    BookFixture {
        title: "Brave New World",
        author: "Aldous Huxley",
        published: (1932, 1, 1),
        publisher: "HarperCollins",
        stores: &["Dom Knigi"],
        ratings: &[4, 3],
    },
    BookFixture {
        title: "Harry Potter and the Philosopher's Stone",
        author: "J. K. Rowling",
        published: (1997, 6, 26),
        publisher: "Bloomsbury",
        stores: &["Moscow Books", "Biblio-Globus", "Foyles"],
        ratings: &[5, 4, 5, 5],
    },
    BookFixture {
        title: "Crime and Punishment",
        author: "Fyodor Dostoevsky",
        published: (1866, 1, 1),
        publisher: "Eksmo",
        stores: &["Dom Knigi", "Biblio-Globus"],
        ratings: &[5, 4],
    },
    BookFixture {
        title: "The Stranger",
        author: "Albert Camus",
        published: (1942, 1, 1),
        publisher: "Gallimard",
        stores: &[],
        ratings: &[],
    },
    BookFixture {
        title: "The Road",
        author: "Cormac McCarthy",
        published: (2006, 9, 26),
        publisher: "Penguin Random House",
        stores: &["Biblio-Globus"],
        ratings: &[3, 2, 4],
    },
];

/// (name, parent name, description)
const CATEGORIES: &[(&str, Option<&str>, &str)] = &[
    ("Electronics", None, "Devices and gadgets"),
    ("Phones", Some("Electronics"), "Mobile and landline phones"),
    ("Smartphones", Some("Phones"), "Touchscreen phones"),
    ("Books", None, "Printed books"),
];

/// (name, category, price in cents, stock)
const PRODUCTS: &[(&str, &str, i64, i32)] = &[
    ("Laptop Pro", "Electronics", 129_999, 10),
    ("Basic Phone", "Phones", 4_990, 50),
    ("Galaxy X", "Smartphones", 89_900, 5),
    ("Pixel Y", "Smartphones", 79_900, 0),
    ("Rust Programming", "Books", 3_999, 100),
];

/// Rows inserted by one seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub publishers: usize,
    pub stores: usize,
    pub books: usize,
    pub reviews: usize,
    pub users: usize,
    pub categories: usize,
    pub products: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.publishers
            + self.stores
            + self.books
            + self.reviews
            + self.users
            + self.categories
            + self.products
    }
}

/// Fixed point in time the fixture timestamps are laid out from
fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

fn at(offset: Duration) -> DateTimeWithTimeZone {
    (base_time() + offset).into()
}

fn date((y, m, d): (i32, u32, u32)) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| AppError::Internal {
        message: format!("Invalid fixture date {}-{}-{}", y, m, d),
    })
}

fn missing(kind: &str, name: &str) -> AppError {
    AppError::Internal { message: format!("Fixture {} '{}' is not defined", kind, name) }
}

/// Load every fixture; safe to run repeatedly
pub async fn seed<C: ConnectionTrait>(db: &C) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    seed_library(db, &mut report).await?;
    seed_users(db, &mut report).await?;
    seed_shop(db, &mut report).await?;

    info!(inserted = report.total(), "Fixtures loaded");
    Ok(report)
}

async fn seed_library<C: ConnectionTrait>(db: &C, report: &mut SeedReport) -> Result<()> {
    let mut publishers = HashMap::new();
    for (name, country) in PUBLISHERS {
        let existing = PublisherEntity::find()
            .filter(PublisherColumn::Name.eq(*name))
            .one(db)
            .await?;
        let publisher = match existing {
            Some(p) => p,
            None => {
                report.publishers += 1;
                PublisherActiveModel {
                    name: Set(name.to_string()),
                    country: Set(country.to_string()),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        publishers.insert(*name, publisher.id);
    }

    let mut stores = HashMap::new();
    for (name, city) in STORES {
        let existing = StoreEntity::find().filter(StoreColumn::Name.eq(*name)).one(db).await?;
        let store = match existing {
            Some(s) => s,
            None => {
                report.stores += 1;
                StoreActiveModel {
                    name: Set(name.to_string()),
                    city: Set(city.to_string()),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        stores.insert(*name, store.id);
    }

    let mut review_offset = 0;
    for fixture in BOOKS {
        let exists = BookEntity::find()
            .filter(BookColumn::Title.eq(fixture.title))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!(title = fixture.title, "Book already present");
            continue;
        }

        let publisher_id = *publishers
            .get(fixture.publisher)
            .ok_or_else(|| missing("publisher", fixture.publisher))?;

        let book = BookActiveModel {
            title: Set(fixture.title.to_string()),
            author: Set(fixture.author.to_string()),
            published_date: Set(date(fixture.published)?),
            description: Set(format!("{} by {}", fixture.title, fixture.author)),
            publisher_id: Set(publisher_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.books += 1;

        for store in fixture.stores {
            let store_id = *stores.get(store).ok_or_else(|| missing("store", store))?;
            BookStoreEntity::insert(BookStoreActiveModel {
                book_id: Set(book.id),
                store_id: Set(store_id),
            })
            .exec_without_returning(db)
            .await?;
        }

        for (i, rating) in fixture.ratings.iter().enumerate() {
            review_offset += 1;
            ReviewActiveModel {
                book_id: Set(book.id),
                rating: Set(*rating),
                text: Set(format!("Review {} of {}", i + 1, fixture.title)),
                created_at: Set(at(Duration::minutes(review_offset))),
                ..Default::default()
            }
            .insert(db)
            .await?;
            report.reviews += 1;
        }
    }

    Ok(())
}

async fn seed_users<C: ConnectionTrait>(db: &C, report: &mut SeedReport) -> Result<()> {
    let accounts = [
        (ADMIN_USERNAME, Role::Admin),
        (MANAGER_USERNAME, Role::Manager),
        (CUSTOMER_USERNAME, Role::User),
    ];

    for (username, role) in accounts {
        let exists = UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        UserActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(FIXTURE_PASSWORD)?),
            role: Set(role.as_str().to_string()),
            created_at: Set(at(Duration::zero())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.users += 1;
    }

    Ok(())
}

async fn seed_shop<C: ConnectionTrait>(db: &C, report: &mut SeedReport) -> Result<()> {
    let mut categories: HashMap<&str, i32> = HashMap::new();
    for (name, parent, description) in CATEGORIES {
        let parent_id = match parent {
            Some(parent) => Some(*categories.get(parent).ok_or_else(|| missing("category", parent))?),
            None => None,
        };

        let existing = CategoryEntity::find()
            .filter(CategoryColumn::Name.eq(*name))
            .one(db)
            .await?;
        let category = match existing {
            Some(c) => c,
            None => {
                report.categories += 1;
                CategoryActiveModel {
                    name: Set(name.to_string()),
                    description: Set(description.to_string()),
                    parent_id: Set(parent_id),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        categories.insert(*name, category.id);
    }

    for (i, (name, category, cents, stock)) in PRODUCTS.iter().enumerate() {
        let category_id = *categories.get(category).ok_or_else(|| missing("category", category))?;
        let exists = ProductEntity::find()
            .filter(ProductColumn::CategoryId.eq(category_id))
            .filter(ProductColumn::Name.eq(*name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActiveModel {
            name: Set(name.to_string()),
            description: Set(format!("{} ({})", name, category)),
            price: Set(Decimal::new(*cents, 2)),
            stock: Set(*stock),
            category_id: Set(category_id),
            created_at: Set(at(Duration::hours(i as i64))),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.products += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_references_resolve() {
        for book in BOOKS {
            assert!(PUBLISHERS.iter().any(|(name, _)| *name == book.publisher));
            for store in book.stores {
                assert!(STORES.iter().any(|(name, _)| name == store));
            }
            assert!(book.ratings.iter().all(|r| (review::MIN_RATING..=review::MAX_RATING).contains(r)));
        }
        for (_, category, _, _) in PRODUCTS {
            assert!(CATEGORIES.iter().any(|(name, _, _)| name == category));
        }
    }

    #[test]
    fn test_parents_are_declared_before_children() {
        for (i, (_, parent, _)) in CATEGORIES.iter().enumerate() {
            if let Some(parent) = parent {
                assert!(CATEGORIES[..i].iter().any(|(name, _, _)| name == parent));
            }
        }
    }
}
