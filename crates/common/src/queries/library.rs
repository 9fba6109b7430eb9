//! Library queries: filters across publisher, store and review relations,
//! aggregate annotations, and eager-loading variants of the common listings.
//!
//! Each `*_lazy` loader fetches related rows one query per parent row; its
//! counterpart without the suffix returns the same data with a join or one
//! batched query per relation.

use super::{as_double, round2};
use crate::db::models::*;
use crate::errors::Result;
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, LoaderTrait, ModelTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Book annotated with its review aggregate
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct BookWithRating {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    pub publisher_id: i32,
    pub avg_rating: f64,
    pub reviews_count: i64,
}

/// Store annotated with the number of books it sells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct StoreBookCount {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub books_count: i64,
}

/// Book with every relation resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookBundle {
    pub book: Book,
    pub publisher: Option<Publisher>,
    pub stores: Vec<Store>,
    pub reviews: Vec<Review>,
}

/// Library-wide review statistics
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LibraryStatistics {
    pub total_books: u64,
    pub total_reviews: u64,
    pub average_rating: f64,
}

/// Books in default order: newest first, then by title
pub fn books_ordered() -> Select<BookEntity> {
    BookEntity::find()
        .order_by_desc(BookColumn::PublishedDate)
        .order_by_asc(BookColumn::Title)
        .order_by_asc(BookColumn::Id)
}

fn avg_rating_expr() -> SimpleExpr {
    as_double(Func::avg(Expr::col((ReviewEntity, ReviewColumn::Rating))))
}

fn reviews_count_expr() -> SimpleExpr {
    Expr::col((ReviewEntity, ReviewColumn::Id)).count()
}

fn store_books_count_expr() -> SimpleExpr {
    Expr::col((BookStoreEntity, BookStoreColumn::BookId)).count()
}

fn sort_stores(stores: &mut [Store]) {
    stores.sort_by_key(|s| s.id);
}

fn sort_reviews(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn sort_books(books: &mut [Book]) {
    books.sort_by(|a, b| {
        b.published_date
            .cmp(&a.published_date)
            .then_with(|| a.title.cmp(&b.title))
            .then(a.id.cmp(&b.id))
    });
}

// ============================================================================
// Filters and aggregates
// ============================================================================

/// Books whose publisher is located in `country`
pub async fn books_by_publisher_country<C: ConnectionTrait>(db: &C, country: &str) -> Result<Vec<Book>> {
    books_ordered()
        .inner_join(PublisherEntity)
        .filter(PublisherColumn::Country.eq(country))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Books sold in at least one store located in `city`, each book once
pub async fn books_by_store_city<C: ConnectionTrait>(db: &C, city: &str) -> Result<Vec<Book>> {
    books_ordered()
        .inner_join(StoreEntity)
        .filter(StoreColumn::City.eq(city))
        .distinct()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Books whose average review rating is strictly above `threshold`.
/// Books without reviews have no average and are never returned.
pub async fn books_with_avg_rating_above<C: ConnectionTrait>(
    db: &C,
    threshold: f64,
) -> Result<Vec<BookWithRating>> {
    annotated_books()
        .having(Expr::expr(avg_rating_expr()).gt(threshold))
        .order_by_desc(BookColumn::PublishedDate)
        .order_by_asc(BookColumn::Title)
        .into_model::<BookWithRating>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Books with at least `min_reviews` reviews, best average first
pub async fn top_rated_books<C: ConnectionTrait>(
    db: &C,
    min_reviews: i64,
    limit: u64,
) -> Result<Vec<BookWithRating>> {
    annotated_books()
        .having(Expr::expr(reviews_count_expr()).gte(min_reviews))
        .order_by(avg_rating_expr(), Order::Desc)
        .order_by_asc(BookColumn::Id)
        .limit(limit)
        .into_model::<BookWithRating>()
        .all(db)
        .await
        .map_err(Into::into)
}

fn annotated_books() -> Select<BookEntity> {
    BookEntity::find()
        .select_only()
        .columns([
            BookColumn::Id,
            BookColumn::Title,
            BookColumn::Author,
            BookColumn::PublishedDate,
            BookColumn::PublisherId,
        ])
        .column_as(avg_rating_expr(), "avg_rating")
        .column_as(reviews_count_expr(), "reviews_count")
        .join(JoinType::InnerJoin, book::Relation::Reviews.def())
        .group_by(BookColumn::Id)
        .group_by(BookColumn::Title)
        .group_by(BookColumn::Author)
        .group_by(BookColumn::PublishedDate)
        .group_by(BookColumn::PublisherId)
}

/// Every store with the number of books it sells, most stocked first
pub async fn store_books_count<C: ConnectionTrait>(db: &C) -> Result<Vec<StoreBookCount>> {
    store_counts(JoinType::LeftJoin)
        .order_by(store_books_count_expr(), Order::Desc)
        .order_by_asc(StoreColumn::Name)
        .into_model::<StoreBookCount>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Stores selling books published after `date`, counting only those books,
/// most such books first. `min_books` drops stores below that count.
pub async fn stores_with_books_after_date<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
    min_books: Option<i64>,
) -> Result<Vec<StoreBookCount>> {
    let mut query = store_counts(JoinType::InnerJoin)
        .join(JoinType::InnerJoin, book_store::Relation::Book.def())
        .filter(BookColumn::PublishedDate.gt(date));

    if let Some(min_books) = min_books {
        query = query.having(Expr::expr(store_books_count_expr()).gte(min_books));
    }

    query
        .order_by(store_books_count_expr(), Order::Desc)
        .order_by_asc(StoreColumn::Name)
        .into_model::<StoreBookCount>()
        .all(db)
        .await
        .map_err(Into::into)
}

fn store_counts(join: JoinType) -> Select<StoreEntity> {
    StoreEntity::find()
        .select_only()
        .columns([StoreColumn::Id, StoreColumn::Name, StoreColumn::City])
        .column_as(store_books_count_expr(), "books_count")
        .join(join, store::Relation::BookStores.def())
        .group_by(StoreColumn::Id)
        .group_by(StoreColumn::Name)
        .group_by(StoreColumn::City)
}

/// Totals across the whole library
pub async fn library_statistics<C: ConnectionTrait>(db: &C) -> Result<LibraryStatistics> {
    let total_books = BookEntity::find().count(db).await?;
    let total_reviews = ReviewEntity::find().count(db).await?;

    let average: Option<Option<f64>> = ReviewEntity::find()
        .select_only()
        .column_as(avg_rating_expr(), "avg_rating")
        .into_tuple()
        .one(db)
        .await?;

    Ok(LibraryStatistics {
        total_books,
        total_reviews,
        average_rating: round2(average.flatten().unwrap_or(0.0)),
    })
}

// ============================================================================
// Eager loading
// ============================================================================

/// Books with their publisher, one query per book
pub async fn books_with_publisher_lazy<C: ConnectionTrait>(db: &C) -> Result<Vec<(Book, Option<Publisher>)>> {
    let books = books_ordered().all(db).await?;
    let mut out = Vec::with_capacity(books.len());
    for book in books {
        let publisher = book.find_related(PublisherEntity).one(db).await?;
        out.push((book, publisher));
    }
    Ok(out)
}

/// Books with their publisher in a single joined query
pub async fn books_with_publisher<C: ConnectionTrait>(db: &C) -> Result<Vec<(Book, Option<Publisher>)>> {
    books_ordered()
        .find_also_related(PublisherEntity)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Books with their stores, one query per book
pub async fn books_with_stores_lazy<C: ConnectionTrait>(db: &C) -> Result<Vec<(Book, Vec<Store>)>> {
    let books = books_ordered().all(db).await?;
    let mut out = Vec::with_capacity(books.len());
    for book in books {
        let mut stores = book.find_related(StoreEntity).all(db).await?;
        sort_stores(&mut stores);
        out.push((book, stores));
    }
    Ok(out)
}

/// Books with their stores, one batched query for all stores
pub async fn books_with_stores<C: ConnectionTrait>(db: &C) -> Result<Vec<(Book, Vec<Store>)>> {
    let books = books_ordered().all(db).await?;
    let stores = books.load_many_to_many(StoreEntity, BookStoreEntity, db).await?;
    Ok(books
        .into_iter()
        .zip(stores)
        .map(|(book, mut stores)| {
            sort_stores(&mut stores);
            (book, stores)
        })
        .collect())
}

/// Books with their reviews, one query per book
pub async fn books_with_reviews_lazy<C: ConnectionTrait>(db: &C) -> Result<Vec<(Book, Vec<Review>)>> {
    let books = books_ordered().all(db).await?;
    let mut out = Vec::with_capacity(books.len());
    for book in books {
        let mut reviews = book.find_related(ReviewEntity).all(db).await?;
        sort_reviews(&mut reviews);
        out.push((book, reviews));
    }
    Ok(out)
}

/// Books with their reviews, one batched query for all reviews
pub async fn books_with_reviews<C: ConnectionTrait>(db: &C) -> Result<Vec<(Book, Vec<Review>)>> {
    let books = books_ordered().all(db).await?;
    let reviews = books.load_many(ReviewEntity, db).await?;
    Ok(books
        .into_iter()
        .zip(reviews)
        .map(|(book, mut reviews)| {
            sort_reviews(&mut reviews);
            (book, reviews)
        })
        .collect())
}

/// Books with publisher, stores and reviews, three queries per book
pub async fn books_fully_loaded_lazy<C: ConnectionTrait>(db: &C) -> Result<Vec<BookBundle>> {
    let books = books_ordered().all(db).await?;
    let mut out = Vec::with_capacity(books.len());
    for book in books {
        let publisher = book.find_related(PublisherEntity).one(db).await?;
        let mut stores = book.find_related(StoreEntity).all(db).await?;
        let mut reviews = book.find_related(ReviewEntity).all(db).await?;
        sort_stores(&mut stores);
        sort_reviews(&mut reviews);
        out.push(BookBundle { book, publisher, stores, reviews });
    }
    Ok(out)
}

/// Books with publisher, stores and reviews in three queries overall
pub async fn books_fully_loaded<C: ConnectionTrait>(db: &C) -> Result<Vec<BookBundle>> {
    let rows = books_ordered().find_also_related(PublisherEntity).all(db).await?;
    let (books, publishers): (Vec<Book>, Vec<Option<Publisher>>) = rows.into_iter().unzip();
    bundle_books(db, books, publishers).await
}

/// Bundle relations for books already loaded, two batched queries
pub async fn bundle_books<C: ConnectionTrait>(
    db: &C,
    books: Vec<Book>,
    publishers: Vec<Option<Publisher>>,
) -> Result<Vec<BookBundle>> {
    let stores = books.load_many_to_many(StoreEntity, BookStoreEntity, db).await?;
    let reviews = books.load_many(ReviewEntity, db).await?;

    Ok(books
        .into_iter()
        .zip(publishers)
        .zip(stores.into_iter().zip(reviews))
        .map(|((book, publisher), (mut stores, mut reviews))| {
            sort_stores(&mut stores);
            sort_reviews(&mut reviews);
            BookBundle { book, publisher, stores, reviews }
        })
        .collect())
}

/// Books already filtered by the caller, with all relations
pub async fn bundle_selected<C: ConnectionTrait>(db: &C, select: Select<BookEntity>) -> Result<Vec<BookBundle>> {
    let rows = select.find_also_related(PublisherEntity).all(db).await?;
    let (books, publishers): (Vec<Book>, Vec<Option<Publisher>>) = rows.into_iter().unzip();
    bundle_books(db, books, publishers).await
}

/// Stores with their books, one query per store
pub async fn stores_with_books_lazy<C: ConnectionTrait>(db: &C) -> Result<Vec<(Store, Vec<Book>)>> {
    let stores = stores_ordered().all(db).await?;
    let mut out = Vec::with_capacity(stores.len());
    for store in stores {
        let mut books = store.find_related(BookEntity).all(db).await?;
        sort_books(&mut books);
        out.push((store, books));
    }
    Ok(out)
}

/// Stores with their books, one batched query for all books
pub async fn stores_with_books<C: ConnectionTrait>(db: &C) -> Result<Vec<(Store, Vec<Book>)>> {
    let stores = stores_ordered().all(db).await?;
    let books = stores.load_many_to_many(BookEntity, BookStoreEntity, db).await?;
    Ok(stores
        .into_iter()
        .zip(books)
        .map(|(store, mut books)| {
            sort_books(&mut books);
            (store, books)
        })
        .collect())
}

/// Stores in default order: by city, then name
pub fn stores_ordered() -> Select<StoreEntity> {
    StoreEntity::find()
        .order_by_asc(StoreColumn::City)
        .order_by_asc(StoreColumn::Name)
        .order_by_asc(StoreColumn::Id)
}
