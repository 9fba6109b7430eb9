//! Publishers, stores, books and reviews

use super::{now, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::queries::library::{self, BookBundle, LibraryStatistics};
use crate::queries::{icontains, parse_ordering, round2};
use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// `?search=` and `?ordering=` accepted by list endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive substring matched against the searchable fields
    pub search: Option<String>,
    /// Field name, `-` prefix for descending
    pub ordering: Option<String>,
}

impl ListParams {
    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn ordering(&self) -> Option<&str> {
        self.ordering.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult, ToSchema)]
pub struct PublisherWithCount {
    pub id: i32,
    pub name: String,
    pub country: String,
    pub books_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult, ToSchema)]
pub struct StoreWithCount {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub books_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PublisherInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PublisherChanges {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
}

impl From<PublisherInput> for PublisherChanges {
    fn from(input: PublisherInput) -> Self {
        Self { name: Some(input.name), country: Some(input.country) }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StoreInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct StoreChanges {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
}

impl From<StoreInput> for StoreChanges {
    fn from(input: StoreInput) -> Self {
        Self { name: Some(input.name), city: Some(input.city) }
    }
}

/// Book as listed: publisher flattened, stores inline, review aggregate
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookListItem {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    pub description: String,
    pub publisher: i32,
    pub publisher_name: Option<String>,
    pub publisher_country: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub stores: Vec<Store>,
    pub reviews_count: usize,
    pub avg_rating: Option<f64>,
}

/// Book detail: the list item plus its reviews
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: BookListItem,
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReviewView {
    pub id: i32,
    pub book: i32,
    pub book_title: String,
    pub rating: i32,
    pub text: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl ReviewView {
    fn new(review: Review, book_title: String) -> Self {
        Self {
            id: review.id,
            book: review.book_id,
            book_title,
            rating: review.rating,
            text: review.text,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    pub published_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    /// Publisher ID
    pub publisher: i32,
    /// Stores selling the book
    #[serde(default)]
    pub store_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookChanges {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub author: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub publisher: Option<i32>,
    /// Replaces the store links when present
    pub store_ids: Option<Vec<i32>>,
}

impl From<BookInput> for BookChanges {
    fn from(input: BookInput) -> Self {
        Self {
            title: Some(input.title),
            author: Some(input.author),
            published_date: Some(input.published_date),
            description: Some(input.description),
            publisher: Some(input.publisher),
            store_ids: Some(input.store_ids),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewInput {
    /// Book ID
    pub book: i32,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ReviewChanges {
    pub book: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub text: Option<String>,
}

impl From<ReviewInput> for ReviewChanges {
    fn from(input: ReviewInput) -> Self {
        Self { book: Some(input.book), rating: Some(input.rating), text: Some(input.text) }
    }
}

impl From<BookBundle> for BookListItem {
    fn from(bundle: BookBundle) -> Self {
        let BookBundle { book, publisher, stores, reviews } = bundle;
        let avg_rating = (!reviews.is_empty()).then(|| {
            let sum: i32 = reviews.iter().map(|r| r.rating).sum();
            round2(f64::from(sum) / reviews.len() as f64)
        });

        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            published_date: book.published_date,
            description: book.description,
            publisher: book.publisher_id,
            publisher_name: publisher.as_ref().map(|p| p.name.clone()),
            publisher_country: publisher.map(|p| p.country),
            stores,
            reviews_count: reviews.len(),
            avg_rating,
        }
    }
}

impl From<BookBundle> for BookDetail {
    fn from(bundle: BookBundle) -> Self {
        let reviews = bundle
            .reviews
            .iter()
            .cloned()
            .map(|review| ReviewView::new(review, bundle.book.title.clone()))
            .collect();
        Self { book: bundle.into(), reviews }
    }
}

fn publishers_with_counts() -> Select<PublisherEntity> {
    PublisherEntity::find()
        .select_only()
        .columns([PublisherColumn::Id, PublisherColumn::Name, PublisherColumn::Country])
        .column_as(Expr::col((BookEntity, BookColumn::Id)).count(), "books_count")
        .join(JoinType::LeftJoin, publisher::Relation::Books.def())
        .group_by(PublisherColumn::Id)
        .group_by(PublisherColumn::Name)
        .group_by(PublisherColumn::Country)
}

fn stores_with_counts() -> Select<StoreEntity> {
    StoreEntity::find()
        .select_only()
        .columns([StoreColumn::Id, StoreColumn::Name, StoreColumn::City])
        .column_as(Expr::col((BookStoreEntity, BookStoreColumn::BookId)).count(), "books_count")
        .join(JoinType::LeftJoin, store::Relation::BookStores.def())
        .group_by(StoreColumn::Id)
        .group_by(StoreColumn::Name)
        .group_by(StoreColumn::City)
}

async fn ensure_publisher<C: ConnectionTrait>(db: &C, id: i32) -> Result<()> {
    if PublisherEntity::find_by_id(id).one(db).await?.is_none() {
        return Err(AppError::invalid_field(
            "publisher",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        ));
    }
    Ok(())
}

async fn ensure_book<C: ConnectionTrait>(db: &C, id: i32) -> Result<Book> {
    BookEntity::find_by_id(id).one(db).await?.ok_or_else(|| {
        AppError::invalid_field("book", format!("Invalid pk \"{}\" - object does not exist.", id))
    })
}

/// Replace the store links of a book; every store must exist
async fn link_stores<C: ConnectionTrait>(db: &C, book_id: i32, store_ids: &[i32]) -> Result<()> {
    let wanted: BTreeSet<i32> = store_ids.iter().copied().collect();

    if !wanted.is_empty() {
        let found: Vec<i32> = StoreEntity::find()
            .select_only()
            .column(StoreColumn::Id)
            .filter(StoreColumn::Id.is_in(wanted.iter().copied()))
            .into_tuple()
            .all(db)
            .await?;
        if let Some(missing) = wanted.iter().find(|id| !found.contains(id)) {
            return Err(AppError::invalid_field(
                "store_ids",
                format!("Invalid pk \"{}\" - object does not exist.", missing),
            ));
        }
    }

    BookStoreEntity::delete_many()
        .filter(BookStoreColumn::BookId.eq(book_id))
        .exec(db)
        .await?;

    if !wanted.is_empty() {
        let links = wanted.into_iter().map(|store_id| BookStoreActiveModel {
            book_id: Set(book_id),
            store_id: Set(store_id),
        });
        BookStoreEntity::insert_many(links).exec_without_returning(db).await?;
    }

    Ok(())
}

// Lookups take the connection so writes can read their own rows back from the
// primary instead of a lagging replica.

async fn publisher_on<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<PublisherWithCount>> {
    publishers_with_counts()
        .filter(PublisherColumn::Id.eq(id))
        .into_model::<PublisherWithCount>()
        .one(db)
        .await
        .map_err(Into::into)
}

async fn store_on<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<StoreWithCount>> {
    stores_with_counts()
        .filter(StoreColumn::Id.eq(id))
        .into_model::<StoreWithCount>()
        .one(db)
        .await
        .map_err(Into::into)
}

async fn book_on<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<BookDetail>> {
    let select = BookEntity::find().filter(BookColumn::Id.eq(id));
    let bundle = library::bundle_selected(db, select).await?.into_iter().next();
    Ok(bundle.map(Into::into))
}

async fn review_on<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<ReviewView>> {
    let row = ReviewEntity::find_by_id(id)
        .find_also_related(BookEntity)
        .one(db)
        .await?;
    Ok(row.map(|(review, book)| ReviewView::new(review, book.map(|b| b.title).unwrap_or_default())))
}

impl Repository {
    // ========================================================================
    // Publisher Operations
    // ========================================================================

    /// Publishers with book counts; search on name and country
    pub async fn list_publishers(&self, params: &ListParams) -> Result<Vec<PublisherWithCount>> {
        let mut query = publishers_with_counts();

        if let Some(term) = params.search_term() {
            query = query.filter(
                Condition::any()
                    .add(icontains((PublisherEntity, PublisherColumn::Name), term))
                    .add(icontains((PublisherEntity, PublisherColumn::Country), term)),
            );
        }

        query = match parse_ordering(params.ordering(), &["name", "country"]) {
            Some(("country", dir)) => query.order_by(PublisherColumn::Country, dir.into()),
            Some((_, dir)) => query.order_by(PublisherColumn::Name, dir.into()),
            None => query.order_by_asc(PublisherColumn::Name),
        };

        query
            .order_by_asc(PublisherColumn::Id)
            .into_model::<PublisherWithCount>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_publisher(&self, id: i32) -> Result<Option<PublisherWithCount>> {
        publisher_on(self.read_conn(), id).await
    }

    pub async fn create_publisher(&self, input: PublisherInput) -> Result<PublisherWithCount> {
        let publisher = PublisherActiveModel {
            name: Set(input.name),
            country: Set(input.country),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await?;

        info!(publisher_id = publisher.id, "Publisher created");
        Ok(PublisherWithCount {
            id: publisher.id,
            name: publisher.name,
            country: publisher.country,
            books_count: 0,
        })
    }

    pub async fn update_publisher(&self, id: i32, changes: PublisherChanges) -> Result<PublisherWithCount> {
        let mut publisher = PublisherEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::not_found("Publisher", id))?
            .into_active_model();

        if let Some(name) = changes.name {
            publisher.name = Set(name);
        }
        if let Some(country) = changes.country {
            publisher.country = Set(country);
        }
        publisher.update(self.write_conn()).await?;

        publisher_on(self.write_conn(), id)
            .await?
            .ok_or_else(|| AppError::not_found("Publisher", id))
    }

    /// Delete a publisher; its books go with it
    pub async fn delete_publisher(&self, id: i32) -> Result<bool> {
        let result = PublisherEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Books of one publisher in default order
    pub async fn publisher_books(&self, id: i32) -> Result<Vec<BookListItem>> {
        let db = self.read_conn();
        if PublisherEntity::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::not_found("Publisher", id));
        }

        let select = library::books_ordered().filter(BookColumn::PublisherId.eq(id));
        Ok(library::bundle_selected(db, select).await?.into_iter().map(Into::into).collect())
    }

    // ========================================================================
    // Store Operations
    // ========================================================================

    /// Stores with book counts; search on name and city
    pub async fn list_stores(&self, params: &ListParams) -> Result<Vec<StoreWithCount>> {
        let mut query = stores_with_counts();

        if let Some(term) = params.search_term() {
            query = query.filter(
                Condition::any()
                    .add(icontains((StoreEntity, StoreColumn::Name), term))
                    .add(icontains((StoreEntity, StoreColumn::City), term)),
            );
        }

        query = match parse_ordering(params.ordering(), &["name", "city"]) {
            Some(("city", dir)) => query.order_by(StoreColumn::City, dir.into()),
            Some((_, dir)) => query.order_by(StoreColumn::Name, dir.into()),
            None => query.order_by_asc(StoreColumn::City).order_by_asc(StoreColumn::Name),
        };

        query
            .order_by_asc(StoreColumn::Id)
            .into_model::<StoreWithCount>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_store(&self, id: i32) -> Result<Option<StoreWithCount>> {
        store_on(self.read_conn(), id).await
    }

    pub async fn create_store(&self, input: StoreInput) -> Result<StoreWithCount> {
        let store = StoreActiveModel {
            name: Set(input.name),
            city: Set(input.city),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await?;

        info!(store_id = store.id, "Store created");
        Ok(StoreWithCount { id: store.id, name: store.name, city: store.city, books_count: 0 })
    }

    pub async fn update_store(&self, id: i32, changes: StoreChanges) -> Result<StoreWithCount> {
        let mut store = StoreEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::not_found("Store", id))?
            .into_active_model();

        if let Some(name) = changes.name {
            store.name = Set(name);
        }
        if let Some(city) = changes.city {
            store.city = Set(city);
        }
        store.update(self.write_conn()).await?;

        store_on(self.write_conn(), id).await?.ok_or_else(|| AppError::not_found("Store", id))
    }

    pub async fn delete_store(&self, id: i32) -> Result<bool> {
        let result = StoreEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Books sold by one store in default order
    pub async fn store_books(&self, id: i32) -> Result<Vec<BookListItem>> {
        let db = self.read_conn();
        if StoreEntity::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::not_found("Store", id));
        }

        let select = library::books_ordered()
            .join(JoinType::InnerJoin, book::Relation::BookStores.def())
            .filter(BookStoreColumn::StoreId.eq(id));
        Ok(library::bundle_selected(db, select).await?.into_iter().map(Into::into).collect())
    }

    // ========================================================================
    // Book Operations
    // ========================================================================

    /// Books with publisher, stores and rating; search on title, author and
    /// description
    pub async fn list_books(&self, params: &ListParams) -> Result<Vec<BookListItem>> {
        let mut query = BookEntity::find();

        if let Some(term) = params.search_term() {
            query = query.filter(
                Condition::any()
                    .add(icontains((BookEntity, BookColumn::Title), term))
                    .add(icontains((BookEntity, BookColumn::Author), term))
                    .add(icontains((BookEntity, BookColumn::Description), term)),
            );
        }

        query = match parse_ordering(params.ordering(), &["title", "author", "published_date"]) {
            Some(("title", dir)) => query.order_by(BookColumn::Title, dir.into()),
            Some(("author", dir)) => query.order_by(BookColumn::Author, dir.into()),
            Some((_, dir)) => query.order_by(BookColumn::PublishedDate, dir.into()),
            None => query
                .order_by_desc(BookColumn::PublishedDate)
                .order_by_asc(BookColumn::Title),
        };

        let bundles = library::bundle_selected(self.read_conn(), query.order_by_asc(BookColumn::Id)).await?;
        Ok(bundles.into_iter().map(Into::into).collect())
    }

    /// Book with publisher, stores and reviews
    pub async fn find_book(&self, id: i32) -> Result<Option<BookDetail>> {
        book_on(self.read_conn(), id).await
    }

    pub async fn create_book(&self, input: BookInput) -> Result<BookDetail> {
        let txn = self.write_conn().begin().await?;

        ensure_publisher(&txn, input.publisher).await?;

        let book = BookActiveModel {
            title: Set(input.title),
            author: Set(input.author),
            published_date: Set(input.published_date),
            description: Set(input.description),
            publisher_id: Set(input.publisher),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        link_stores(&txn, book.id, &input.store_ids).await?;
        let detail = book_on(&txn, book.id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", book.id))?;
        txn.commit().await?;

        info!(book_id = book.id, stores = input.store_ids.len(), "Book created");
        Ok(detail)
    }

    pub async fn update_book(&self, id: i32, changes: BookChanges) -> Result<BookDetail> {
        let txn = self.write_conn().begin().await?;

        let mut book = BookEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))?
            .into_active_model();

        if let Some(title) = changes.title {
            book.title = Set(title);
        }
        if let Some(author) = changes.author {
            book.author = Set(author);
        }
        if let Some(published_date) = changes.published_date {
            book.published_date = Set(published_date);
        }
        if let Some(description) = changes.description {
            book.description = Set(description);
        }
        if let Some(publisher) = changes.publisher {
            ensure_publisher(&txn, publisher).await?;
            book.publisher_id = Set(publisher);
        }
        book.update(&txn).await?;

        if let Some(ref store_ids) = changes.store_ids {
            link_stores(&txn, id, store_ids).await?;
        }
        let detail = book_on(&txn, id).await?.ok_or_else(|| AppError::not_found("Book", id))?;
        txn.commit().await?;

        Ok(detail)
    }

    /// Delete a book with its reviews and store links
    pub async fn delete_book(&self, id: i32) -> Result<bool> {
        let result = BookEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Best rated books having at least `min_reviews` reviews
    pub async fn top_rated_books(&self, min_reviews: i64, limit: u64) -> Result<Vec<BookListItem>> {
        let db = self.read_conn();
        let ranked = library::top_rated_books(db, min_reviews, limit).await?;
        let ids: Vec<i32> = ranked.iter().map(|b| b.id).collect();

        let select = BookEntity::find().filter(BookColumn::Id.is_in(ids.clone()));
        let mut by_id: HashMap<i32, BookBundle> = library::bundle_selected(db, select)
            .await?
            .into_iter()
            .map(|bundle| (bundle.book.id, bundle))
            .collect();

        Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).map(Into::into).collect())
    }

    pub async fn library_statistics(&self) -> Result<LibraryStatistics> {
        library::library_statistics(self.read_conn()).await
    }

    // ========================================================================
    // Review Operations
    // ========================================================================

    /// Reviews newest first; search on review text and book title
    pub async fn list_reviews(&self, params: &ListParams) -> Result<Vec<ReviewView>> {
        let mut query = ReviewEntity::find().find_also_related(BookEntity);

        if let Some(term) = params.search_term() {
            query = query.filter(
                Condition::any()
                    .add(icontains((ReviewEntity, ReviewColumn::Text), term))
                    .add(icontains((BookEntity, BookColumn::Title), term)),
            );
        }

        query = match parse_ordering(params.ordering(), &["created_at", "rating"]) {
            Some(("rating", dir)) => query.order_by(ReviewColumn::Rating, dir.into()),
            Some((_, dir)) => query.order_by(ReviewColumn::CreatedAt, dir.into()),
            None => query.order_by_desc(ReviewColumn::CreatedAt),
        };

        let rows = query.order_by_desc(ReviewColumn::Id).all(self.read_conn()).await?;
        Ok(rows
            .into_iter()
            .map(|(review, book)| ReviewView::new(review, book.map(|b| b.title).unwrap_or_default()))
            .collect())
    }

    pub async fn find_review(&self, id: i32) -> Result<Option<ReviewView>> {
        review_on(self.read_conn(), id).await
    }

    pub async fn create_review(&self, input: ReviewInput) -> Result<ReviewView> {
        let db = self.write_conn();
        let book = ensure_book(db, input.book).await?;

        let review = ReviewActiveModel {
            book_id: Set(book.id),
            rating: Set(input.rating),
            text: Set(input.text),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(review_id = review.id, book_id = book.id, rating = review.rating, "Review created");
        Ok(ReviewView::new(review, book.title))
    }

    pub async fn update_review(&self, id: i32, changes: ReviewChanges) -> Result<ReviewView> {
        let db = self.write_conn();
        let mut review = ReviewEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Review", id))?
            .into_active_model();

        if let Some(book) = changes.book {
            ensure_book(db, book).await?;
            review.book_id = Set(book);
        }
        if let Some(rating) = changes.rating {
            review.rating = Set(rating);
        }
        if let Some(text) = changes.text {
            review.text = Set(text);
        }
        review.update(db).await?;

        review_on(db, id).await?.ok_or_else(|| AppError::not_found("Review", id))
    }

    pub async fn delete_review(&self, id: i32) -> Result<bool> {
        let result = ReviewEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
