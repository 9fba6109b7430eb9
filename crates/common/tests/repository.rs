//! Repository CRUD round trips for articles, the library and accounts.

mod support;

use bookshop_common::auth::Role;
use bookshop_common::db::*;
use bookshop_common::errors::AppError;
use bookshop_common::seed::{self, FIXTURE_PASSWORD, MANAGER_USERNAME};
use chrono::NaiveDate;
use support::{empty_pool, lagging_replica_pool, seeded_pool};
use tokio_test::assert_ok;

fn article(title: &str) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        content: "Some content".to_string(),
        author: "Ann".to_string(),
        is_published: false,
    }
}

#[tokio::test]
async fn article_crud_round_trip() {
    let repo = Repository::new(empty_pool().await);

    let created = assert_ok!(repo.create_article(article("First post")).await);
    assert!(!created.is_published);
    assert_eq!(created.created_at, created.updated_at);

    let found = assert_ok!(repo.find_article(created.id).await).unwrap();
    assert_eq!(found, created);

    let patched = assert_ok!(
        repo.patch_article(
            created.id,
            ArticleChanges { is_published: Some(true), ..Default::default() }
        )
        .await
    );
    assert!(patched.is_published);
    assert_eq!(patched.title, "First post");
    assert!(patched.updated_at >= created.updated_at);
    assert_eq!(patched.created_at, created.created_at);

    let replaced = assert_ok!(repo.update_article(created.id, article("Second title")).await);
    assert_eq!(replaced.title, "Second title");
    // PUT resets fields the body leaves at their default
    assert!(!replaced.is_published);

    assert!(assert_ok!(repo.delete_article(created.id).await));
    assert!(assert_ok!(repo.find_article(created.id).await).is_none());
    assert!(!assert_ok!(repo.delete_article(created.id).await));
}

#[tokio::test]
async fn articles_list_newest_first() {
    let repo = Repository::new(empty_pool().await);
    let first = assert_ok!(repo.create_article(article("Older article")).await);
    let second = assert_ok!(repo.create_article(article("Newer article")).await);

    let ids: Vec<i32> = assert_ok!(repo.list_articles().await).iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn patching_missing_article_is_not_found() {
    let repo = Repository::new(empty_pool().await);
    let err = repo.patch_article(404, ArticleChanges::default()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let pool = seeded_pool().await;
    let again = assert_ok!(seed::seed(pool.write()).await);
    assert_eq!(again.total(), 0);

    let repo = Repository::new(pool);
    assert_eq!(assert_ok!(repo.list_books(&ListParams::default()).await).len(), 6);
}

#[tokio::test]
async fn publisher_list_search_and_ordering() {
    let repo = Repository::new(seeded_pool().await);

    let all = assert_ok!(repo.list_publishers(&ListParams::default()).await);
    let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Bloomsbury", "Eksmo", "Gallimard", "HarperCollins", "Penguin Random House"]
    );
    let penguin = all.iter().find(|p| p.name == "Penguin Random House").unwrap();
    assert_eq!(penguin.books_count, 2);

    let params = ListParams { search: Some("usa".into()), ordering: Some("-name".into()) };
    let usa = assert_ok!(repo.list_publishers(&params).await);
    let names: Vec<&str> = usa.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Penguin Random House", "HarperCollins"]);

    // unknown ordering fields are ignored
    let params = ListParams { search: None, ordering: Some("password".into()) };
    assert_eq!(assert_ok!(repo.list_publishers(&params).await), all);
}

#[tokio::test]
async fn book_create_with_stores_and_update() {
    let repo = Repository::new(seeded_pool().await);
    let publisher = assert_ok!(
        repo.create_publisher(PublisherInput { name: "Tor".into(), country: "USA".into() }).await
    );
    let stores = assert_ok!(repo.list_stores(&ListParams::default()).await);
    let store_ids: Vec<i32> = stores.iter().take(2).map(|s| s.id).collect();

    let book = assert_ok!(
        repo.create_book(BookInput {
            title: "Mistborn".into(),
            author: "Brandon Sanderson".into(),
            published_date: NaiveDate::from_ymd_opt(2006, 7, 17).unwrap(),
            description: String::new(),
            publisher: publisher.id,
            store_ids: store_ids.clone(),
        })
        .await
    );
    assert_eq!(book.book.publisher_name.as_deref(), Some("Tor"));
    assert_eq!(book.book.stores.len(), 2);
    assert_eq!(book.book.avg_rating, None);
    assert!(book.reviews.is_empty());

    let updated = assert_ok!(
        repo.update_book(
            book.book.id,
            BookChanges { store_ids: Some(vec![store_ids[0]]), ..Default::default() }
        )
        .await
    );
    assert_eq!(updated.book.stores.len(), 1);
    assert_eq!(updated.book.title, "Mistborn");

    let publisher = assert_ok!(repo.find_publisher(publisher.id).await).unwrap();
    assert_eq!(publisher.books_count, 1);
}

#[tokio::test]
async fn book_with_unknown_store_is_rejected_without_side_effects() {
    let repo = Repository::new(seeded_pool().await);
    let publishers = assert_ok!(repo.list_publishers(&ListParams::default()).await);

    let err = repo
        .create_book(BookInput {
            title: "Ghost".into(),
            author: "Nobody".into(),
            published_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            description: String::new(),
            publisher: publishers[0].id,
            store_ids: vec![9999],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "store_ids"));

    let params = ListParams { search: Some("ghost".into()), ordering: None };
    assert!(assert_ok!(repo.list_books(&params).await).is_empty());
}

#[tokio::test]
async fn book_detail_includes_reviews_and_rating() {
    let repo = Repository::new(seeded_pool().await);
    let params = ListParams { search: Some("orwell".into()), ordering: None };
    let listed = assert_ok!(repo.list_books(&params).await);
    assert_eq!(listed.len(), 1);

    let detail = assert_ok!(repo.find_book(listed[0].id).await).unwrap();
    assert_eq!(detail.book.title, "1984");
    assert_eq!(detail.reviews.len(), 3);
    assert_eq!(detail.book.reviews_count, 3);
    assert_eq!(detail.book.avg_rating, Some(4.67));
    assert!(detail.reviews.iter().all(|r| r.book_title == "1984"));
}

#[tokio::test]
async fn book_ordering_by_title() {
    let repo = Repository::new(seeded_pool().await);
    let params = ListParams { search: None, ordering: Some("title".into()) };
    let books = assert_ok!(repo.list_books(&params).await);
    assert_eq!(books.first().map(|b| b.title.as_str()), Some("1984"));
    assert_eq!(books.last().map(|b| b.title.as_str()), Some("The Stranger"));
}

#[tokio::test]
async fn deleting_book_removes_its_reviews() {
    let repo = Repository::new(seeded_pool().await);
    let params = ListParams { search: Some("The Road".into()), ordering: None };
    let road = assert_ok!(repo.list_books(&params).await).remove(0);

    assert!(assert_ok!(repo.delete_book(road.id).await));
    let reviews = assert_ok!(
        repo.list_reviews(&ListParams { search: Some("The Road".into()), ordering: None }).await
    );
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn review_search_covers_book_title() {
    let repo = Repository::new(seeded_pool().await);

    let params = ListParams { search: Some("brave".into()), ordering: Some("-rating".into()) };
    let reviews = assert_ok!(repo.list_reviews(&params).await);
    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![4, 3]);

    let book = reviews[0].book;
    let created = assert_ok!(
        repo.create_review(ReviewInput { book, rating: 5, text: "Chilling".into() }).await
    );
    assert_eq!(created.book_title, "Brave New World");

    let err = repo
        .create_review(ReviewInput { book: 9999, rating: 5, text: "?".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn store_books_lists_stock_of_one_store() {
    let repo = Repository::new(seeded_pool().await);
    let params = ListParams { search: Some("biblio".into()), ordering: None };
    let store = assert_ok!(repo.list_stores(&params).await).remove(0);
    assert_eq!(store.books_count, 3);

    let books = assert_ok!(repo.store_books(store.id).await);
    assert_eq!(books.len(), 3);
    assert!(books.iter().all(|b| b.stores.iter().any(|s| s.id == store.id)));

    assert!(matches!(repo.store_books(9999).await, Err(AppError::NotFound { .. })));
}

#[tokio::test]
async fn credentials_are_checked_against_argon2_hash() {
    let repo = Repository::new(seeded_pool().await);

    let user = assert_ok!(repo.verify_credentials(MANAGER_USERNAME, FIXTURE_PASSWORD).await);
    assert_eq!(Role::parse(&user.role), Role::Manager);
    assert_ne!(user.password_hash, FIXTURE_PASSWORD);

    let err = repo.verify_credentials(MANAGER_USERNAME, "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    let err = repo.verify_credentials("ghost", FIXTURE_PASSWORD).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    let err = repo.create_user(MANAGER_USERNAME, "another-pass", Role::User).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn writes_read_back_from_primary_when_replica_lags() {
    let repo = Repository::new(lagging_replica_pool().await);

    let publisher = assert_ok!(
        repo.create_publisher(PublisherInput { name: "Orbit".into(), country: "UK".into() }).await
    );
    let store = assert_ok!(repo.create_store(StoreInput { name: "Corner".into(), city: "Leeds".into() }).await);

    let book = assert_ok!(
        repo.create_book(BookInput {
            title: "Leviathan Wakes".into(),
            author: "James S. A. Corey".into(),
            published_date: NaiveDate::from_ymd_opt(2011, 6, 2).unwrap(),
            description: String::new(),
            publisher: publisher.id,
            store_ids: vec![store.id],
        })
        .await
    );
    assert_eq!(book.book.stores.len(), 1);

    let book = assert_ok!(
        repo.update_book(
            book.book.id,
            BookChanges { title: Some("Caliban's War".into()), ..Default::default() }
        )
        .await
    );
    assert_eq!(book.book.title, "Caliban's War");

    let publisher = assert_ok!(
        repo.update_publisher(publisher.id, PublisherChanges { country: Some("US".into()), ..Default::default() })
            .await
    );
    assert_eq!((publisher.country.as_str(), publisher.books_count), ("US", 1));

    let store = assert_ok!(
        repo.update_store(store.id, StoreChanges { city: Some("York".into()), ..Default::default() }).await
    );
    assert_eq!((store.city.as_str(), store.books_count), ("York", 1));

    let review = assert_ok!(
        repo.create_review(ReviewInput { book: book.book.id, rating: 4, text: "Solid".into() }).await
    );
    let review = assert_ok!(
        repo.update_review(review.id, ReviewChanges { rating: Some(5), ..Default::default() }).await
    );
    assert_eq!(review.rating, 5);

    // the replica has not seen the account yet; the primary has
    let err = repo.create_user(MANAGER_USERNAME, "another-pass", Role::Manager).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "username"));
}
