//! Shop flows: category tree, product filtering, cart, checkout and order
//! lifecycle, plus the shop query helpers.

mod support;

use bookshop_common::db::models::{CategoryEntity, OrderStatus};
use bookshop_common::db::*;
use bookshop_common::errors::AppError;
use bookshop_common::queries::shop;
use bookshop_common::seed::CUSTOMER_USERNAME;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use support::seeded_pool;
use tokio_test::assert_ok;

async fn customer_id(repo: &Repository) -> i32 {
    assert_ok!(repo.find_user_by_username(CUSTOMER_USERNAME).await).unwrap().id
}

async fn product_id(repo: &Repository, name: &str) -> i32 {
    let query = ProductQuery { search: Some(name.to_string()), ..Default::default() };
    assert_ok!(repo.list_products(&query).await)
        .into_iter()
        .find(|p| p.name == name)
        .unwrap()
        .id
}

async fn category_id(repo: &Repository, name: &str) -> i32 {
    assert_ok!(repo.list_categories().await)
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
        .id
}

fn names(products: &[shop::ProductOrderCount]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

#[tokio::test]
async fn category_descendants_walk_the_tree() {
    let repo = Repository::new(seeded_pool().await);
    let electronics = category_id(&repo, "Electronics").await;
    let phones = category_id(&repo, "Phones").await;
    let smartphones = category_id(&repo, "Smartphones").await;

    let ids = assert_ok!(repo.category_descendants(electronics).await);
    assert_eq!(ids, vec![electronics, phones, smartphones]);

    let leaf = assert_ok!(repo.category_descendants(smartphones).await);
    assert_eq!(leaf, vec![smartphones]);
}

#[tokio::test]
async fn category_descendants_terminate_on_cycles() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let electronics = category_id(&repo, "Electronics").await;
    let smartphones = category_id(&repo, "Smartphones").await;

    // corrupt the tree behind the repository's back
    let mut root = CategoryEntity::find_by_id(electronics)
        .one(pool.write())
        .await
        .unwrap()
        .unwrap()
        .into_active_model();
    root.parent_id = Set(Some(smartphones));
    root.update(pool.write()).await.unwrap();

    let ids = assert_ok!(repo.category_descendants(electronics).await);
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn category_cannot_move_under_its_descendant() {
    let repo = Repository::new(seeded_pool().await);
    let electronics = category_id(&repo, "Electronics").await;
    let smartphones = category_id(&repo, "Smartphones").await;

    let err = repo
        .update_category(
            electronics,
            CategoryInput {
                name: "Electronics".into(),
                description: String::new(),
                parent_id: Some(smartphones),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "parent_id"));

    let err = repo
        .create_category(CategoryInput {
            name: "Orphan".into(),
            description: String::new(),
            parent_id: Some(9999),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn deleting_parent_category_detaches_children() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let phones = category_id(&repo, "Phones").await;
    let smartphones = category_id(&repo, "Smartphones").await;

    assert!(assert_ok!(repo.delete_category(phones).await));
    let child = assert_ok!(repo.find_category(smartphones).await).unwrap();
    assert_eq!(child.parent_id, None);
}

#[tokio::test]
async fn product_filter_combines_category_and_price() {
    let repo = Repository::new(seeded_pool().await);
    let electronics = category_id(&repo, "Electronics").await;

    let with_children = ProductQuery {
        category: Some(electronics),
        sort: Some("name".into()),
        ..Default::default()
    };
    let products = assert_ok!(repo.list_products(&with_children).await);
    assert_eq!(names(&products), vec!["Basic Phone", "Galaxy X", "Laptop Pro", "Pixel Y"]);

    let direct_only = ProductQuery { include_subcategories: Some(false), ..with_children };
    let products = assert_ok!(repo.list_products(&direct_only).await);
    assert_eq!(names(&products), vec!["Laptop Pro"]);

    let priced = ProductQuery {
        min_price: Some(Decimal::new(50, 0)),
        max_price: Some(Decimal::new(900, 0)),
        sort: Some("price".into()),
        ..Default::default()
    };
    let products = assert_ok!(repo.list_products(&priced).await);
    assert_eq!(names(&products), vec!["Pixel Y", "Galaxy X"]);

    let inverted = ProductQuery {
        min_price: Some(Decimal::new(100, 0)),
        max_price: Some(Decimal::new(10, 0)),
        ..Default::default()
    };
    assert!(matches!(repo.list_products(&inverted).await, Err(AppError::Validation { .. })));
}

#[tokio::test]
async fn product_names_are_unique_per_category() {
    let repo = Repository::new(seeded_pool().await);
    let smartphones = category_id(&repo, "Smartphones").await;
    let books = category_id(&repo, "Books").await;

    let input = |category_id| ProductInput {
        name: "Galaxy X".into(),
        description: String::new(),
        price: Decimal::new(10_000, 2),
        stock: 1,
        category_id,
    };

    let err = repo.create_product(input(smartphones)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "name"));

    let other = assert_ok!(repo.create_product(input(books)).await);
    assert_eq!(other.price, Decimal::new(100, 0));

    let err = repo.create_product(input(9999)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "category_id"));
}

#[tokio::test]
async fn product_search_matches_wildcards_literally() {
    let repo = Repository::new(seeded_pool().await);
    let books = category_id(&repo, "Books").await;

    for name in ["snake_case guide", "snakeXcase guide", "100% cotton"] {
        assert_ok!(
            repo.create_product(ProductInput {
                name: name.into(),
                description: String::new(),
                price: Decimal::new(1_500, 2),
                stock: 3,
                category_id: books,
            })
            .await
        );
    }

    let search = |term: &str| ProductQuery { search: Some(term.to_string()), ..Default::default() };
    let found = assert_ok!(repo.list_products(&search("snake_case")).await);
    assert_eq!(names(&found), vec!["snake_case guide"]);

    let found = assert_ok!(repo.list_products(&search("100%")).await);
    assert_eq!(names(&found), vec!["100% cotton"]);
}

#[tokio::test]
async fn cart_merges_quantities_and_checkout_creates_order() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let user = customer_id(&repo).await;
    let galaxy = product_id(&repo, "Galaxy X").await;
    let phone = product_id(&repo, "Basic Phone").await;

    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: galaxy, quantity: 2 }).await);
    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: phone, quantity: 1 }).await);
    let cart = assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: phone, quantity: 2 }).await);

    assert_eq!(cart.items.len(), 2);
    let phone_line = cart.items.iter().find(|i| i.product_id == phone).unwrap();
    assert_eq!(phone_line.quantity, 3);
    assert_eq!(cart.total, Decimal::new(194_770, 2));

    let order = assert_ok!(repo.checkout(user).await);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total, Decimal::new(194_770, 2));
    assert_eq!(assert_ok!(repo.order_total(order.id).await), order.total);
    assert_eq!(assert_ok!(shop::order_total(pool.read(), order.id).await), order.total);

    let galaxy_after = assert_ok!(repo.find_product(galaxy).await).unwrap();
    assert_eq!(galaxy_after.stock, 3);
    let phone_after = assert_ok!(repo.find_product(phone).await).unwrap();
    assert_eq!(phone_after.stock, 47);

    let cart = assert_ok!(repo.cart_for_user(user).await);
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);

    let orders = assert_ok!(repo.list_orders(Some(user)).await);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order.id);
    assert_eq!(orders[0].total, order.total);
}

#[tokio::test]
async fn checkout_rejects_empty_cart() {
    let repo = Repository::new(seeded_pool().await);
    let user = customer_id(&repo).await;
    let err = repo.checkout(user).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
    assert!(assert_ok!(repo.list_orders(Some(user)).await).is_empty());
}

#[tokio::test]
async fn cart_refuses_more_than_stock() {
    let repo = Repository::new(seeded_pool().await);
    let user = customer_id(&repo).await;
    let pixel = product_id(&repo, "Pixel Y").await;

    let err = repo
        .add_to_cart(user, CartItemInput { product_id: pixel, quantity: 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { requested: 1, available: 0, .. }));
}

#[tokio::test]
async fn cart_merge_cannot_overflow_quantity() {
    let repo = Repository::new(seeded_pool().await);
    let user = customer_id(&repo).await;
    let laptop = product_id(&repo, "Laptop Pro").await;

    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: laptop, quantity: 1 }).await);
    let err = repo
        .add_to_cart(user, CartItemInput { product_id: laptop, quantity: i32::MAX })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "quantity"));

    let cart = assert_ok!(repo.cart_for_user(user).await);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 1);
}

#[tokio::test]
async fn checkout_short_on_stock_rolls_back() {
    let repo = Repository::new(seeded_pool().await);
    let user = customer_id(&repo).await;
    let galaxy = product_id(&repo, "Galaxy X").await;
    let laptop = product_id(&repo, "Laptop Pro").await;

    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: laptop, quantity: 1 }).await);
    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: galaxy, quantity: 3 }).await);

    // stock drops after the item was put in the cart
    let current = assert_ok!(repo.find_product(galaxy).await).unwrap();
    assert_ok!(
        repo.update_product(
            galaxy,
            ProductInput {
                name: current.name,
                description: current.description,
                price: current.price,
                stock: 1,
                category_id: current.category_id,
            }
        )
        .await
    );

    let err = repo.checkout(user).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { requested: 3, available: 1, .. }));

    assert!(assert_ok!(repo.list_orders(Some(user)).await).is_empty());
    assert_eq!(assert_ok!(repo.cart_for_user(user).await).items.len(), 2);
    assert_eq!(assert_ok!(repo.find_product(laptop).await).unwrap().stock, 10);
    assert_eq!(assert_ok!(repo.find_product(galaxy).await).unwrap().stock, 1);
}

#[tokio::test]
async fn order_status_follows_lifecycle_and_cancel_restocks() {
    let repo = Repository::new(seeded_pool().await);
    let user = customer_id(&repo).await;
    let book = product_id(&repo, "Rust Programming").await;

    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: book, quantity: 4 }).await);
    let order = assert_ok!(repo.checkout(user).await);
    assert_eq!(assert_ok!(repo.find_product(book).await).unwrap().stock, 96);

    let paid = assert_ok!(repo.update_order_status(order.id, OrderStatus::Paid).await);
    assert_eq!(paid.status, OrderStatus::Paid);

    let err = repo.update_order_status(order.id, OrderStatus::Delivered).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState { .. }));

    let cancelled = assert_ok!(repo.update_order_status(order.id, OrderStatus::Cancelled).await);
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(assert_ok!(repo.find_product(book).await).unwrap().stock, 100);

    let err = repo.update_order_status(order.id, OrderStatus::Paid).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState { .. }));

    let err = repo.update_order_status(9999, OrderStatus::Paid).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn stale_cancel_does_not_restock_twice() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let user = customer_id(&repo).await;
    let book = product_id(&repo, "Rust Programming").await;

    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: book, quantity: 4 }).await);
    let order = assert_ok!(repo.checkout(user).await);
    assert_ok!(repo.update_order_status(order.id, OrderStatus::Cancelled).await);
    assert_eq!(assert_ok!(repo.find_product(book).await).unwrap().stock, 100);

    // a second canceller that read the order while it was still pending
    let err = shop::transition_order_status(pool.write(), order.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState { .. }));
    assert_eq!(assert_ok!(repo.find_product(book).await).unwrap().stock, 100);
}

#[tokio::test]
async fn cart_lines_are_claimed_once() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let user = customer_id(&repo).await;
    let book = product_id(&repo, "Rust Programming").await;

    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: book, quantity: 2 }).await);
    let cart = assert_ok!(repo.cart_for_user(user).await);
    let item_ids: Vec<i32> = cart.items.iter().map(|i| i.id).collect();

    // another checkout took the lines after they were read
    assert_ok!(repo.checkout(user).await);
    let err = shop::claim_cart_items(pool.write(), cart.id, &item_ids).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState { .. }));

    assert_eq!(assert_ok!(repo.list_orders(Some(user)).await).len(), 1);
    assert_eq!(assert_ok!(repo.find_product(book).await).unwrap().stock, 98);
}

#[tokio::test]
async fn recent_orders_and_popular_products() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let user = customer_id(&repo).await;
    let galaxy = product_id(&repo, "Galaxy X").await;
    let book = product_id(&repo, "Rust Programming").await;

    for _ in 0..2 {
        assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: book, quantity: 1 }).await);
        assert_ok!(repo.checkout(user).await);
    }
    assert_ok!(repo.add_to_cart(user, CartItemInput { product_id: galaxy, quantity: 1 }).await);
    assert_ok!(repo.checkout(user).await);

    let since = (Utc::now() - Duration::days(1)).into();
    let recent = assert_ok!(shop::users_with_recent_orders(pool.read(), since).await);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].username, CUSTOMER_USERNAME);
    assert_eq!(recent[0].recent_order_count, 3);

    let future = (Utc::now() + Duration::days(1)).into();
    assert!(assert_ok!(shop::users_with_recent_orders(pool.read(), future).await).is_empty());

    let popular = assert_ok!(repo.popular_products(10).await);
    assert_eq!(popular[0].name, "Rust Programming");
    assert_eq!(popular[0].order_count, 2);
    assert_eq!(popular[1].name, "Galaxy X");
    assert_eq!(popular[1].order_count, 1);
    assert!(popular[2..].iter().all(|p| p.order_count == 0));

    let by_orders = ProductQuery { sort: Some("-order_count".into()), ..Default::default() };
    let sorted = assert_ok!(repo.list_products(&by_orders).await);
    assert_eq!(sorted[0].name, "Rust Programming");
}

#[tokio::test]
async fn product_reviews_feed_average_rating() {
    let pool = seeded_pool().await;
    let repo = Repository::new(pool.clone());
    let user = customer_id(&repo).await;
    let laptop = product_id(&repo, "Laptop Pro").await;

    assert_eq!(assert_ok!(repo.product_average_rating(laptop).await), None);

    for rating in [5, 4] {
        assert_ok!(
            repo.create_product_review(laptop, user, ProductReviewInput { rating, text: "ok".into() })
                .await
        );
    }

    assert_eq!(assert_ok!(repo.product_average_rating(laptop).await), Some(4.5));
    let detail = assert_ok!(repo.find_product(laptop).await).unwrap();
    assert_eq!(detail.reviews_count, 2);
    assert_eq!(detail.category_name.as_deref(), Some("Electronics"));
    assert_eq!(assert_ok!(repo.list_product_reviews(laptop).await).len(), 2);

    let ratings = assert_ok!(shop::product_average_ratings(pool.read()).await);
    assert_eq!(ratings[0].id, laptop);
    assert_eq!(ratings[0].avg_rating, Some(4.5));
    assert!(ratings[1..].iter().all(|r| r.avg_rating.is_none() && r.reviews_count == 0));

    let err = repo
        .create_product_review(9999, user, ProductReviewInput { rating: 3, text: String::new() })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn category_product_counts_are_direct() {
    let repo = Repository::new(seeded_pool().await);
    let counts: Vec<(String, i64)> = assert_ok!(repo.list_categories().await)
        .into_iter()
        .map(|c| (c.name, c.products_count))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Books".to_string(), 1),
            ("Electronics".to_string(), 1),
            ("Phones".to_string(), 1),
            ("Smartphones".to_string(), 2),
        ]
    );
}
