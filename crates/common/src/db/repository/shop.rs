//! Categories, products, product reviews, carts and orders

use super::{now, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::queries::shop::{self, CategoryProductCount, ProductFilter, ProductOrderCount, ProductSort};
use crate::queries::{as_double, round2};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, LoaderTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::info;
use utoipa::IntoParams;
use validator::{Validate, ValidationError};

/// Largest quantity a single cart line may hold
pub const MAX_CART_QUANTITY: i32 = 10_000;

fn price_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Prices are stored as `numeric(10, 2)`: at most two decimal places and
/// eight digits before the point
fn validate_price(price: &Decimal) -> std::result::Result<(), ValidationError> {
    if *price < Decimal::new(1, 2) {
        return Err(price_error("min_price", "Ensure this value is greater than or equal to 0.01."));
    }
    if price.normalize().scale() > 2 {
        return Err(price_error(
            "max_decimal_places",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }
    if *price >= Decimal::new(100_000_000, 0) {
        return Err(price_error(
            "max_whole_digits",
            "Ensure that there are no more than 8 digits before the decimal point.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    pub category_id: i32,
}

/// Query string of the product listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category: Option<i32>,
    /// Include products of every sub-category (default true)
    pub include_subcategories: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    /// `price`, `-price`, `name`, `created_at`, `order_count`, `-order_count`
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductWithRating {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub avg_rating: Option<f64>,
    pub reviews_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CartItemInput {
    pub product_id: i32,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CartQuantity {
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItemView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub id: i32,
    pub user_id: i32,
    pub items: Vec<CartItemView>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: i32,
    pub user_id: i32,
    pub status: OrderStatus,
    pub created_at: DateTimeWithTimeZone,
    pub items: Vec<OrderItemView>,
    pub total: Decimal,
}

async fn cart_for<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Cart> {
    if let Some(cart) = CartEntity::find().filter(CartColumn::UserId.eq(user_id)).one(db).await? {
        return Ok(cart);
    }

    CartActiveModel {
        user_id: Set(user_id),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

async fn cart_view<C: ConnectionTrait>(db: &C, cart: Cart) -> Result<CartView> {
    let rows = CartItemEntity::find()
        .filter(CartItemColumn::CartId.eq(cart.id))
        .find_also_related(ProductEntity)
        .order_by_asc(CartItemColumn::Id)
        .all(db)
        .await?;

    let items: Vec<CartItemView> = rows
        .into_iter()
        .filter_map(|(item, product)| {
            let product = product?;
            Some(CartItemView {
                id: item.id,
                product_id: product.id,
                product_name: product.name,
                unit_price: product.price,
                quantity: item.quantity,
                line_total: product.price * Decimal::from(item.quantity),
            })
        })
        .collect();

    let total = items.iter().map(|i| i.line_total).sum();
    Ok(CartView { id: cart.id, user_id: cart.user_id, items, total })
}

/// Orders with their lines and product names, three queries overall
async fn order_views<C: ConnectionTrait>(db: &C, orders: Vec<Order>) -> Result<Vec<OrderView>> {
    let items = orders.load_many(OrderItemEntity, db).await?;

    let product_ids: BTreeSet<i32> = items.iter().flatten().map(|i| i.product_id).collect();
    let names: HashMap<i32, String> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        ProductEntity::find()
            .select_only()
            .columns([ProductColumn::Id, ProductColumn::Name])
            .filter(ProductColumn::Id.is_in(product_ids))
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?
            .into_iter()
            .collect()
    };

    Ok(orders
        .into_iter()
        .zip(items)
        .map(|(order, mut items)| {
            items.sort_by_key(|i| i.id);
            let items: Vec<OrderItemView> = items
                .into_iter()
                .map(|item| OrderItemView {
                    id: item.id,
                    product_id: item.product_id,
                    product_name: names.get(&item.product_id).cloned().unwrap_or_default(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.unit_price * Decimal::from(item.quantity),
                })
                .collect();
            let total = items.iter().map(|i| i.line_total).sum();
            OrderView {
                id: order.id,
                user_id: order.user_id,
                status: order.order_status(),
                created_at: order.created_at,
                items,
                total,
            }
        })
        .collect())
}

async fn ensure_category<C: ConnectionTrait>(db: &C, field: &str, id: i32) -> Result<Category> {
    CategoryEntity::find_by_id(id).one(db).await?.ok_or_else(|| {
        AppError::invalid_field(field, format!("Invalid pk \"{}\" - object does not exist.", id))
    })
}

async fn ensure_unique_product_name<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
    name: &str,
    except: Option<i32>,
) -> Result<()> {
    let mut query = ProductEntity::find()
        .filter(ProductColumn::CategoryId.eq(category_id))
        .filter(ProductColumn::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(ProductColumn::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(AppError::invalid_field(
            "name",
            "Product with this name already exists in this category.",
        ));
    }
    Ok(())
}

async fn rating_of<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<(Option<f64>, i64)> {
    let row: Option<(Option<f64>, i64)> = ProductReviewEntity::find()
        .select_only()
        .column_as(as_double(Func::avg(Expr::col(ProductReviewColumn::Rating))), "avg_rating")
        .column_as(Expr::col(ProductReviewColumn::Id).count(), "reviews_count")
        .filter(ProductReviewColumn::ProductId.eq(product_id))
        .into_tuple()
        .one(db)
        .await?;

    let (avg, count) = row.unwrap_or((None, 0));
    Ok((avg.map(round2), count))
}

impl Repository {
    // ========================================================================
    // Category Operations
    // ========================================================================

    /// Categories by name with their direct product counts
    pub async fn list_categories(&self) -> Result<Vec<CategoryProductCount>> {
        shop::category_product_counts(self.read_conn()).await
    }

    pub async fn find_category(&self, id: i32) -> Result<Option<Category>> {
        CategoryEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_category(&self, input: CategoryInput) -> Result<Category> {
        let db = self.write_conn();
        if let Some(parent_id) = input.parent_id {
            ensure_category(db, "parent_id", parent_id).await?;
        }

        let category = CategoryActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            parent_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(category_id = category.id, parent_id = ?category.parent_id, "Category created");
        Ok(category)
    }

    /// Update a category; the new parent may not be the category itself or
    /// one of its descendants
    pub async fn update_category(&self, id: i32, input: CategoryInput) -> Result<Category> {
        let db = self.write_conn();
        let mut category = CategoryEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Category", id))?
            .into_active_model();

        if let Some(parent_id) = input.parent_id {
            ensure_category(db, "parent_id", parent_id).await?;
            if shop::category_descendants(db, id).await?.contains(&parent_id) {
                return Err(AppError::invalid_field(
                    "parent_id",
                    "A category cannot be moved under itself or one of its descendants.",
                ));
            }
        }

        category.name = Set(input.name);
        category.description = Set(input.description);
        category.parent_id = Set(input.parent_id);
        category.update(db).await.map_err(Into::into)
    }

    /// Delete a category with its products; child categories become roots
    pub async fn delete_category(&self, id: i32) -> Result<bool> {
        let result = CategoryEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// The category and every category below it
    pub async fn category_descendants(&self, id: i32) -> Result<Vec<i32>> {
        let db = self.read_conn();
        if CategoryEntity::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::not_found("Category", id));
        }
        shop::category_descendants(db, id).await
    }

    // ========================================================================
    // Product Operations
    // ========================================================================

    /// Products matching the query, newest first unless `sort` says otherwise.
    /// Unknown sort keys are ignored.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<ProductOrderCount>> {
        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(AppError::invalid_field("min_price", "min_price must not exceed max_price"));
            }
        }

        let db = self.read_conn();
        let category_ids = match query.category {
            Some(id) if query.include_subcategories.unwrap_or(true) => {
                Some(shop::category_descendants(db, id).await?)
            }
            Some(id) => Some(vec![id]),
            None => None,
        };

        let filter = ProductFilter {
            category_ids,
            min_price: query.min_price,
            max_price: query.max_price,
            search: query.search.clone(),
            sort: query
                .sort
                .as_deref()
                .and_then(ProductSort::parse)
                .unwrap_or_default(),
        };

        shop::filter_products(db, &filter).await
    }

    pub async fn popular_products(&self, limit: usize) -> Result<Vec<ProductOrderCount>> {
        let mut products = shop::popular_products(self.read_conn()).await?;
        products.truncate(limit);
        Ok(products)
    }

    /// Product with its category name and review aggregate
    pub async fn find_product(&self, id: i32) -> Result<Option<ProductWithRating>> {
        let db = self.read_conn();
        let Some((product, category)) = ProductEntity::find_by_id(id)
            .find_also_related(CategoryEntity)
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let (avg_rating, reviews_count) = rating_of(db, id).await?;
        Ok(Some(ProductWithRating {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            category_name: category.map(|c| c.name),
            created_at: product.created_at,
            avg_rating,
            reviews_count,
        }))
    }

    pub async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let db = self.write_conn();
        ensure_category(db, "category_id", input.category_id).await?;
        ensure_unique_product_name(db, input.category_id, &input.name, None).await?;

        let product = ProductActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            category_id: Set(input.category_id),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(product_id = product.id, category_id = product.category_id, "Product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: i32, input: ProductInput) -> Result<Product> {
        let db = self.write_conn();
        let mut product = ProductEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))?
            .into_active_model();

        ensure_category(db, "category_id", input.category_id).await?;
        ensure_unique_product_name(db, input.category_id, &input.name, Some(id)).await?;

        product.name = Set(input.name);
        product.description = Set(input.description);
        product.price = Set(input.price);
        product.stock = Set(input.stock);
        product.category_id = Set(input.category_id);
        product.update(db).await.map_err(Into::into)
    }

    pub async fn delete_product(&self, id: i32) -> Result<bool> {
        let result = ProductEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Product Review Operations
    // ========================================================================

    pub async fn create_product_review(
        &self,
        product_id: i32,
        user_id: i32,
        input: ProductReviewInput,
    ) -> Result<ProductReview> {
        let db = self.write_conn();
        if ProductEntity::find_by_id(product_id).one(db).await?.is_none() {
            return Err(AppError::not_found("Product", product_id));
        }

        let review = ProductReviewActiveModel {
            product_id: Set(product_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            text: Set(input.text),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(review_id = review.id, product_id, user_id, "Product review created");
        Ok(review)
    }

    /// Reviews of one product, newest first
    pub async fn list_product_reviews(&self, product_id: i32) -> Result<Vec<ProductReview>> {
        let db = self.read_conn();
        if ProductEntity::find_by_id(product_id).one(db).await?.is_none() {
            return Err(AppError::not_found("Product", product_id));
        }

        ProductReviewEntity::find()
            .filter(ProductReviewColumn::ProductId.eq(product_id))
            .order_by_desc(ProductReviewColumn::CreatedAt)
            .order_by_desc(ProductReviewColumn::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Average rating rounded to two places, `None` without reviews
    pub async fn product_average_rating(&self, product_id: i32) -> Result<Option<f64>> {
        rating_of(self.read_conn(), product_id).await.map(|(avg, _)| avg)
    }

    // ========================================================================
    // Cart Operations
    // ========================================================================

    /// The user's cart, created on first access
    pub async fn cart_for_user(&self, user_id: i32) -> Result<CartView> {
        let db = self.write_conn();
        let cart = cart_for(db, user_id).await?;
        cart_view(db, cart).await
    }

    /// Add a product; a product already in the cart has its quantity increased
    pub async fn add_to_cart(&self, user_id: i32, input: CartItemInput) -> Result<CartView> {
        let db = self.write_conn();
        let product = ProductEntity::find_by_id(input.product_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                AppError::invalid_field(
                    "product_id",
                    format!("Invalid pk \"{}\" - object does not exist.", input.product_id),
                )
            })?;
        let cart = cart_for(db, user_id).await?;

        let existing = CartItemEntity::find()
            .filter(CartItemColumn::CartId.eq(cart.id))
            .filter(CartItemColumn::ProductId.eq(product.id))
            .one(db)
            .await?;
        let quantity = input
            .quantity
            .checked_add(existing.as_ref().map_or(0, |i| i.quantity))
            .filter(|q| *q <= MAX_CART_QUANTITY)
            .ok_or_else(|| {
                AppError::invalid_field("quantity", "Cart quantity would exceed 10000 for this product.")
            })?;

        if quantity > product.stock {
            return Err(AppError::InsufficientStock {
                product_id: product.id,
                requested: quantity,
                available: product.stock,
            });
        }

        match existing {
            Some(item) => {
                let mut item = item.into_active_model();
                item.quantity = Set(quantity);
                item.update(db).await?;
            }
            None => {
                CartItemActiveModel {
                    cart_id: Set(cart.id),
                    product_id: Set(product.id),
                    quantity: Set(quantity),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }

        cart_view(db, cart).await
    }

    /// Set the quantity of one line of the user's cart
    pub async fn update_cart_item(&self, user_id: i32, item_id: i32, quantity: i32) -> Result<CartView> {
        let db = self.write_conn();
        let cart = cart_for(db, user_id).await?;

        let (item, product) = CartItemEntity::find_by_id(item_id)
            .filter(CartItemColumn::CartId.eq(cart.id))
            .find_also_related(ProductEntity)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("CartItem", item_id))?;

        if let Some(product) = product {
            if quantity > product.stock {
                return Err(AppError::InsufficientStock {
                    product_id: product.id,
                    requested: quantity,
                    available: product.stock,
                });
            }
        }

        let mut item = item.into_active_model();
        item.quantity = Set(quantity);
        item.update(db).await?;

        cart_view(db, cart).await
    }

    pub async fn remove_cart_item(&self, user_id: i32, item_id: i32) -> Result<CartView> {
        let db = self.write_conn();
        let cart = cart_for(db, user_id).await?;

        let result = CartItemEntity::delete_many()
            .filter(CartItemColumn::Id.eq(item_id))
            .filter(CartItemColumn::CartId.eq(cart.id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("CartItem", item_id));
        }

        cart_view(db, cart).await
    }

    pub async fn clear_cart(&self, user_id: i32) -> Result<CartView> {
        let db = self.write_conn();
        let cart = cart_for(db, user_id).await?;
        CartItemEntity::delete_many()
            .filter(CartItemColumn::CartId.eq(cart.id))
            .exec(db)
            .await?;
        cart_view(db, cart).await
    }

    // ========================================================================
    // Order Operations
    // ========================================================================

    /// Turn the user's cart into a pending order.
    ///
    /// The cart lines are claimed first, so a concurrent checkout of the same
    /// cart fails instead of placing a second order. Lines are priced at the
    /// current product price and stock is decremented in the same
    /// transaction; any line short on stock aborts the whole checkout and
    /// leaves the cart untouched.
    pub async fn checkout(&self, user_id: i32) -> Result<OrderView> {
        let txn = self.write_conn().begin().await?;

        let cart = cart_for(&txn, user_id).await?;
        let lines = CartItemEntity::find()
            .filter(CartItemColumn::CartId.eq(cart.id))
            .find_also_related(ProductEntity)
            .order_by_asc(CartItemColumn::Id)
            .all(&txn)
            .await?;

        if lines.is_empty() {
            return Err(AppError::Validation { message: "Cart is empty".to_string(), field: None });
        }
        let item_ids: Vec<i32> = lines.iter().map(|(item, _)| item.id).collect();
        shop::claim_cart_items(&txn, cart.id, &item_ids).await?;

        let order = OrderActiveModel {
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending.into()),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (item, product) in lines {
            let product = product.ok_or_else(|| AppError::not_found("Product", item.product_id))?;

            let updated = ProductEntity::update_many()
                .col_expr(ProductColumn::Stock, Expr::col(ProductColumn::Stock).sub(item.quantity))
                .filter(ProductColumn::Id.eq(product.id))
                .filter(ProductColumn::Stock.gte(item.quantity))
                .exec(&txn)
                .await?;
            if updated.rows_affected == 0 {
                return Err(AppError::InsufficientStock {
                    product_id: product.id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }

            OrderItemActiveModel {
                order_id: Set(order.id),
                product_id: Set(product.id),
                quantity: Set(item.quantity),
                unit_price: Set(product.price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let view = order_views(&txn, vec![order])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal { message: "Order view missing".to_string() })?;
        txn.commit().await?;

        info!(order_id = view.id, user_id, total = %view.total, "Order placed");
        Ok(view)
    }

    /// Orders newest first; all users when `user_id` is `None`
    pub async fn list_orders(&self, user_id: Option<i32>) -> Result<Vec<OrderView>> {
        let db = self.read_conn();
        let mut query = OrderEntity::find();
        if let Some(user_id) = user_id {
            query = query.filter(OrderColumn::UserId.eq(user_id));
        }

        let orders = query
            .order_by_desc(OrderColumn::CreatedAt)
            .order_by_desc(OrderColumn::Id)
            .all(db)
            .await?;
        order_views(db, orders).await
    }

    pub async fn find_order(&self, id: i32) -> Result<Option<OrderView>> {
        let db = self.read_conn();
        match OrderEntity::find_by_id(id).one(db).await? {
            Some(order) => Ok(order_views(db, vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Move an order along its lifecycle. Cancelling puts the ordered
    /// quantities back into stock.
    pub async fn update_order_status(&self, id: i32, next: OrderStatus) -> Result<OrderView> {
        let txn = self.write_conn().begin().await?;

        let order = OrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Order", id))?;
        let current = order.order_status();
        shop::transition_order_status(&txn, id, current, next).await?;

        let order = OrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Order", id))?;
        let view = order_views(&txn, vec![order])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal { message: "Order view missing".to_string() })?;
        txn.commit().await?;

        info!(order_id = id, from = current.as_str(), to = next.as_str(), "Order status changed");
        Ok(view)
    }

    /// `SUM(unit_price * quantity)` computed by the database
    pub async fn order_total(&self, id: i32) -> Result<Decimal> {
        let db = self.read_conn();
        if OrderEntity::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::not_found("Order", id));
        }
        shop::order_total(db, id).await
    }

    /// Users with orders placed since `since`
    pub async fn users_with_recent_orders(&self, since: DateTimeWithTimeZone) -> Result<Vec<shop::UserOrderCount>> {
        shop::users_with_recent_orders(self.read_conn(), since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_must_be_at_least_one_cent() {
        let product = |price: Decimal| ProductInput {
            name: "Pen".into(),
            description: String::new(),
            price,
            stock: 0,
            category_id: 1,
        };
        assert!(product(Decimal::new(1, 2)).validate().is_ok());
        assert!(product(Decimal::ZERO).validate().is_err());
        assert!(product(Decimal::new(-5, 0)).validate().is_err());
    }

    #[test]
    fn test_price_respects_column_precision() {
        let product = |price: Decimal| ProductInput {
            name: "Pen".into(),
            description: String::new(),
            price,
            stock: 0,
            category_id: 1,
        };
        let errors = product(Decimal::new(1005, 3)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(product(Decimal::new(12_345_678_901_234, 2)).validate().is_err());
        assert!(product(Decimal::new(100_000_000, 0)).validate().is_err());

        // trailing zeros are not extra precision
        assert!(product(Decimal::new(1500, 3)).validate().is_ok());
        assert!(product(Decimal::new(9_999_999_999, 2)).validate().is_ok());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let input = ProductInput {
            name: "Pen".into(),
            description: String::new(),
            price: Decimal::new(150, 2),
            stock: -1,
            category_id: 1,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("stock"));
    }

    #[test]
    fn test_cart_quantity_defaults_to_one() {
        let input: CartItemInput = serde_json::from_str(r#"{"product_id": 3}"#).unwrap();
        assert_eq!(input.quantity, 1);
        assert!(CartItemInput { product_id: 3, quantity: 0 }.validate().is_err());
        assert!(CartItemInput { product_id: 3, quantity: i32::MAX }.validate().is_err());
        assert!(CartQuantity { quantity: MAX_CART_QUANTITY + 1 }.validate().is_err());
        assert!(CartQuantity { quantity: MAX_CART_QUANTITY }.validate().is_ok());
    }
}
