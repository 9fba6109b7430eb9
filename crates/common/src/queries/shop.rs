//! Shop queries: recent-order activity, product popularity, combined product
//! filtering, and order totals.

use super::{as_double, Direction};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, FromQueryResult, JoinType, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// User annotated with the number of orders placed since a cutoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct UserOrderCount {
    pub id: i32,
    pub username: String,
    pub recent_order_count: i64,
}

/// Product annotated with how many order lines reference it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ProductOrderCount {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: i32,
    pub order_count: i64,
}

/// Category annotated with its direct product count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct CategoryProductCount {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub products_count: i64,
}

/// Product annotated with its review aggregate
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ProductRating {
    pub id: i32,
    pub name: String,
    pub avg_rating: Option<f64>,
    pub reviews_count: i64,
}

/// Sort keys accepted by the product listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    Price(Direction),
    Name(Direction),
    CreatedAt(Direction),
    OrderCountDesc,
    OrderCountAsc,
}

/// Newest first
impl Default for ProductSort {
    fn default() -> Self {
        ProductSort::CreatedAt(Direction::Desc)
    }
}

impl ProductSort {
    /// Parse `price`, `-price`, `name`, `created_at`, `order_count` and their `-` forms
    pub fn parse(value: &str) -> Option<Self> {
        let (field, direction) = match value.strip_prefix('-') {
            Some(field) => (field, Direction::Desc),
            None => (value, Direction::Asc),
        };
        match (field, direction) {
            ("price", d) => Some(ProductSort::Price(d)),
            ("name", d) => Some(ProductSort::Name(d)),
            ("created_at", d) => Some(ProductSort::CreatedAt(d)),
            ("order_count", Direction::Desc) => Some(ProductSort::OrderCountDesc),
            ("order_count", Direction::Asc) => Some(ProductSort::OrderCountAsc),
            _ => None,
        }
    }
}

/// Combined product filter; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category_ids: Option<Vec<i32>>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    #[serde(skip)]
    pub sort: ProductSort,
}

fn order_count_expr() -> SimpleExpr {
    Expr::col((OrderItemEntity, OrderItemColumn::Id)).count()
}

fn products_with_order_count() -> Select<ProductEntity> {
    ProductEntity::find()
        .select_only()
        .columns([
            ProductColumn::Id,
            ProductColumn::Name,
            ProductColumn::Price,
            ProductColumn::Stock,
            ProductColumn::CategoryId,
        ])
        .column_as(order_count_expr(), "order_count")
        .join(JoinType::LeftJoin, product::Relation::OrderItems.def())
        .group_by(ProductColumn::Id)
        .group_by(ProductColumn::Name)
        .group_by(ProductColumn::Price)
        .group_by(ProductColumn::Stock)
        .group_by(ProductColumn::CategoryId)
}

/// Users with at least one order created at or after `since`, busiest first
pub async fn users_with_recent_orders<C: ConnectionTrait>(
    db: &C,
    since: DateTimeWithTimeZone,
) -> Result<Vec<UserOrderCount>> {
    let count = Expr::col((OrderEntity, OrderColumn::Id)).count();
    UserEntity::find()
        .select_only()
        .columns([UserColumn::Id, UserColumn::Username])
        .column_as(count.clone(), "recent_order_count")
        .join(JoinType::InnerJoin, user::Relation::Orders.def())
        .filter(OrderColumn::CreatedAt.gte(since))
        .group_by(UserColumn::Id)
        .group_by(UserColumn::Username)
        .having(Expr::expr(count.clone()).gt(0))
        .order_by(count, Order::Desc)
        .order_by_asc(UserColumn::Username)
        .into_model::<UserOrderCount>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every product with its order-line count, most ordered first
pub async fn popular_products<C: ConnectionTrait>(db: &C) -> Result<Vec<ProductOrderCount>> {
    products_with_order_count()
        .order_by(order_count_expr(), Order::Desc)
        .order_by_asc(ProductColumn::Id)
        .into_model::<ProductOrderCount>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Category, price range and search filters combined, annotated with order counts
pub async fn filter_products<C: ConnectionTrait>(
    db: &C,
    filter: &ProductFilter,
) -> Result<Vec<ProductOrderCount>> {
    let mut query = products_with_order_count();

    if let Some(ref ids) = filter.category_ids {
        query = query.filter(ProductColumn::CategoryId.is_in(ids.clone()));
    }
    if let Some(min_price) = filter.min_price {
        query = query.filter(ProductColumn::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        query = query.filter(ProductColumn::Price.lte(max_price));
    }
    if let Some(ref search) = filter.search {
        if !search.trim().is_empty() {
            query = query.filter(super::icontains((ProductEntity, ProductColumn::Name), search.trim()));
        }
    }

    query = match filter.sort {
        ProductSort::Price(d) => query.order_by(ProductColumn::Price, d.into()),
        ProductSort::Name(d) => query.order_by(ProductColumn::Name, d.into()),
        ProductSort::CreatedAt(d) => query
            .group_by(ProductColumn::CreatedAt)
            .order_by(ProductColumn::CreatedAt, d.into()),
        ProductSort::OrderCountDesc => query.order_by(order_count_expr(), Order::Desc),
        ProductSort::OrderCountAsc => query.order_by(order_count_expr(), Order::Asc),
    };

    query
        .order_by_asc(ProductColumn::Id)
        .into_model::<ProductOrderCount>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// `SUM(unit_price * quantity)` for one order. SQLite keeps decimals as
/// floating point, so only there the sum is read back as a double.
fn order_total_select(backend: DbBackend, order_id: i32) -> Select<OrderItemEntity> {
    let line_total = Expr::col((OrderItemEntity, OrderItemColumn::UnitPrice))
        .mul(Expr::col((OrderItemEntity, OrderItemColumn::Quantity)));
    let sum: SimpleExpr = Func::sum(line_total).into();
    let sum = match backend {
        DbBackend::Sqlite => as_double(sum),
        _ => sum,
    };

    OrderItemEntity::find()
        .select_only()
        .column_as(sum, "total")
        .filter(OrderItemColumn::OrderId.eq(order_id))
}

/// `SUM(unit_price * quantity)` over an order's lines, zero for an empty order
pub async fn order_total<C: ConnectionTrait>(db: &C, order_id: i32) -> Result<Decimal> {
    let backend = db.get_database_backend();
    let select = order_total_select(backend, order_id);

    let total = if backend == DbBackend::Sqlite {
        let total: Option<Option<f64>> = select.into_tuple().one(db).await?;
        total
            .flatten()
            .map(Decimal::try_from)
            .transpose()
            .map_err(|e| AppError::Internal { message: format!("Order total out of range: {}", e) })?
    } else {
        let total: Option<Option<Decimal>> = select.into_tuple().one(db).await?;
        total.flatten()
    };

    Ok(total.map(|d| d.round_dp(2)).unwrap_or(Decimal::ZERO))
}

/// Every category with the number of products filed directly under it
pub async fn category_product_counts<C: ConnectionTrait>(db: &C) -> Result<Vec<CategoryProductCount>> {
    let count = Expr::col((ProductEntity, ProductColumn::Id)).count();
    CategoryEntity::find()
        .select_only()
        .columns([CategoryColumn::Id, CategoryColumn::Name, CategoryColumn::ParentId])
        .column_as(count, "products_count")
        .join(JoinType::LeftJoin, category::Relation::Products.def())
        .group_by(CategoryColumn::Id)
        .group_by(CategoryColumn::Name)
        .group_by(CategoryColumn::ParentId)
        .order_by_asc(CategoryColumn::Name)
        .into_model::<CategoryProductCount>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every product with its average review rating, unrated products last
pub async fn product_average_ratings<C: ConnectionTrait>(db: &C) -> Result<Vec<ProductRating>> {
    let avg = as_double(Func::avg(Expr::col((ProductReviewEntity, ProductReviewColumn::Rating))));
    ProductEntity::find()
        .select_only()
        .columns([ProductColumn::Id, ProductColumn::Name])
        .column_as(avg, "avg_rating")
        .column_as(Expr::col((ProductReviewEntity, ProductReviewColumn::Id)).count(), "reviews_count")
        .join(JoinType::LeftJoin, product::Relation::Reviews.def())
        .group_by(ProductColumn::Id)
        .group_by(ProductColumn::Name)
        .order_by_asc(ProductColumn::Id)
        .into_model::<ProductRating>()
        .all(db)
        .await
        .map(|mut rows| {
            rows.sort_by(|a, b| match (a.avg_rating, b.avg_rating) {
                (Some(x), Some(y)) => y.total_cmp(&x).then(a.id.cmp(&b.id)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.id.cmp(&b.id),
            });
            rows
        })
        .map_err(Into::into)
}

/// Move an order from `from` to `to`, provided it is still in `from`.
///
/// The status write is conditional on the status read earlier, so of two
/// concurrent changes only one applies; the loser gets `InvalidState` and
/// nothing is restocked twice. Cancelling puts the ordered quantities back.
pub async fn transition_order_status<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<()> {
    if !from.can_transition_to(to) {
        return Err(AppError::InvalidState {
            message: format!("Cannot change order status from {} to {}", from.as_str(), to.as_str()),
        });
    }

    let updated = OrderEntity::update_many()
        .col_expr(OrderColumn::Status, Expr::value(to.as_str()))
        .filter(OrderColumn::Id.eq(order_id))
        .filter(OrderColumn::Status.eq(from.as_str()))
        .exec(db)
        .await?;
    if updated.rows_affected != 1 {
        return Err(AppError::InvalidState {
            message: format!("Order {} is no longer {}", order_id, from.as_str()),
        });
    }

    if to == OrderStatus::Cancelled {
        let items = OrderItemEntity::find()
            .filter(OrderItemColumn::OrderId.eq(order_id))
            .all(db)
            .await?;
        for item in items {
            ProductEntity::update_many()
                .col_expr(ProductColumn::Stock, Expr::col(ProductColumn::Stock).add(item.quantity))
                .filter(ProductColumn::Id.eq(item.product_id))
                .exec(db)
                .await?;
        }
    }
    Ok(())
}

/// Remove the given lines from a cart, failing unless every one of them was
/// still there. Two checkouts of one cart cannot both claim its lines.
pub async fn claim_cart_items<C: ConnectionTrait>(db: &C, cart_id: i32, item_ids: &[i32]) -> Result<()> {
    let removed = CartItemEntity::delete_many()
        .filter(CartItemColumn::CartId.eq(cart_id))
        .filter(CartItemColumn::Id.is_in(item_ids.iter().copied()))
        .exec(db)
        .await?;
    if removed.rows_affected != item_ids.len() as u64 {
        return Err(AppError::InvalidState {
            message: "Cart changed during checkout".to_string(),
        });
    }
    Ok(())
}

/// `root` and every category below it. Parent links that loop back are
/// visited once.
pub async fn category_descendants<C: ConnectionTrait>(db: &C, root: i32) -> Result<Vec<i32>> {
    let mut seen: HashSet<i32> = HashSet::from([root]);
    let mut ordered = vec![root];
    let mut frontier = vec![root];

    while !frontier.is_empty() {
        let children: Vec<i32> = CategoryEntity::find()
            .select_only()
            .column(CategoryColumn::Id)
            .filter(CategoryColumn::ParentId.is_in(frontier))
            .order_by_asc(CategoryColumn::Id)
            .into_tuple()
            .all(db)
            .await?;

        frontier = children.into_iter().filter(|id| seen.insert(*id)).collect();
        ordered.extend(frontier.iter().copied());
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_sort_parse() {
        assert_eq!(ProductSort::parse("price"), Some(ProductSort::Price(Direction::Asc)));
        assert_eq!(ProductSort::parse("-price"), Some(ProductSort::Price(Direction::Desc)));
        assert_eq!(ProductSort::parse("-order_count"), Some(ProductSort::OrderCountDesc));
        assert_eq!(ProductSort::parse("order_count"), Some(ProductSort::OrderCountAsc));
        assert_eq!(ProductSort::parse("stock"), None);
    }

    #[test]
    fn test_order_total_casts_only_on_sqlite() {
        use sea_orm::QueryTrait;

        let postgres = order_total_select(DbBackend::Postgres, 7).build(DbBackend::Postgres).to_string();
        assert!(postgres.contains("SUM"), "{}", postgres);
        assert!(!postgres.contains("CAST"), "{}", postgres);

        let sqlite = order_total_select(DbBackend::Sqlite, 7).build(DbBackend::Sqlite).to_string();
        assert!(sqlite.contains("CAST"), "{}", sqlite);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        assert_eq!(ProductFilter::default().sort, ProductSort::CreatedAt(Direction::Desc));
    }
}
