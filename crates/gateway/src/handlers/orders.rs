//! Order handlers
//!
//! Customers see and cancel their own orders; managers and admins see every
//! order and move it through its lifecycle.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bookshop_common::{
    auth::AuthContext,
    db::{models::OrderStatus, OrderView},
    errors::{AppError, Result},
    metrics::{record_order_placed, record_order_status_change},
    queries::shop::UserOrderCount,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct StatusChange {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderTotal {
    pub order_id: i32,
    pub total: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecentOrdersParams {
    /// Look-back window in days (default 30)
    pub days: Option<i64>,
}

/// The order if the caller may see it; other users' orders look missing
async fn visible_order(state: &AppState, auth: &AuthContext, id: i32) -> Result<OrderView> {
    match state.repo().find_order(id).await? {
        Some(order) if auth.is_staff() || order.user_id == auth.user_id => Ok(order),
        _ => Err(AppError::not_found("Order", id)),
    }
}

pub async fn list_orders(State(state): State<AppState>, auth: AuthContext) -> Result<Json<Vec<OrderView>>> {
    let owner = (!auth.is_staff()).then_some(auth.user_id);
    Ok(Json(state.repo().list_orders(owner).await?))
}

/// Place an order from the caller's cart
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<(StatusCode, Json<OrderView>)> {
    let order = state.repo().checkout(auth.user_id).await?;
    record_order_placed();
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
) -> Result<Json<OrderView>> {
    Ok(Json(visible_order(&state, &auth, id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
    ValidatedJson(change): ValidatedJson<StatusChange>,
) -> Result<Json<OrderView>> {
    let order = visible_order(&state, &auth, id).await?;
    if !auth.is_staff() && change.status != OrderStatus::Cancelled {
        return Err(AppError::Forbidden {
            message: "Customers may only cancel their orders".to_string(),
        });
    }

    let updated = state.repo().update_order_status(id, change.status).await?;
    record_order_status_change(order.status.as_str(), updated.status.as_str());
    Ok(Json(updated))
}

/// Total computed by the database
pub async fn order_total(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
) -> Result<Json<OrderTotal>> {
    visible_order(&state, &auth, id).await?;
    let total = state.repo().order_total(id).await?;
    Ok(Json(OrderTotal { order_id: id, total }))
}

/// Users who ordered within the window, busiest first; staff only
pub async fn users_with_recent_orders(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<RecentOrdersParams>,
) -> Result<Json<Vec<UserOrderCount>>> {
    if !auth.is_staff() {
        return Err(AppError::Forbidden {
            message: "You do not have permission to perform this action".to_string(),
        });
    }

    let days = params.days.unwrap_or(30);
    let since = Duration::try_days(days)
        .filter(|_| days >= 0)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| AppError::invalid_field("days", "Ensure this value is a non-negative number of days."))?;

    Ok(Json(state.repo().users_with_recent_orders(since.into()).await?))
}
