//! Shopping cart handlers; every route acts on the caller's own cart

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use bookshop_common::{
    auth::AuthContext,
    db::{CartItemInput, CartQuantity, CartView},
    errors::Result,
};

use crate::{
    extract::{Path, ValidatedJson},
    AppState,
};

pub async fn get_cart(State(state): State<AppState>, auth: AuthContext) -> Result<Json<CartView>> {
    Ok(Json(state.repo().cart_for_user(auth.user_id).await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(input): ValidatedJson<CartItemInput>,
) -> Result<(StatusCode, Json<CartView>)> {
    let cart = state.repo().add_to_cart(auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(item_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<CartQuantity>,
) -> Result<Json<CartView>> {
    let cart = state
        .repo()
        .update_cart_item(auth.user_id, item_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

pub async fn remove_item(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(item_id): Path<i32>,
) -> Result<Json<CartView>> {
    Ok(Json(state.repo().remove_cart_item(auth.user_id, item_id).await?))
}

pub async fn clear_cart(State(state): State<AppState>, auth: AuthContext) -> Result<Json<CartView>> {
    Ok(Json(state.repo().clear_cart(auth.user_id).await?))
}
