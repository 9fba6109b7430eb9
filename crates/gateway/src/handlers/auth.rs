//! Token and registration handlers

use axum::{extract::State, http::StatusCode, Json};
use bookshop_common::{
    auth::Role,
    db::RegisterUser,
    errors::{ErrorResponse, Result},
    metrics::record_login,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{extract::ValidatedJson, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub role: String,
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/token/",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 401, description = "Wrong username or password", body = ErrorResponse)
    )
)]
pub async fn token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let user = match state.repo().verify_credentials(&request.username, &request.password).await {
        Ok(user) => user,
        Err(e) => {
            record_login(false);
            return Err(e);
        }
    };
    record_login(true);

    let access = state.jwt.generate_token(user.id, &user.username, Role::parse(&user.role))?;
    tracing::info!(user_id = user.id, "Token issued");

    Ok(Json(TokenResponse {
        access,
        token_type: "Bearer",
        expires_in: state.jwt.expiration_secs(),
    }))
}

/// Create a customer account
#[utoipa::path(
    post,
    path = "/api/auth/register/",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation failed or username taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state
        .repo()
        .create_user(&input.username, &input.password, Role::User)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            role: user.role,
        }),
    ))
}
