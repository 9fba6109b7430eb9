//! User accounts and credential checks

use super::{now, Repository};
use crate::auth::{hash_password, verify_password, Role};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Registration body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl Repository {
    /// Create an account; the password is stored as an argon2 hash
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let taken = UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.write_conn())
            .await?;
        if taken.is_some() {
            return Err(AppError::invalid_field("username", "A user with that username already exists."));
        }

        let user = UserActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)?),
            role: Set(role.as_str().to_string()),
            created_at: Set(now()),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await?;

        info!(user_id = user.id, role = role.as_str(), "User created");
        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_user(&self, id: i32) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Return the user when the password matches; unknown users and wrong
    /// passwords fail the same way
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        match self.find_user_by_username(username).await? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => {
                warn!(username = %username, "Rejected login attempt");
                Err(AppError::InvalidCredentials)
            }
        }
    }
}
