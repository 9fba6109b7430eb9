//! Authentication and authorization utilities
//!
//! Provides:
//! - Password hashing (argon2)
//! - JWT access token generation and validation
//! - Role-based access policies for write endpoints
//! - Axum extractors for the authenticated user

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, Method},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Unknown stored roles fall back to the least privileged one
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::User,
        }
    }
}

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }
}

/// Optional authentication: `None` when no Authorization header was sent
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    pub role: Role,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    /// Generate a new access token
    pub fn generate_token(&self, user_id: i32, username: &str, role: Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e)
            })
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                    _ => AppError::InvalidToken,
                }
            })
    }

    /// Turn a bearer token into an auth context
    pub fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let claims = self.validate_token(token)?;
        let user_id = claims.sub.parse::<i32>().map_err(|_| AppError::InvalidToken)?;
        Ok(AuthContext {
            user_id,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Check a password against a stored argon2 hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Extract the token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

fn auth_from_parts(parts: &Parts, jwt: &JwtManager) -> Result<Option<AuthContext>> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| AppError::InvalidToken)?;
    let token = extract_bearer(header).ok_or_else(|| AppError::Unauthorized {
        message: "Authorization header must use the Bearer scheme".to_string(),
    })?;

    jwt.authenticate(token).map(Some)
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let jwt = Arc::<JwtManager>::from_ref(state);
        auth_from_parts(parts, &jwt)?.ok_or_else(|| AppError::Unauthorized {
            message: "Authentication credentials were not provided".to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for MaybeAuth
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let jwt = Arc::<JwtManager>::from_ref(state);
        auth_from_parts(parts, &jwt).map(MaybeAuth)
    }
}

/// Who may call a write endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Reads for everyone, writes for admins
    AdminOrReadOnly,
    /// Reads for everyone, create/update for managers and admins, delete for admins
    ManagerOrReadOnly,
    /// Any authenticated user
    Authenticated,
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl AccessPolicy {
    /// Check the policy; 401 without credentials, 403 with insufficient role
    pub fn check(&self, method: &Method, auth: Option<&AuthContext>) -> Result<()> {
        if is_safe(method) && *self != AccessPolicy::Authenticated {
            return Ok(());
        }

        let Some(auth) = auth else {
            return Err(AppError::Unauthorized {
                message: "Authentication credentials were not provided".to_string(),
            });
        };

        let allowed = match self {
            AccessPolicy::Authenticated => true,
            AccessPolicy::AdminOrReadOnly => auth.is_admin(),
            AccessPolicy::ManagerOrReadOnly if *method == Method::DELETE => auth.is_admin(),
            AccessPolicy::ManagerOrReadOnly => auth.is_staff(),
        };

        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "You do not have permission to perform this action".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext { user_id: 1, username: "alice".into(), role }
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = JwtManager::new("secret", 60);
        let token = jwt.generate_token(42, "alice", Role::Manager).unwrap();
        let auth = jwt.authenticate(&token).unwrap();
        assert_eq!(auth.user_id, 42);
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.role, Role::Manager);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtManager::new("one", 60).generate_token(1, "bob", Role::User).unwrap();
        let err = JwtManager::new("two", 60).validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert_ne!(hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret-pass", "not-a-hash"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("Basic abc"), None);
        assert_eq!(extract_bearer("Bearer "), None);
    }

    #[test]
    fn test_manager_or_read_only() {
        let policy = AccessPolicy::ManagerOrReadOnly;
        assert!(policy.check(&Method::GET, None).is_ok());
        assert!(matches!(
            policy.check(&Method::POST, None),
            Err(AppError::Unauthorized { .. })
        ));
        assert!(matches!(
            policy.check(&Method::POST, Some(&ctx(Role::User))),
            Err(AppError::Forbidden { .. })
        ));
        assert!(policy.check(&Method::PUT, Some(&ctx(Role::Manager))).is_ok());
        assert!(policy.check(&Method::DELETE, Some(&ctx(Role::Manager))).is_err());
        assert!(policy.check(&Method::DELETE, Some(&ctx(Role::Admin))).is_ok());
    }

    #[test]
    fn test_admin_or_read_only_and_authenticated() {
        assert!(AccessPolicy::AdminOrReadOnly.check(&Method::GET, None).is_ok());
        assert!(AccessPolicy::AdminOrReadOnly
            .check(&Method::PATCH, Some(&ctx(Role::Manager)))
            .is_err());
        assert!(AccessPolicy::Authenticated.check(&Method::GET, None).is_err());
        assert!(AccessPolicy::Authenticated
            .check(&Method::POST, Some(&ctx(Role::User)))
            .is_ok());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("manager"), Role::Manager);
        assert_eq!(Role::parse("superuser"), Role::User);
    }
}
