//! Request extractors

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
    Json,
};
use bookshop_common::errors::{AppError, Result};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON becomes `InvalidFormat`, rule violations become field-level
/// validation errors; both answer 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::InvalidFormat {
                message: rejection.body_text(),
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters; a segment that does not parse (`/articles/abc/`) names
/// no resource and answers 404 in the usual error envelope
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => {
                debug!(path = %parts.uri.path(), error = %err.body_text(), "Unparseable path parameter");
                Err(AppError::not_found("Resource", parts.uri.path()))
            }
            Err(rejection) => Err(AppError::Internal {
                message: rejection.body_text(),
            }),
        }
    }
}
