//! Request extractors that reject with the API error envelope.

use super::{error::ApiError, state::AppState};
use crate::tenant::UserProfile;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::{HeaderMap, header::AUTHORIZATION, request::Parts};
use axum::Json;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Returns the bearer token from the `Authorization` header.
///
/// # Errors
///
/// Returns an `UNAUTHORIZED` error when the header is missing, not UTF-8, not
/// a bearer credential, or empty.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("expected a Bearer token"))
}

/// Management caller, resolved from an identity token.
#[derive(Debug, Clone)]
pub struct Caller(pub UserProfile);

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let profile = state.identities.resolve(token).await?;
        Ok(Self(profile))
    }
}

/// Raw bearer credential, for routes that authenticate a bridge token or
/// pass the identity token on to a service.
#[derive(Debug, Clone)]
pub struct Bearer(pub String);

impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(|token| Self(token.to_owned()))
    }
}

/// JSON body whose rejections become `VALIDATION` errors.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameters whose rejections become `VALIDATION` errors.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
