//! Axum extractor that turns a bearer token into verified [`Claims`].
//!
//! Every failure (missing header, malformed scheme, bad signature,
//! expiry) is the same 401 to the caller. The login route is the only
//! handler that does not use this extractor.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;

use super::{Claims, TokenService};

impl<S> FromRequestParts<S> for Claims
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

        tokens.verify(token)
    }
}
