//! Signed identity tokens (HS256) and the verified claims they carry.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Country, Role, User};
use crate::error::AppError;

/// Verified identity attributes attached to a request after token
/// verification. Immutable for the rest of the request; never accepted
/// from client-supplied headers.
///
/// `country` is `None` when the token carried a value outside the
/// known set; scoping treats that as fail-closed rather than an
/// authentication failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub country: Option<Country>,
}

/// Wire form of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: String,
    name: String,
    role: String,
    country: String,
    exp: i64,
}

/// Issues and verifies identity tokens with a fixed expiry.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_hours,
        }
    }

    /// Issue a token embedding the user's identity claims.
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let payload = TokenPayload {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role: user.role.to_string(),
            country: user.country.to_string(),
            exp: (Utc::now() + chrono::Duration::hours(self.ttl_hours)).timestamp(),
        };
        Ok(encode(&Header::default(), &payload, &self.encoding)?)
    }

    /// Verify signature and expiry. Every failure mode collapses into
    /// `Unauthorized` so verification internals never leak.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<TokenPayload>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Unauthorized)?;
        let payload = data.claims;

        let user_id = payload.sub.parse().map_err(|_| AppError::Unauthorized)?;
        let role: Role = payload.role.parse().map_err(|_| AppError::Unauthorized)?;
        let country = payload.country.parse::<Country>().ok();

        Ok(Claims {
            user_id,
            name: payload.name,
            role,
            country,
        })
    }
}
