//! Identity: credential verification, token issuance, and the
//! per-request claims extractor.

pub mod extract;
pub mod token;

pub use token::{Claims, TokenService};

use std::sync::Arc;
use tracing::info;

use crate::error::AppError;
use crate::store::{Session, Store};

/// Verifies credentials and issues signed identity tokens. Stateless
/// beyond the store lookup.
pub struct AuthService<S: Store> {
    store: Arc<S>,
    tokens: TokenService,
}

impl<S: Store> AuthService<S> {
    pub fn new(store: Arc<S>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Look up the user by email and compare the password against the
    /// stored bcrypt hash. Absent user and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let mut session = self.store.begin().await?;
        let user = session.user_by_email(email).await?;
        session.commit().await?;

        let user = user.ok_or(AppError::Unauthorized)?;
        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        info!(user = %user.email, role = %user.role, "login");
        let token = self.tokens.issue(&user)?;
        Ok(token)
    }
}
