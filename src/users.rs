//! User profile operations. Accounts are otherwise immutable; the only
//! mutable field is the admin's own payment method.

use std::sync::Arc;
use tracing::info;

use crate::auth::Claims;
use crate::error::AppError;
use crate::policy;
use crate::store::{Session, Store};
use crate::views::UserProfile;

pub struct UserService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The requester's own profile, password hash excluded.
    pub async fn profile(&self, claims: &Claims) -> Result<UserProfile, AppError> {
        let mut session = self.store.begin().await?;
        let user = session
            .user_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;
        session.commit().await?;

        Ok(UserProfile::from(&user))
    }

    /// Admin-only, self-targeted. Returns the profile without the
    /// password hash.
    pub async fn update_payment_method(
        &self,
        claims: &Claims,
        payment_method: &str,
    ) -> Result<UserProfile, AppError> {
        policy::authorize_payment_update(claims)?;

        if payment_method.trim().is_empty() {
            return Err(AppError::Validation(
                "a valid paymentMethod string is required".into(),
            ));
        }

        let mut session = self.store.begin().await?;
        let user = session
            .set_payment_method(claims.user_id, payment_method)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;
        session.commit().await?;

        info!(user = %user.email, "payment method updated");
        Ok(UserProfile::from(&user))
    }
}
