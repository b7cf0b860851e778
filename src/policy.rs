//! Authorization policy engine.
//!
//! Pure decision functions over verified [`Claims`]: no I/O, no clock,
//! exhaustive matches on the closed role set. Handlers and services
//! call these before touching the store.
//!
//! Role-action matrix:
//!
//! | action                   | MEMBER | MANAGER    | ADMIN |
//! |--------------------------|--------|------------|-------|
//! | view catalog             | own country | own country | all |
//! | mutate own cart items    | yes    | yes        | yes   |
//! | checkout (PENDING→PLACED)| no     | own orders | any   |
//! | cancel (PLACED→CANCELLED)| no     | own orders | any   |
//! | update payment method    | no     | no         | self  |

use uuid::Uuid;

use crate::auth::Claims;
use crate::domain::{Country, Restaurant, Role};
use crate::error::AppError;

/// Country filter for catalog reads. `Ok(None)` means unrestricted
/// (admin); non-admins with an invalid country claim get a 400, the
/// one read where the original surfaces the bad claim.
pub fn restaurant_scope(claims: &Claims) -> Result<Option<Country>, AppError> {
    match claims.role {
        Role::Admin => Ok(None),
        Role::Manager | Role::Member => match claims.country {
            Some(country) => Ok(Some(country)),
            None => Err(AppError::Validation("invalid country in token".into())),
        },
    }
}

/// Country filter for order reads. The outer `None` means the claim
/// country failed validation: the caller must return an empty list
/// (fail-closed) rather than an error.
pub fn order_scope(claims: &Claims) -> Option<Option<Country>> {
    match claims.role {
        Role::Admin => Some(None),
        Role::Manager | Role::Member => claims.country.map(Some),
    }
}

/// Gate for checkout and cancel. Members are blocked outright,
/// managers only act on their own orders, admins on any order.
pub fn authorize_transition(claims: &Claims, owner_id: Uuid) -> Result<(), AppError> {
    match claims.role {
        Role::Member => Err(AppError::Forbidden(
            "you do not have permission to place or cancel orders".into(),
        )),
        Role::Manager if owner_id != claims.user_id => Err(AppError::Forbidden(
            "you can only act on your own orders".into(),
        )),
        Role::Manager | Role::Admin => Ok(()),
    }
}

/// Cart-line ownership: every role, admins included, may only touch
/// lines of their own pending order.
pub fn authorize_item_mutation(claims: &Claims, owner_id: Uuid) -> Result<(), AppError> {
    if owner_id == claims.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you do not have permission to modify this item".into(),
        ))
    }
}

/// Single-restaurant read: non-admins never see a restaurant outside
/// their own country.
pub fn authorize_restaurant_view(claims: &Claims, restaurant: &Restaurant) -> Result<(), AppError> {
    match claims.role {
        Role::Admin => Ok(()),
        Role::Manager | Role::Member if claims.country == Some(restaurant.country) => Ok(()),
        Role::Manager | Role::Member => Err(AppError::Forbidden("forbidden".into())),
    }
}

/// Payment method updates are admin-only and self-targeted.
pub fn authorize_payment_update(claims: &Claims) -> Result<(), AppError> {
    match claims.role {
        Role::Admin => Ok(()),
        Role::Manager | Role::Member => Err(AppError::Forbidden(
            "you do not have permission to perform this action".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, country: Option<Country>) -> Claims {
        Claims {
            user_id: Uuid::new_v4(),
            name: "test".into(),
            role,
            country,
        }
    }

    #[test]
    fn member_may_never_checkout_or_cancel() {
        let member = claims(Role::Member, Some(Country::India));
        // Even their own order.
        assert!(matches!(
            authorize_transition(&member, member.user_id),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn manager_is_limited_to_own_orders() {
        let manager = claims(Role::Manager, Some(Country::India));
        assert!(authorize_transition(&manager, manager.user_id).is_ok());
        assert!(matches!(
            authorize_transition(&manager, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_may_transition_any_order() {
        let admin = claims(Role::Admin, Some(Country::America));
        assert!(authorize_transition(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn restaurant_scope_is_unrestricted_for_admin_only() {
        let admin = claims(Role::Admin, None);
        assert_eq!(restaurant_scope(&admin).unwrap(), None);

        let manager = claims(Role::Manager, Some(Country::America));
        assert_eq!(restaurant_scope(&manager).unwrap(), Some(Country::America));

        let bad_claim = claims(Role::Member, None);
        assert!(matches!(
            restaurant_scope(&bad_claim),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn order_scope_fails_closed_on_invalid_country() {
        assert_eq!(order_scope(&claims(Role::Admin, None)), Some(None));
        assert_eq!(
            order_scope(&claims(Role::Member, Some(Country::India))),
            Some(Some(Country::India))
        );
        // Invalid claim country: empty result, not an error.
        assert_eq!(order_scope(&claims(Role::Member, None)), None);
    }

    #[test]
    fn cross_country_restaurant_view_is_forbidden_for_non_admins() {
        let restaurant = Restaurant::new("Delhi Darbar", Country::India);

        let american = claims(Role::Manager, Some(Country::America));
        assert!(matches!(
            authorize_restaurant_view(&american, &restaurant),
            Err(AppError::Forbidden(_))
        ));

        let local = claims(Role::Member, Some(Country::India));
        assert!(authorize_restaurant_view(&local, &restaurant).is_ok());

        let admin = claims(Role::Admin, Some(Country::America));
        assert!(authorize_restaurant_view(&admin, &restaurant).is_ok());
    }

    #[test]
    fn payment_update_is_admin_only() {
        assert!(authorize_payment_update(&claims(Role::Admin, None)).is_ok());
        for role in [Role::Manager, Role::Member] {
            assert!(matches!(
                authorize_payment_update(&claims(role, Some(Country::India))),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn item_mutation_requires_ownership_for_every_role() {
        for role in [Role::Admin, Role::Manager, Role::Member] {
            let c = claims(role, Some(Country::India));
            assert!(authorize_item_mutation(&c, c.user_id).is_ok());
            assert!(matches!(
                authorize_item_mutation(&c, Uuid::new_v4()),
                Err(AppError::Forbidden(_))
            ));
        }
    }
}
