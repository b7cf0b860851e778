//! Response bodies for the HTTP interface.
//!
//! Wire names are camelCase to match the public contract. Views never
//! expose password hashes; order views always carry their restaurant
//! and line detail so clients don't re-fetch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Country, MenuItem, Order, OrderStatus, Restaurant, Role, User};
use crate::error::AppError;
use crate::store::{Session, StoreError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    pub id: Uuid,
    pub name: String,
    pub country: Country,
    pub currency_symbol: &'static str,
}

impl From<&Restaurant> for RestaurantView {
    fn from(r: &Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            country: r.country,
            currency_symbol: r.country.symbol(),
        }
    }
}

/// A restaurant together with its menu, as returned by the
/// single-restaurant read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: RestaurantView,
    pub menu_items: Vec<MenuItemView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemView {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub restaurant_id: Uuid,
}

impl From<&MenuItem> for MenuItemView {
    fn from(m: &MenuItem) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            price: m.price,
            restaurant_id: m.restaurant_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: Uuid,
    pub quantity: i32,
    pub menu_item: MenuItemView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub restaurant: RestaurantView,
    pub items: Vec<OrderItemView>,
}

/// A user profile as shown to its owner. The password hash never
/// leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub country: Country,
    pub payment_method: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role,
            country: u.country,
            payment_method: u.payment_method.clone(),
        }
    }
}

/// Assemble the full view of one order within the current session.
pub(crate) async fn load_order_view<S: Session>(
    session: &mut S,
    order: &Order,
) -> Result<OrderView, AppError> {
    let restaurant = session
        .restaurant_by_id(order.restaurant_id)
        .await?
        .ok_or_else(|| {
            StoreError::Conflict(format!("order {} references a missing restaurant", order.id))
        })?;

    let items = session
        .items_with_menu(order.id)
        .await?
        .iter()
        .map(|(item, menu_item)| OrderItemView {
            id: item.id,
            quantity: item.quantity,
            menu_item: menu_item.into(),
        })
        .collect();

    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        restaurant_id: order.restaurant_id,
        status: order.status,
        total_price: order.total_price,
        created_at: order.created_at,
        restaurant: (&restaurant).into(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn user_profile_never_contains_the_password_hash() {
        let user = User::new(
            "nickfury@slooze.xyz",
            "Nick Fury",
            "$2b$10$secret",
            Role::Admin,
            Country::America,
        );
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "nickfury@slooze.xyz");
    }

    #[test]
    fn restaurant_view_carries_the_currency_symbol() {
        let india = Restaurant::new("Spice Route", Country::India);
        let view = RestaurantView::from(&india);
        assert_eq!(view.currency_symbol, "₹");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["currencySymbol"], "₹");
        assert_eq!(json["country"], "INDIA");
    }

    #[test]
    fn menu_item_view_uses_camel_case_names() {
        let item = MenuItem::new("Biryani", dec!(250.0), Uuid::new_v4());
        let json = serde_json::to_value(MenuItemView::from(&item)).unwrap();
        assert!(json.get("restaurantId").is_some());
        assert!(json.get("restaurant_id").is_none());
    }
}
