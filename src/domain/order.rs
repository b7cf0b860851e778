use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of an order.
///
/// Transitions are monotonic: `Pending -> Placed -> Cancelled`, or the
/// order is deleted while still `Pending` (empty cart). Nothing ever
/// moves backwards, and only a `Pending` order may change its items or
/// total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Placed,
    Cancelled,
}

impl OrderStatus {
    /// Whether `self -> next` is a legal state-machine step.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Placed)
                | (OrderStatus::Placed, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Placed => write!(f, "PLACED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PLACED" => Ok(OrderStatus::Placed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// An order. While `Pending` it doubles as the user's cart for one
/// restaurant; `total_price` is derived, recomputed after every item
/// mutation within the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A fresh cart: `Pending`, empty, zero total.
    pub fn new_pending(user_id: Uuid, restaurant_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            restaurant_id,
            status: OrderStatus::Pending,
            total_price: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}

/// One line of an order. Quantity is always positive; a line that
/// would drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

impl OrderItem {
    pub fn new(order_id: Uuid, menu_item_id: Uuid, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            menu_item_id,
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transitions_are_legal() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Placed));
        assert!(Placed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Cancelled));
        assert!(!Placed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Placed));
        assert!(!Placed.can_transition_to(Placed));
    }

    #[test]
    fn status_round_trips_through_str() {
        use OrderStatus::*;
        for status in [Pending, Placed, Cancelled] {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn new_pending_order_is_empty() {
        let order = Order::new_pending(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, Decimal::ZERO);
    }
}
