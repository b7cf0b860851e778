//! Order lifecycle manager.
//!
//! Owns every state transition and the cart total recalculation. Each
//! operation runs in one store session: all steps commit together or
//! the dropped session rolls them back. Totals are always derived from
//! the live lines inside that same transaction, never taken from the
//! client.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Claims;
use crate::domain::{Order, OrderItem, OrderStatus};
use crate::error::AppError;
use crate::policy;
use crate::store::{OrderFilter, Session, Store};
use crate::views::{load_order_view, OrderView};

/// Result of removing a cart line: either the surviving order, or
/// confirmation that the now-empty order was deleted with it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RemoveItemOutcome {
    Order(OrderView),
    Deleted { message: String },
}

pub struct OrderService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Add `quantity` of a menu item to the requester's cart for that
    /// item's restaurant, creating the cart if none is pending.
    pub async fn add_item(
        &self,
        claims: &Claims,
        menu_item_id: Uuid,
        quantity: i32,
    ) -> Result<OrderView, AppError> {
        if quantity <= 0 {
            return Err(AppError::Validation("a valid quantity is required".into()));
        }

        let mut session = self.store.begin().await?;

        let menu_item = session
            .menu_item_by_id(menu_item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("menu item not found".into()))?;

        // Find-or-create the single pending order for this pair. The
        // lookup is serialized by the session, so concurrent adds
        // cannot race a duplicate cart into existence.
        let order = match session
            .pending_order_for(claims.user_id, menu_item.restaurant_id)
            .await?
        {
            Some(order) => order,
            None => {
                let order = Order::new_pending(claims.user_id, menu_item.restaurant_id);
                session.insert_order(&order).await?;
                debug!(order = %order.id, user = %claims.user_id, "created pending order");
                order
            }
        };

        match session
            .order_item_for_menu_item(order.id, menu_item.id)
            .await?
        {
            Some(existing) => {
                let combined = existing.quantity.checked_add(quantity).ok_or_else(|| {
                    AppError::Validation("a valid quantity is required".into())
                })?;
                session.set_item_quantity(existing.id, combined).await?;
            }
            None => {
                let line = OrderItem::new(order.id, menu_item.id, quantity);
                session.insert_order_item(&line).await?;
            }
        }

        let order = self.recompute_total(&mut session, order).await?;
        let view = load_order_view(&mut session, &order).await?;
        session.commit().await?;
        Ok(view)
    }

    /// Set the quantity of an existing cart line.
    pub async fn update_item(
        &self,
        claims: &Claims,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<OrderView, AppError> {
        if quantity <= 0 {
            return Err(AppError::Validation("a valid quantity is required".into()));
        }

        let mut session = self.store.begin().await?;
        let (item, order) = self.mutable_line(&mut session, claims, item_id).await?;

        session.set_item_quantity(item.id, quantity).await?;
        let order = self.recompute_total(&mut session, order).await?;
        let view = load_order_view(&mut session, &order).await?;
        session.commit().await?;
        Ok(view)
    }

    /// Remove a cart line; a cart left with zero lines is deleted
    /// outright, never persisted empty.
    pub async fn remove_item(
        &self,
        claims: &Claims,
        item_id: Uuid,
    ) -> Result<RemoveItemOutcome, AppError> {
        let mut session = self.store.begin().await?;
        let (item, order) = self.mutable_line(&mut session, claims, item_id).await?;

        session.delete_order_item(item.id).await?;

        let remaining = session.items_with_menu(order.id).await?;
        if remaining.is_empty() {
            session.delete_order(order.id).await?;
            session.commit().await?;
            info!(order = %order.id, "cart emptied and deleted");
            return Ok(RemoveItemOutcome::Deleted {
                message: "item removed and cart deleted as it was empty".into(),
            });
        }

        let order = self.recompute_total(&mut session, order).await?;
        let view = load_order_view(&mut session, &order).await?;
        session.commit().await?;
        Ok(RemoveItemOutcome::Order(view))
    }

    /// PENDING -> PLACED. Members are blocked, managers must own the
    /// order, admins may place any order.
    pub async fn checkout(&self, claims: &Claims, order_id: Uuid) -> Result<OrderView, AppError> {
        self.transition(claims, order_id, OrderStatus::Placed).await
    }

    /// PLACED -> CANCELLED, same role/ownership gates as checkout.
    pub async fn cancel(&self, claims: &Claims, order_id: Uuid) -> Result<OrderView, AppError> {
        self.transition(claims, order_id, OrderStatus::Cancelled)
            .await
    }

    /// The requester's pending orders (the cart), country-scoped.
    pub async fn list_cart(&self, claims: &Claims) -> Result<Vec<OrderView>, AppError> {
        self.list(claims, OrderFilter::Cart).await
    }

    /// The requester's placed/cancelled orders, newest first.
    pub async fn order_history(&self, claims: &Claims) -> Result<Vec<OrderView>, AppError> {
        self.list(claims, OrderFilter::History).await
    }

    async fn list(&self, claims: &Claims, filter: OrderFilter) -> Result<Vec<OrderView>, AppError> {
        // Invalid country claim fails closed: an empty list, not an error.
        let Some(country) = policy::order_scope(claims) else {
            return Ok(Vec::new());
        };

        let mut session = self.store.begin().await?;
        let orders = session
            .orders_for_user(claims.user_id, filter, country)
            .await?;

        let mut views = Vec::with_capacity(orders.len());
        for order in &orders {
            views.push(load_order_view(&mut session, order).await?);
        }
        session.commit().await?;
        Ok(views)
    }

    async fn transition(
        &self,
        claims: &Claims,
        order_id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderView, AppError> {
        let mut session = self.store.begin().await?;

        let order = session
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("order not found".into()))?;

        policy::authorize_transition(claims, order.user_id)?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "cannot move an order with status {} to {}",
                order.status, next
            )));
        }

        session.set_order_status(order.id, next).await?;
        let order = Order {
            status: next,
            ..order
        };
        let view = load_order_view(&mut session, &order).await?;
        session.commit().await?;

        info!(order = %order.id, user = %claims.user_id, status = %next, "order transitioned");
        Ok(view)
    }

    /// Look up a cart line and its parent order, enforcing ownership
    /// and the items-only-mutate-while-pending rule.
    async fn mutable_line(
        &self,
        session: &mut S::Session,
        claims: &Claims,
        item_id: Uuid,
    ) -> Result<(OrderItem, Order), AppError> {
        let item = session
            .order_item_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("order item not found".into()))?;

        let order = session
            .order_by_id(item.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("order not found".into()))?;

        policy::authorize_item_mutation(claims, order.user_id)?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "cannot modify items of an order with status {}",
                order.status
            )));
        }

        Ok((item, order))
    }

    /// Recompute `total_price` from the live lines and persist it,
    /// returning the order with the fresh total.
    async fn recompute_total(
        &self,
        session: &mut S::Session,
        order: Order,
    ) -> Result<Order, AppError> {
        let items = session.items_with_menu(order.id).await?;
        let total: Decimal = items
            .iter()
            .map(|(item, menu_item)| menu_item.price * Decimal::from(item.quantity))
            .sum();

        session.set_order_total(order.id, total).await?;
        Ok(Order {
            total_price: total,
            ..order
        })
    }
}
