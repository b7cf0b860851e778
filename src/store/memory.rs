//! In-memory store.
//!
//! Backs the test suite and local demos with the same transactional
//! contract as Postgres: a session takes the store-wide lock for its
//! whole lifetime (serializing the critical sections) and keeps a
//! snapshot of the data, restored if the session is dropped without a
//! commit.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{Country, MenuItem, Order, OrderItem, OrderStatus, Restaurant, User};

use super::{OrderFilter, Session, Store, StoreResult};

#[derive(Debug, Default, Clone)]
struct MemData {
    users: HashMap<Uuid, User>,
    restaurants: HashMap<Uuid, Restaurant>,
    menu_items: HashMap<Uuid, MenuItem>,
    /// Insertion order preserved so newest-first listings are stable
    /// even when timestamps collide.
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// Store implementation over process-local tables.
#[derive(Default)]
pub struct MemStore {
    inner: Arc<Mutex<MemData>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    type Session = MemSession;

    async fn begin(&self) -> StoreResult<Self::Session> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let snapshot = guard.clone();
        Ok(MemSession {
            guard,
            snapshot: Some(snapshot),
        })
    }
}

/// One transaction over the in-memory tables. Holds the store lock
/// until commit or drop.
pub struct MemSession {
    guard: OwnedMutexGuard<MemData>,
    /// Pre-transaction state; `None` once committed.
    snapshot: Option<MemData>,
}

impl Drop for MemSession {
    fn drop(&mut self) {
        // Uncommitted sessions roll back.
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl Session for MemSession {
    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        self.guard.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.guard.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.guard.users.get(&id).cloned())
    }

    async fn set_payment_method(
        &mut self,
        user_id: Uuid,
        method: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self.guard.users.get_mut(&user_id).map(|user| {
            user.payment_method = Some(method.to_string());
            user.clone()
        }))
    }

    async fn insert_restaurant(&mut self, restaurant: &Restaurant) -> StoreResult<()> {
        self.guard
            .restaurants
            .insert(restaurant.id, restaurant.clone());
        Ok(())
    }

    async fn insert_menu_item(&mut self, item: &MenuItem) -> StoreResult<()> {
        self.guard.menu_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn restaurants(&mut self, country: Option<Country>) -> StoreResult<Vec<Restaurant>> {
        let mut list: Vec<Restaurant> = self
            .guard
            .restaurants
            .values()
            .filter(|r| country.is_none_or(|c| r.country == c))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn restaurant_by_id(&mut self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        Ok(self.guard.restaurants.get(&id).cloned())
    }

    async fn menu_for_restaurant(&mut self, restaurant_id: Uuid) -> StoreResult<Vec<MenuItem>> {
        let mut list: Vec<MenuItem> = self
            .guard
            .menu_items
            .values()
            .filter(|m| m.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn menu_item_by_id(&mut self, id: Uuid) -> StoreResult<Option<MenuItem>> {
        Ok(self.guard.menu_items.get(&id).cloned())
    }

    async fn pending_order_for(
        &mut self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> StoreResult<Option<Order>> {
        // The session already holds the store-wide lock, which is the
        // in-memory equivalent of the Postgres row lock here.
        Ok(self
            .guard
            .orders
            .iter()
            .find(|o| {
                o.user_id == user_id
                    && o.restaurant_id == restaurant_id
                    && o.status == OrderStatus::Pending
            })
            .cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        self.guard.orders.push(order.clone());
        Ok(())
    }

    async fn order_by_id(&mut self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.guard.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> StoreResult<()> {
        if let Some(order) = self.guard.orders.iter_mut().find(|o| o.id == id) {
            order.status = status;
        }
        Ok(())
    }

    async fn set_order_total(&mut self, id: Uuid, total: Decimal) -> StoreResult<()> {
        if let Some(order) = self.guard.orders.iter_mut().find(|o| o.id == id) {
            order.total_price = total;
        }
        Ok(())
    }

    async fn delete_order(&mut self, id: Uuid) -> StoreResult<()> {
        self.guard.orders.retain(|o| o.id != id);
        // Cascade, like the Postgres FK.
        self.guard.order_items.retain(|i| i.order_id != id);
        Ok(())
    }

    async fn orders_for_user(
        &mut self,
        user_id: Uuid,
        filter: OrderFilter,
        country: Option<Country>,
    ) -> StoreResult<Vec<Order>> {
        let restaurants = &self.guard.restaurants;
        let mut list: Vec<Order> = self
            .guard
            .orders
            .iter()
            .rev() // newest insertions first among equal timestamps
            .filter(|o| o.user_id == user_id)
            .filter(|o| match filter {
                OrderFilter::Cart => o.status == OrderStatus::Pending,
                OrderFilter::History => o.status != OrderStatus::Pending,
            })
            .filter(|o| {
                country.is_none_or(|c| {
                    restaurants
                        .get(&o.restaurant_id)
                        .is_some_and(|r| r.country == c)
                })
            })
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
        self.guard.order_items.push(item.clone());
        Ok(())
    }

    async fn order_item_by_id(&mut self, id: Uuid) -> StoreResult<Option<OrderItem>> {
        Ok(self.guard.order_items.iter().find(|i| i.id == id).cloned())
    }

    async fn order_item_for_menu_item(
        &mut self,
        order_id: Uuid,
        menu_item_id: Uuid,
    ) -> StoreResult<Option<OrderItem>> {
        Ok(self
            .guard
            .order_items
            .iter()
            .find(|i| i.order_id == order_id && i.menu_item_id == menu_item_id)
            .cloned())
    }

    async fn set_item_quantity(&mut self, id: Uuid, quantity: i32) -> StoreResult<()> {
        if let Some(item) = self.guard.order_items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_order_item(&mut self, id: Uuid) -> StoreResult<()> {
        self.guard.order_items.retain(|i| i.id != id);
        Ok(())
    }

    async fn items_with_menu(
        &mut self,
        order_id: Uuid,
    ) -> StoreResult<Vec<(OrderItem, MenuItem)>> {
        let menu_items = &self.guard.menu_items;
        let mut list: Vec<(OrderItem, MenuItem)> = self
            .guard
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .filter_map(|i| menu_items.get(&i.menu_item_id).map(|m| (i.clone(), m.clone())))
            .collect();
        list.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        Ok(list)
    }

    async fn commit(mut self) -> StoreResult<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        // Drop restores the snapshot.
        Ok(())
    }
}
