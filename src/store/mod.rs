//! Persistence abstraction.
//!
//! A [`Store`] hands out transactional [`Session`]s: every multi-step
//! write (find-or-create cart, item mutation plus total recompute)
//! runs against one session and commits atomically. Dropping a session
//! without committing rolls the whole operation back.

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Country, MenuItem, Order, OrderItem, OrderStatus, Restaurant, User};

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Which slice of a user's orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    /// Pending orders only (the cart).
    Cart,
    /// Everything except pending, newest first.
    History,
}

/// Factory for transactional sessions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Session: Session;

    /// Begin a new transaction session.
    async fn begin(&self) -> StoreResult<Self::Session>;
}

/// A single transaction over the full data model.
///
/// Methods take `&mut self` so a session is used from one task at a
/// time; `commit`/`rollback` consume it. Implementations must roll
/// back on drop if the session was never committed.
#[async_trait]
pub trait Session: Send {
    // --- users ---
    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;
    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<Option<User>>;
    async fn set_payment_method(&mut self, user_id: Uuid, method: &str)
        -> StoreResult<Option<User>>;

    // --- catalog ---
    async fn insert_restaurant(&mut self, restaurant: &Restaurant) -> StoreResult<()>;
    async fn insert_menu_item(&mut self, item: &MenuItem) -> StoreResult<()>;
    /// Restaurants, optionally limited to one country. `None` means no
    /// country filter (admin visibility).
    async fn restaurants(&mut self, country: Option<Country>) -> StoreResult<Vec<Restaurant>>;
    async fn restaurant_by_id(&mut self, id: Uuid) -> StoreResult<Option<Restaurant>>;
    async fn menu_for_restaurant(&mut self, restaurant_id: Uuid) -> StoreResult<Vec<MenuItem>>;
    async fn menu_item_by_id(&mut self, id: Uuid) -> StoreResult<Option<MenuItem>>;

    // --- orders ---
    /// The single pending order for (user, restaurant), if any. This
    /// read is the critical section of find-or-create: implementations
    /// must serialize it against concurrent writers (row lock or
    /// equivalent) so two carts are never created for the same pair.
    async fn pending_order_for(
        &mut self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> StoreResult<Option<Order>>;
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;
    async fn order_by_id(&mut self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> StoreResult<()>;
    async fn set_order_total(&mut self, id: Uuid, total: Decimal) -> StoreResult<()>;
    async fn delete_order(&mut self, id: Uuid) -> StoreResult<()>;
    /// A user's orders per `filter`, newest first. `country` limits to
    /// orders whose restaurant is in that country (non-admin scoping).
    async fn orders_for_user(
        &mut self,
        user_id: Uuid,
        filter: OrderFilter,
        country: Option<Country>,
    ) -> StoreResult<Vec<Order>>;

    // --- order items ---
    async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()>;
    async fn order_item_by_id(&mut self, id: Uuid) -> StoreResult<Option<OrderItem>>;
    /// The existing line for a menu item within an order, if present.
    async fn order_item_for_menu_item(
        &mut self,
        order_id: Uuid,
        menu_item_id: Uuid,
    ) -> StoreResult<Option<OrderItem>>;
    async fn set_item_quantity(&mut self, id: Uuid, quantity: i32) -> StoreResult<()>;
    async fn delete_order_item(&mut self, id: Uuid) -> StoreResult<()>;
    /// All live lines of an order joined with their menu items, in
    /// insertion order. Totals are derived from exactly this view.
    async fn items_with_menu(&mut self, order_id: Uuid)
        -> StoreResult<Vec<(OrderItem, MenuItem)>>;

    // --- transaction control ---
    async fn commit(self) -> StoreResult<()>;
    async fn rollback(self) -> StoreResult<()>;
}
