//! Postgres-backed store.
//!
//! The pool is an explicit resource: built once at process start,
//! sessions borrowed from it per request, closed on shutdown. Each
//! [`PgSession`] wraps one `sqlx` transaction; dropping it without
//! committing rolls back (sqlx's transaction drop semantics).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::{Country, MenuItem, Order, OrderItem, OrderStatus, Restaurant, User};

use super::{OrderFilter, Session, Store, StoreError, StoreResult};

/// Schema setup, applied idempotently at startup.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        country TEXT NOT NULL,
        payment_method TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS restaurants (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        country TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS menu_items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        price NUMERIC NOT NULL CHECK (price >= 0),
        restaurant_id UUID NOT NULL REFERENCES restaurants(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id),
        restaurant_id UUID NOT NULL REFERENCES restaurants(id),
        status TEXT NOT NULL,
        total_price NUMERIC NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        menu_item_id UUID NOT NULL REFERENCES menu_items(id),
        quantity INTEGER NOT NULL CHECK (quantity > 0)
    )
    "#,
    // Backs the one-pending-cart-per-(user, restaurant) invariant; the
    // write path still does the locked lookup first.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS orders_one_pending_per_pair
        ON orders (user_id, restaurant_id)
        WHERE status = 'PENDING'
    "#,
];

/// Store implementation on a Postgres connection pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a bounded pool to the given database.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema. Safe to run on every startup.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Close the pool, waiting for in-flight connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> StoreResult<Self::Session> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }
}

/// One transaction against Postgres.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

fn parse_role(raw: &str) -> StoreResult<crate::domain::Role> {
    raw.parse()
        .map_err(|_| StoreError::Conflict(format!("unknown role in database: {raw}")))
}

fn parse_country(raw: &str) -> StoreResult<Country> {
    raw.parse()
        .map_err(|_| StoreError::Conflict(format!("unknown country in database: {raw}")))
}

fn parse_status(raw: &str) -> StoreResult<OrderStatus> {
    raw.parse()
        .map_err(|_| StoreError::Conflict(format!("unknown order status in database: {raw}")))
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_role(&row.try_get::<String, _>("role")?)?,
        country: parse_country(&row.try_get::<String, _>("country")?)?,
        payment_method: row.try_get("payment_method")?,
    })
}

fn restaurant_from_row(row: &PgRow) -> StoreResult<Restaurant> {
    Ok(Restaurant {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        country: parse_country(&row.try_get::<String, _>("country")?)?,
    })
}

fn menu_item_from_row(row: &PgRow) -> StoreResult<MenuItem> {
    Ok(MenuItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: row.try_get::<Decimal, _>("price")?,
        restaurant_id: row.try_get("restaurant_id")?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        restaurant_id: row.try_get("restaurant_id")?,
        status: parse_status(&row.try_get::<String, _>("status")?)?,
        total_price: row.try_get::<Decimal, _>("total_price")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn order_item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        quantity: row.try_get("quantity")?,
    })
}

#[async_trait]
impl Session for PgSession {
    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, country, payment_method) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.country.to_string())
        .bind(&user.payment_method)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_id(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn set_payment_method(
        &mut self,
        user_id: Uuid,
        method: &str,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query("UPDATE users SET payment_method = $2 WHERE id = $1 RETURNING *")
            .bind(user_id)
            .bind(method)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_restaurant(&mut self, restaurant: &Restaurant) -> StoreResult<()> {
        sqlx::query("INSERT INTO restaurants (id, name, country) VALUES ($1, $2, $3)")
            .bind(restaurant.id)
            .bind(&restaurant.name)
            .bind(restaurant.country.to_string())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_menu_item(&mut self, item: &MenuItem) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO menu_items (id, name, price, restaurant_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.restaurant_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn restaurants(&mut self, country: Option<Country>) -> StoreResult<Vec<Restaurant>> {
        let rows = match country {
            Some(country) => {
                sqlx::query("SELECT * FROM restaurants WHERE country = $1 ORDER BY name")
                    .bind(country.to_string())
                    .fetch_all(&mut *self.tx)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM restaurants ORDER BY name")
                    .fetch_all(&mut *self.tx)
                    .await?
            }
        };
        rows.iter().map(restaurant_from_row).collect()
    }

    async fn restaurant_by_id(&mut self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        let row = sqlx::query("SELECT * FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(restaurant_from_row).transpose()
    }

    async fn menu_for_restaurant(&mut self, restaurant_id: Uuid) -> StoreResult<Vec<MenuItem>> {
        let rows = sqlx::query("SELECT * FROM menu_items WHERE restaurant_id = $1 ORDER BY name")
            .bind(restaurant_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(menu_item_from_row).collect()
    }

    async fn menu_item_by_id(&mut self, id: Uuid) -> StoreResult<Option<MenuItem>> {
        let row = sqlx::query("SELECT * FROM menu_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(menu_item_from_row).transpose()
    }

    async fn pending_order_for(
        &mut self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> StoreResult<Option<Order>> {
        // Row lock serializes concurrent find-or-create for the same
        // (user, restaurant) pair within this transaction.
        let row = sqlx::query(
            "SELECT * FROM orders \
             WHERE user_id = $1 AND restaurant_id = $2 AND status = 'PENDING' \
             FOR UPDATE",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, restaurant_id, status, total_price, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.restaurant_id)
        .bind(order.status.to_string())
        .bind(order.total_price)
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn order_by_id(&mut self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> StoreResult<()> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn set_order_total(&mut self, id: Uuid, total: Decimal) -> StoreResult<()> {
        sqlx::query("UPDATE orders SET total_price = $2 WHERE id = $1")
            .bind(id)
            .bind(total)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_order(&mut self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn orders_for_user(
        &mut self,
        user_id: Uuid,
        filter: OrderFilter,
        country: Option<Country>,
    ) -> StoreResult<Vec<Order>> {
        let status_clause = match filter {
            OrderFilter::Cart => "o.status = 'PENDING'",
            OrderFilter::History => "o.status <> 'PENDING'",
        };
        let rows = match country {
            Some(country) => {
                let sql = format!(
                    "SELECT o.* FROM orders o \
                     JOIN restaurants r ON r.id = o.restaurant_id \
                     WHERE o.user_id = $1 AND {status_clause} AND r.country = $2 \
                     ORDER BY o.created_at DESC"
                );
                sqlx::query(&sql)
                    .bind(user_id)
                    .bind(country.to_string())
                    .fetch_all(&mut *self.tx)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT o.* FROM orders o \
                     WHERE o.user_id = $1 AND {status_clause} \
                     ORDER BY o.created_at DESC"
                );
                sqlx::query(&sql)
                    .bind(user_id)
                    .fetch_all(&mut *self.tx)
                    .await?
            }
        };
        rows.iter().map(order_from_row).collect()
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, menu_item_id, quantity) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.menu_item_id)
        .bind(item.quantity)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn order_item_by_id(&mut self, id: Uuid) -> StoreResult<Option<OrderItem>> {
        let row = sqlx::query("SELECT * FROM order_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(order_item_from_row).transpose()
    }

    async fn order_item_for_menu_item(
        &mut self,
        order_id: Uuid,
        menu_item_id: Uuid,
    ) -> StoreResult<Option<OrderItem>> {
        let row = sqlx::query(
            "SELECT * FROM order_items WHERE order_id = $1 AND menu_item_id = $2",
        )
        .bind(order_id)
        .bind(menu_item_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(order_item_from_row).transpose()
    }

    async fn set_item_quantity(&mut self, id: Uuid, quantity: i32) -> StoreResult<()> {
        sqlx::query("UPDATE order_items SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_order_item(&mut self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn items_with_menu(
        &mut self,
        order_id: Uuid,
    ) -> StoreResult<Vec<(OrderItem, MenuItem)>> {
        let rows = sqlx::query(
            "SELECT oi.id, oi.order_id, oi.menu_item_id, oi.quantity, \
                    mi.id AS mi_id, mi.name, mi.price, mi.restaurant_id \
             FROM order_items oi \
             JOIN menu_items mi ON mi.id = oi.menu_item_id \
             WHERE oi.order_id = $1 \
             ORDER BY mi.name",
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| {
                let item = order_item_from_row(row)?;
                let menu_item = MenuItem {
                    id: row.try_get("mi_id")?,
                    name: row.try_get("name")?,
                    price: row.try_get::<Decimal, _>("price")?,
                    restaurant_id: row.try_get("restaurant_id")?,
                };
                Ok((item, menu_item))
            })
            .collect()
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
