//! Tiffin: a role- and country-scoped food ordering backend.
//!
//! Users browse restaurants scoped to their country, build a cart (a
//! pending order), place and cancel orders; admins manage their
//! payment method. The interesting parts live in three layers:
//!
//! - [`policy`] — pure authorization decisions over verified claims.
//! - [`orders`] — the order lifecycle state machine and the cart total
//!   recalculation, always inside one store transaction.
//! - [`store`] — a unit-of-work persistence abstraction with Postgres
//!   and in-memory implementations sharing one transactional contract.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod currency;
pub mod domain;
pub mod error;
pub mod http;
pub mod orders;
pub mod policy;
pub mod store;
pub mod users;
pub mod views;

pub use auth::{AuthService, Claims, TokenService};
pub use catalog::CatalogService;
pub use config::Config;
pub use error::AppError;
pub use http::{router, AppState};
pub use orders::OrderService;
pub use store::{MemStore, PgStore, Session, Store};
pub use users::UserService;
