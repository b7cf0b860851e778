//! Domain entities and the closed enumerations they are built from.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{MenuItem, Restaurant};
pub use order::{Order, OrderItem, OrderStatus};
pub use user::{Country, Role, User};
