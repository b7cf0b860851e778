//! HTTP surface: shared state and the router.

pub mod handlers;

use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

use crate::auth::{AuthService, TokenService};
use crate::catalog::CatalogService;
use crate::orders::OrderService;
use crate::store::Store;
use crate::users::UserService;

/// Per-process state handed to every handler. Cheap to clone; all
/// services share one store.
pub struct AppState<S: Store> {
    pub auth: Arc<AuthService<S>>,
    pub orders: Arc<OrderService<S>>,
    pub catalog: Arc<CatalogService<S>>,
    pub users: Arc<UserService<S>>,
    pub tokens: TokenService,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            orders: Arc::clone(&self.orders),
            catalog: Arc::clone(&self.catalog),
            users: Arc::clone(&self.users),
            tokens: self.tokens.clone(),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>, tokens: TokenService) -> Self {
        Self {
            auth: Arc::new(AuthService::new(Arc::clone(&store), tokens.clone())),
            orders: Arc::new(OrderService::new(Arc::clone(&store))),
            catalog: Arc::new(CatalogService::new(Arc::clone(&store))),
            users: Arc::new(UserService::new(store)),
            tokens,
        }
    }
}

/// Lets the claims extractor pull the token service out of any state
/// that embeds it.
impl<S: Store> FromRef<AppState<S>> for TokenService {
    fn from_ref(state: &AppState<S>) -> Self {
        state.tokens.clone()
    }
}

/// Build the full route table. Everything except `/auth/login` runs
/// behind the bearer-token claims extractor.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/auth/login", post(handlers::login::<S>))
        .route("/restaurants", get(handlers::list_restaurants::<S>))
        .route("/restaurants/{id}", get(handlers::get_restaurant::<S>))
        .route(
            "/orders",
            get(handlers::list_cart::<S>).post(handlers::add_item::<S>),
        )
        .route("/orders/history", get(handlers::order_history::<S>))
        .route(
            "/orders/items/{itemId}",
            put(handlers::update_item::<S>).delete(handlers::remove_item::<S>),
        )
        .route("/orders/{orderId}/checkout", put(handlers::checkout::<S>))
        .route("/orders/{orderId}/cancel", put(handlers::cancel::<S>))
        .route("/users/me", get(handlers::profile::<S>))
        .route("/users/payment", put(handlers::update_payment::<S>))
        .with_state(state)
}
