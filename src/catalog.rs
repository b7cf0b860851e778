//! Country-scoped catalog reads.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::policy;
use crate::store::{Session, Store};
use crate::views::{MenuItemView, RestaurantDetail, RestaurantView};

pub struct CatalogService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Restaurants visible to the requester: all of them for admins,
    /// own-country for everyone else.
    pub async fn list_restaurants(&self, claims: &Claims) -> Result<Vec<RestaurantView>, AppError> {
        let scope = policy::restaurant_scope(claims)?;

        let mut session = self.store.begin().await?;
        let restaurants = session.restaurants(scope).await?;
        session.commit().await?;

        Ok(restaurants.iter().map(RestaurantView::from).collect())
    }

    /// One restaurant with its menu. Cross-country reads by non-admins
    /// are forbidden even when the id is guessed correctly.
    pub async fn get_restaurant(
        &self,
        claims: &Claims,
        id: Uuid,
    ) -> Result<RestaurantDetail, AppError> {
        let mut session = self.store.begin().await?;

        let restaurant = session
            .restaurant_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("restaurant not found".into()))?;

        policy::authorize_restaurant_view(claims, &restaurant)?;

        let menu = session.menu_for_restaurant(restaurant.id).await?;
        session.commit().await?;

        Ok(RestaurantDetail {
            restaurant: (&restaurant).into(),
            menu_items: menu.iter().map(MenuItemView::from).collect(),
        })
    }
}
