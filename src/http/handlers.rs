//! Request handlers.
//!
//! Input DTOs use optional fields so missing values surface as 400s
//! with a stable message instead of deserialization rejections. All
//! identity comes from the [`Claims`] extractor, never from client
//! headers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::orders::RemoveItemOutcome;
use crate::store::Store;
use crate::views::{OrderView, RestaurantDetail, RestaurantView, UserProfile};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (email, password) = match (body.email.as_deref(), body.password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(AppError::Validation(
                "email and password are required".into(),
            ))
        }
    };

    let token = state.auth.login(email, password).await?;
    Ok(Json(LoginResponse { token }))
}

pub async fn list_restaurants<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
) -> Result<Json<Vec<RestaurantView>>, AppError> {
    Ok(Json(state.catalog.list_restaurants(&claims).await?))
}

pub async fn get_restaurant<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Path(id): Path<Uuid>,
) -> Result<Json<RestaurantDetail>, AppError> {
    Ok(Json(state.catalog.get_restaurant(&claims, id).await?))
}

pub async fn list_cart<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
) -> Result<Json<Vec<OrderView>>, AppError> {
    Ok(Json(state.orders.list_cart(&claims).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub menu_item_id: Option<String>,
    pub quantity: Option<i32>,
}

pub async fn add_item<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<OrderView>, AppError> {
    let menu_item_id = body
        .menu_item_id
        .as_deref()
        .and_then(|raw| raw.parse::<Uuid>().ok())
        .ok_or_else(|| AppError::Validation("a valid menuItemId is required".into()))?;
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::Validation("a valid quantity is required".into()))?;

    Ok(Json(
        state.orders.add_item(&claims, menu_item_id, quantity).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<i32>,
}

pub async fn update_item<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Path(item_id): Path<Uuid>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<OrderView>, AppError> {
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::Validation("a valid quantity is required".into()))?;

    Ok(Json(
        state.orders.update_item(&claims, item_id, quantity).await?,
    ))
}

pub async fn remove_item<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Path(item_id): Path<Uuid>,
) -> Result<Json<RemoveItemOutcome>, AppError> {
    Ok(Json(state.orders.remove_item(&claims, item_id).await?))
}

pub async fn checkout<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    Ok(Json(state.orders.checkout(&claims, order_id).await?))
}

pub async fn cancel<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    Ok(Json(state.orders.cancel(&claims, order_id).await?))
}

pub async fn order_history<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
) -> Result<Json<Vec<OrderView>>, AppError> {
    Ok(Json(state.orders.order_history(&claims).await?))
}

pub async fn profile<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.users.profile(&claims).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_method: Option<String>,
}

pub async fn update_payment<S: Store>(
    State(state): State<AppState<S>>,
    claims: Claims,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let method = body.payment_method.as_deref().ok_or_else(|| {
        AppError::Validation("a valid paymentMethod string is required".into())
    })?;

    Ok(Json(
        state.users.update_payment_method(&claims, method).await?,
    ))
}
