mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{fixture, invalid_country_claims};
use tiffin::domain::OrderStatus;
use tiffin::orders::RemoveItemOutcome;
use tiffin::views::OrderView;
use tiffin::{AppError, OrderService};

fn assert_total_invariant(view: &OrderView) {
    let expected = view
        .items
        .iter()
        .map(|line| line.menu_item.price * rust_decimal::Decimal::from(line.quantity))
        .sum::<rust_decimal::Decimal>();
    assert_eq!(view.total_price, expected, "total must equal sum of lines");
}

#[tokio::test]
async fn adding_two_biryani_totals_five_hundred() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let view = orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();

    assert_eq!(view.status, OrderStatus::Pending);
    assert_eq!(view.total_price, dec!(500.0));
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 2);
    assert_total_invariant(&view);
}

#[tokio::test]
async fn adding_the_same_item_increments_its_line() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();
    let view = orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 3);
    assert_eq!(view.total_price, dec!(750.0));
}

#[tokio::test]
async fn repeated_adds_cannot_overflow_a_line_quantity() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    orders
        .add_item(&fx.member, fx.biryani, i32::MAX)
        .await
        .unwrap();
    let err = orders
        .add_item(&fx.member, fx.biryani, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The rejected add rolls back; the line keeps its previous quantity.
    let cart = orders.list_cart(&fx.member).await.unwrap();
    assert_eq!(cart[0].items[0].quantity, i32::MAX);
}

#[tokio::test]
async fn at_most_one_pending_order_per_user_and_restaurant() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();
    orders.add_item(&fx.member, fx.dosa, 1).await.unwrap();

    let cart = orders.list_cart(&fx.member).await.unwrap();
    assert_eq!(cart.len(), 1, "same restaurant reuses the pending order");
    assert_eq!(cart[0].items.len(), 2);
    assert_eq!(cart[0].total_price, dec!(370.0));
}

#[tokio::test]
async fn carts_are_per_restaurant_and_country_scoped_in_listings() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    // Nothing stops a member adding a cross-country dish directly; the
    // listing scope hides the resulting cart from them.
    orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();
    orders.add_item(&fx.member, fx.burger, 1).await.unwrap();

    let cart = orders.list_cart(&fx.member).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].restaurant_id, fx.spice_route);

    // Admins see everything.
    orders.add_item(&fx.admin, fx.burger, 1).await.unwrap();
    let admin_cart = orders.list_cart(&fx.admin).await.unwrap();
    assert_eq!(admin_cart.len(), 1);
    assert_eq!(admin_cart[0].restaurant_id, fx.liberty_diner);
}

#[tokio::test]
async fn invalid_country_claim_yields_an_empty_cart_listing() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();

    let broken = invalid_country_claims(&fx.member);
    let cart = orders.list_cart(&broken).await.unwrap();
    assert!(cart.is_empty(), "fail closed, not an error");
}

#[tokio::test]
async fn unknown_menu_item_is_not_found() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let err = orders
        .add_item(&fx.member, Uuid::new_v4(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    for quantity in [0, -3] {
        let err = orders
            .add_item(&fx.member, fx.biryani, quantity)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let view = orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();
    let err = orders
        .update_item(&fx.member, view.items[0].id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn updating_quantity_recomputes_the_total() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let view = orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();
    let updated = orders
        .update_item(&fx.member, view.items[0].id, 5)
        .await
        .unwrap();

    assert_eq!(updated.total_price, dec!(1250.0));
    assert_total_invariant(&updated);
}

#[tokio::test]
async fn cart_lines_of_other_users_are_forbidden() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let view = orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();
    let line = view.items[0].id;

    for other in [&fx.manager, &fx.admin] {
        let err = orders.update_item(other, line, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = orders.remove_item(other, line).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}

#[tokio::test]
async fn removing_one_of_two_lines_keeps_the_order() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();
    let view = orders.add_item(&fx.member, fx.dosa, 2).await.unwrap();
    let dosa_line = view
        .items
        .iter()
        .find(|line| line.menu_item.id == fx.dosa)
        .unwrap()
        .id;

    match orders.remove_item(&fx.member, dosa_line).await.unwrap() {
        RemoveItemOutcome::Order(view) => {
            assert_eq!(view.items.len(), 1);
            assert_eq!(view.total_price, dec!(250.0));
            assert_total_invariant(&view);
        }
        RemoveItemOutcome::Deleted { .. } => panic!("order should survive"),
    }
}

#[tokio::test]
async fn removing_the_last_item_deletes_the_order() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let view = orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();
    let outcome = orders
        .remove_item(&fx.member, view.items[0].id)
        .await
        .unwrap();
    assert!(matches!(outcome, RemoveItemOutcome::Deleted { .. }));

    // The order is gone: a later transition attempt cannot find it.
    let err = orders.checkout(&fx.manager, view.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(orders.list_cart(&fx.member).await.unwrap().is_empty());
}

#[tokio::test]
async fn member_can_never_checkout_or_cancel() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let view = orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();

    let err = orders.checkout(&fx.member, view.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = orders.cancel(&fx.member, view.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn manager_checkout_and_cancel_on_own_order() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let cart = orders.add_item(&fx.manager, fx.dosa, 1).await.unwrap();

    let placed = orders.checkout(&fx.manager, cart.id).await.unwrap();
    assert_eq!(placed.status, OrderStatus::Placed);

    let cancelled = orders.cancel(&fx.manager, cart.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn manager_cannot_transition_someone_elses_order() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let cart = orders.add_item(&fx.member, fx.biryani, 1).await.unwrap();

    let err = orders.checkout(&fx.manager, cart.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = orders.cancel(&fx.manager, cart.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn admin_can_transition_any_order() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let cart = orders.add_item(&fx.manager, fx.biryani, 1).await.unwrap();

    let placed = orders.checkout(&fx.admin, cart.id).await.unwrap();
    assert_eq!(placed.status, OrderStatus::Placed);
    let cancelled = orders.cancel(&fx.admin, cart.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn transitions_are_one_directional() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let cart = orders.add_item(&fx.manager, fx.dosa, 1).await.unwrap();

    // Cancel before checkout: PENDING -> CANCELLED is not a step.
    let err = orders.cancel(&fx.manager, cart.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    orders.checkout(&fx.manager, cart.id).await.unwrap();

    // Checkout twice.
    let err = orders.checkout(&fx.manager, cart.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    orders.cancel(&fx.manager, cart.id).await.unwrap();

    // Terminal state.
    let err = orders.cancel(&fx.manager, cart.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn placed_orders_freeze_their_items() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let cart = orders.add_item(&fx.manager, fx.biryani, 2).await.unwrap();
    let line = cart.items[0].id;
    orders.checkout(&fx.manager, cart.id).await.unwrap();

    let err = orders.update_item(&fx.manager, line, 5).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = orders.remove_item(&fx.manager, line).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn history_excludes_pending_and_is_newest_first() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    // First order: placed.
    let first = orders.add_item(&fx.manager, fx.biryani, 1).await.unwrap();
    orders.checkout(&fx.manager, first.id).await.unwrap();

    // Second order: placed then cancelled.
    let second = orders.add_item(&fx.manager, fx.dosa, 1).await.unwrap();
    orders.checkout(&fx.manager, second.id).await.unwrap();
    orders.cancel(&fx.manager, second.id).await.unwrap();

    // Third order: still a cart, must not appear.
    orders.add_item(&fx.manager, fx.biryani, 3).await.unwrap();

    let history = orders.order_history(&fx.manager).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[0].status, OrderStatus::Cancelled);
    assert_eq!(history[1].id, first.id);
    assert_eq!(history[1].status, OrderStatus::Placed);
}

#[tokio::test]
async fn totals_follow_current_menu_prices() {
    let fx = fixture().await;
    let orders = OrderService::new(fx.store.clone());

    let view = orders.add_item(&fx.member, fx.biryani, 2).await.unwrap();
    assert_eq!(view.total_price, dec!(500.0));

    // Add another line; the whole total is re-derived, not patched.
    let view = orders.add_item(&fx.member, fx.dosa, 1).await.unwrap();
    assert_eq!(view.total_price, dec!(620.0));
    assert_total_invariant(&view);
}
