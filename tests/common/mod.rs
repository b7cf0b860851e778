//! Shared fixture: an in-memory store seeded with the demo users and
//! two restaurants, one per country.

use std::sync::Arc;

use rust_decimal_macros::dec;
use uuid::Uuid;

use tiffin::domain::{Country, MenuItem, Restaurant, Role, User};
use tiffin::store::{MemStore, Session, Store};
use tiffin::Claims;

pub const PASSWORD: &str = "password123";

pub struct Fixture {
    pub store: Arc<MemStore>,
    /// MEMBER, India.
    pub member: Claims,
    /// MANAGER, India.
    pub manager: Claims,
    /// MANAGER, America.
    pub us_manager: Claims,
    /// ADMIN, America.
    pub admin: Claims,
    pub spice_route: Uuid,
    pub biryani: Uuid,
    pub dosa: Uuid,
    pub liberty_diner: Uuid,
    pub burger: Uuid,
}

fn claims_for(user: &User) -> Claims {
    Claims {
        user_id: user.id,
        name: user.name.clone(),
        role: user.role,
        country: Some(user.country),
    }
}

/// Claims whose country failed validation against the known set.
pub fn invalid_country_claims(base: &Claims) -> Claims {
    Claims {
        country: None,
        ..base.clone()
    }
}

pub async fn fixture() -> Fixture {
    let store = Arc::new(MemStore::new());
    // Low cost: these hashes only need to be structurally valid.
    let hash = bcrypt::hash(PASSWORD, 4).expect("hash password");

    let member = User::new(
        "thanos@slooze.xyz",
        "Thanos",
        &hash,
        Role::Member,
        Country::India,
    );
    let manager = User::new(
        "marvel@slooze.xyz",
        "Captain Marvel",
        &hash,
        Role::Manager,
        Country::India,
    );
    let us_manager = User::new(
        "america@slooze.xyz",
        "Captain America",
        &hash,
        Role::Manager,
        Country::America,
    );
    let admin = User::new(
        "nickfury@slooze.xyz",
        "Nick Fury",
        &hash,
        Role::Admin,
        Country::America,
    );

    let spice_route = Restaurant::new("Spice Route", Country::India);
    let biryani = MenuItem::new("Chicken Biryani", dec!(250.0), spice_route.id);
    let dosa = MenuItem::new("Masala Dosa", dec!(120.0), spice_route.id);

    let liberty_diner = Restaurant::new("Liberty Diner", Country::America);
    let burger = MenuItem::new("Cheeseburger", dec!(8.5), liberty_diner.id);

    let mut session = store.begin().await.expect("begin seed session");
    for user in [&member, &manager, &us_manager, &admin] {
        session.insert_user(user).await.expect("insert user");
    }
    for restaurant in [&spice_route, &liberty_diner] {
        session
            .insert_restaurant(restaurant)
            .await
            .expect("insert restaurant");
    }
    for item in [&biryani, &dosa, &burger] {
        session.insert_menu_item(item).await.expect("insert menu item");
    }
    session.commit().await.expect("commit seed session");

    Fixture {
        member: claims_for(&member),
        manager: claims_for(&manager),
        us_manager: claims_for(&us_manager),
        admin: claims_for(&admin),
        spice_route: spice_route.id,
        biryani: biryani.id,
        dosa: dosa.id,
        liberty_diner: liberty_diner.id,
        burger: burger.id,
        store,
    }
}
