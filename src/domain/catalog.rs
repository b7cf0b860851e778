use rust_decimal::Decimal;
use uuid::Uuid;

use super::Country;

/// A restaurant. Its country fixes the display currency and who may
/// see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub country: Country,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, country: Country) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            country,
        }
    }
}

/// A dish on exactly one restaurant's menu. Prices are `NUMERIC`
/// decimals; order totals always re-read the current price.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub restaurant_id: Uuid,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price: Decimal, restaurant_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            restaurant_id,
        }
    }
}
