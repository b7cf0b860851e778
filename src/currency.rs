//! Country to display-currency mapping.
//!
//! Pure and infallible: unknown values fall back to the rupee symbol
//! rather than erroring, matching what the storefront renders.

use crate::domain::Country;

impl Country {
    /// Display symbol for prices in this country.
    pub fn symbol(self) -> &'static str {
        match self {
            Country::India => "₹",
            Country::America => "$",
        }
    }
}

/// Symbol lookup for a raw country string, case-insensitive.
/// Anything unrecognized falls back to "₹".
pub fn symbol_for(country: &str) -> &'static str {
    match country.to_ascii_uppercase().parse::<Country>() {
        Ok(c) => c.symbol(),
        Err(()) => "₹",
    }
}
