//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::tier::{PriceTier, TierError, resolve_unit_price};

/// Identity of a line item within the cart.
///
/// A cart holds at most one entry per (product, size, color) triple; adding
/// the same triple again merges quantities instead of duplicating the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// Catalog product id.
    pub product_id: String,
    /// Selected size.
    pub size: String,
    /// Selected color.
    pub color: String,
}

impl ItemKey {
    /// Create a key from its parts.
    pub fn new(
        product_id: impl Into<String>,
        size: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.into(),
            color: color.into(),
        }
    }
}

/// One (product, size, color, quantity) entry in the cart.
///
/// Wire/persisted format matches the catalog API:
///
/// ```json
/// {
///   "id": "prod-1",
///   "name": "Playera Basica",
///   "image": "https://cdn.example.com/prod-1.jpg",
///   "quantity": 3,
///   "size": "M",
///   "color": "Rojo",
///   "prices": [{ "quantity": "1-9", "price": "$150.00" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product id.
    #[serde(rename = "id")]
    pub product_id: String,
    /// Display name.
    pub name: String,
    /// Main product image URL.
    #[serde(rename = "image")]
    pub image_url: String,
    /// Number of units. Must be at least 1 inside the cart.
    pub quantity: u32,
    /// Selected size.
    pub size: String,
    /// Selected color.
    pub color: String,
    /// Ordered volume-pricing tiers for this product.
    #[serde(rename = "prices")]
    pub price_tiers: Vec<PriceTier>,
}

impl LineItem {
    /// Identity key of this entry.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(
            self.product_id.clone(),
            self.size.clone(),
            self.color.clone(),
        )
    }

    /// Unit price for the current quantity.
    ///
    /// # Errors
    ///
    /// Returns `TierError::Empty` if the item carries no price tiers.
    pub fn unit_price(&self) -> Result<Decimal, TierError> {
        resolve_unit_price(&self.price_tiers, self.quantity)
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `TierError::Empty` if the item carries no price tiers.
    pub fn subtotal(&self) -> Result<Decimal, TierError> {
        Ok(self.unit_price()? * Decimal::from(self.quantity))
    }
}
