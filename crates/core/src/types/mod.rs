//! Core types for the Monarca storefront.
//!
//! This module provides the domain types shared by the cart ledger, the
//! session manager, and the catalog client.

pub mod item;
pub mod tier;
pub mod user;

pub use item::{ItemKey, LineItem};
pub use tier::{PriceTier, TierError, TierRange, resolve_unit_price};
pub use user::{User, UserDetails};
