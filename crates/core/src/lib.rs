//! Monarca Core - Shared types library.
//!
//! This crate provides common types used across the Monarca storefront
//! components:
//! - `storefront` - Client-side stores and API glue for the public site
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Line items, volume price tiers, and user identity types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
