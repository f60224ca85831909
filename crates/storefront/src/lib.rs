//! Monarca Storefront - client-side state stores and API glue.
//!
//! This crate implements the stateful core of the Monarca wholesale
//! storefront as explicit, context-owned stores:
//!
//! - [`cart::CartLedger`] - ordered line items with merge-by-variant and
//!   volume-tier totals, persisted across sessions
//! - [`session::SessionManager`] - login/logout/password-reset lifecycle with
//!   durable token storage and a session-expiry event stream
//! - [`register::RegisterStore`] - account registration with client-side
//!   validation
//! - [`catalog::CatalogClient`] - cached read-only catalog endpoints
//!
//! All stores are constructed by the application and injected into consumers;
//! nothing in this crate is a global singleton. The presentation layer
//! (pages, styling, navigation) lives elsewhere and subscribes to
//! [`session::SessionEvent`] for redirects instead of this crate performing
//! them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod register;
pub mod session;
pub mod storage;
