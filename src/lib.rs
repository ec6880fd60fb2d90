//! storefront-cart
//!
//! Session-backed shopping cart aggregation: variant-aware line items keyed
//! by `(product, optional variant)`, price snapshots taken at add time,
//! decimal-exact totals, two-tier stock validation, and the checkout hand-off
//! that turns a cart into an order.
//!
//! The cart is a leaf component. It consumes a [`catalog::Catalog`] for
//! batch product/variant lookup and a [`session::SessionStore`] for
//! per-visitor persistence; everything else (HTTP, templates, payment,
//! admin) lives in the host.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod services;
pub mod session;

pub use cart::{
    CartLine, CartStore, DecodeReport, EnrichedLine, LineKey, LineResolution, QuantityCheck,
    StockLevel,
};
pub use catalog::{Catalog, InMemoryCatalog};
pub use config::{load_config, CartConfig};
pub use entities::{Order, OrderLine, Product, ProductId, ProductVariant, VariantId};
pub use errors::CartError;
pub use events::{Event, EventSender};
pub use services::{CartService, CartUpdateOutcome, CheckoutService, PlaceOrderInput, PlacedOrder};
pub use session::{MemorySession, SessionStore};
