//! Plain data records the cart consumes and produces.
//!
//! The catalog owns products and variants; the cart only stores their ids and
//! a price snapshot. Orders are what checkout hands back to the host.

pub mod order;
pub mod product;
pub mod variant;

pub use order::{Order, OrderLine, OrderStatus, PaymentMethod};
pub use product::Product;
pub use variant::ProductVariant;

/// Catalog identifier for a product.
pub type ProductId = i64;

/// Catalog identifier for a product variant.
pub type VariantId = i64;
