use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Product record as supplied by the catalog.
///
/// `stock_quantity` is only meaningful when `manage_stock` is set; products
/// without stock management have no quantity ceiling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub sku: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub manage_stock: bool,
    pub stock_quantity: i32,
    pub is_active: bool,
}

impl Product {
    /// Price a variant-less line is sold at: the sale price when one is set.
    pub fn current_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some()
    }

    /// Decrement stock for a fulfilled quantity. Returns `false` when stock
    /// is insufficient, leaving the quantity untouched. Callers gate this on
    /// `manage_stock`.
    pub fn reduce_stock(&mut self, quantity: i32) -> bool {
        if quantity > self.stock_quantity {
            return false;
        }
        self.stock_quantity -= quantity;
        true
    }
}
