use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId, VariantId};

/// A priced, separately stocked option of a product (e.g. size or color),
/// adjusting the base product price by a fixed delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    /// Option dimension, e.g. "Color"
    pub name: String,
    /// Option value, e.g. "Gold"
    pub value: String,
    pub sku: String,
    pub price_adjustment: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
}

impl ProductVariant {
    /// Selling price of this variant: base product price plus the adjustment.
    /// Sale prices do not apply to variant lines.
    pub fn final_price(&self, product: &Product) -> Decimal {
        product.price + self.price_adjustment
    }

    /// "Color: Gold" label used on order lines and shortfall messages.
    pub fn label(&self) -> String {
        format!("{}: {}", self.name, self.value)
    }

    /// Decrement variant stock. Returns `false` on shortfall, leaving the
    /// quantity untouched.
    pub fn reduce_stock(&mut self, quantity: i32) -> bool {
        if quantity > self.stock_quantity {
            return false;
        }
        self.stock_quantity -= quantity;
        true
    }
}
