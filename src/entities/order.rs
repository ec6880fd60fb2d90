use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::{ProductId, VariantId};

/// Order lifecycle states.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(rename = "cod")]
    #[strum(serialize = "cod")]
    CashOnDelivery,
    Online,
}

/// Order header produced by checkout. Persistence is the host's concern; the
/// cart component only constructs the value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One order row. Product title, SKU and variant labels are denormalized so
/// order history survives catalog deletions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: Uuid,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub product_title: String,
    pub product_sku: String,
    pub variant_name: Option<String>,
    pub variant_value: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
