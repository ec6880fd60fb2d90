//! Session wire format.
//!
//! The stored shape is the one carts have always used: a JSON object keyed by
//! `"<pid>"` / `"<pid>_<vid>"` with `price` as a string. Two older shapes are
//! still decoded: the pre-variant dict (no `product_id` field, id taken from
//! the key) and the bare entry (quantity 1, price backfilled from the
//! catalog). Whatever cannot be decoded is rejected with a logged diagnostic
//! and reported, never dropped silently.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

use super::line::{CartLine, LineKey};
use crate::catalog::Catalog;
use crate::entities::{ProductId, VariantId};

/// Current wire shape of one stored row.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLine {
    product_id: ProductId,
    #[serde(default)]
    variant_id: Option<VariantId>,
    quantity: i32,
    price: String,
}

/// What decoding found besides the lines themselves.
#[derive(Clone, Debug, Default)]
pub struct DecodeReport {
    /// Entries migrated forward from a legacy shape.
    pub migrated: usize,
    /// Entries that could not be decoded. They are dropped from storage on
    /// the next write-through, but surfaced here and in the logs first.
    pub rejected: Vec<RejectedEntry>,
}

#[derive(Clone, Debug)]
pub struct RejectedEntry {
    pub key: String,
    pub reason: String,
}

impl DecodeReport {
    /// True when storage was already in the current format with no damage.
    pub fn is_clean(&self) -> bool {
        self.migrated == 0 && self.rejected.is_empty()
    }

    fn reject(&mut self, key: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(entry = %key, %reason, "rejecting undecodable cart entry");
        self.rejected.push(RejectedEntry {
            key: key.to_string(),
            reason,
        });
    }
}

/// Decode the session value into typed lines. The catalog is consulted only
/// to backfill prices for legacy entries that never stored one.
pub(crate) fn decode_lines<C: Catalog>(
    value: &Value,
    catalog: &C,
) -> (IndexMap<LineKey, CartLine>, DecodeReport) {
    let mut lines = IndexMap::new();
    let mut report = DecodeReport::default();

    let Some(entries) = value.as_object() else {
        report.reject("<root>", "cart structure is not an object");
        return (lines, report);
    };

    for (raw_key, entry) in entries {
        let is_current_shape = entry
            .as_object()
            .is_some_and(|obj| obj.contains_key("product_id"));

        if is_current_shape {
            match decode_current(entry) {
                Ok(line) => {
                    lines.insert(line.key(), line);
                }
                Err(reason) => report.reject(raw_key, reason),
            }
        } else {
            match decode_legacy(raw_key, entry, catalog) {
                Ok(line) => {
                    lines.insert(line.key(), line);
                    report.migrated += 1;
                }
                Err(reason) => report.reject(raw_key, reason),
            }
        }
    }

    (lines, report)
}

fn decode_current(entry: &Value) -> Result<CartLine, String> {
    let stored: StoredLine =
        serde_json::from_value(entry.clone()).map_err(|e| format!("malformed entry: {e}"))?;
    let unit_price = Decimal::from_str(&stored.price)
        .map_err(|e| format!("unparseable price {:?}: {e}", stored.price))?;
    if stored.quantity < 1 {
        return Err(format!("non-positive quantity {}", stored.quantity));
    }
    Ok(CartLine {
        product_id: stored.product_id,
        variant_id: stored.variant_id,
        quantity: stored.quantity,
        unit_price,
    })
}

/// Pre-variant shapes: the key is a plain product id; the value is either a
/// dict carrying quantity/price or some bare value (quantity defaults to 1).
fn decode_legacy<C: Catalog>(raw_key: &str, entry: &Value, catalog: &C) -> Result<CartLine, String> {
    if raw_key.contains('_') {
        return Err("variant-shaped key without a product_id field".to_string());
    }
    let product_id: ProductId = raw_key
        .parse()
        .map_err(|_| format!("key {raw_key:?} is not a product id"))?;

    let (quantity, stored_price) = match entry.as_object() {
        Some(obj) => {
            let quantity = obj.get("quantity").and_then(Value::as_i64).unwrap_or(1);
            (quantity, obj.get("price"))
        }
        None => (1, None),
    };
    let quantity =
        i32::try_from(quantity).map_err(|_| format!("quantity {quantity} out of range"))?;
    if quantity < 1 {
        return Err(format!("non-positive quantity {quantity}"));
    }

    let unit_price = match stored_price {
        Some(price) => parse_price(price).ok_or_else(|| format!("unparseable price {price}"))?,
        None => catalog
            .product(product_id)
            .map(|p| p.current_price())
            .ok_or("product no longer exists; cannot backfill legacy price")?,
    };

    Ok(CartLine {
        product_id,
        variant_id: None,
        quantity,
        unit_price,
    })
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        // Numbers are parsed from their literal text, not via f64.
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Encode the typed lines back into the wire shape.
pub(crate) fn encode_lines(lines: &IndexMap<LineKey, CartLine>) -> Value {
    let mut map = serde_json::Map::with_capacity(lines.len());
    for (key, line) in lines {
        map.insert(
            key.encode(),
            serde_json::json!({
                "product_id": line.product_id,
                "variant_id": line.variant_id,
                "quantity": line.quantity,
                "price": line.unit_price.to_string(),
            }),
        );
    }
    Value::Object(map)
}
