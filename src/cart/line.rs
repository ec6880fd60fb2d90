use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{Product, ProductId, ProductVariant, VariantId};

/// Composite identity of a cart row. Two lines with the same product but
/// different variants (or no variant) are distinct rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl LineKey {
    pub fn product(product_id: ProductId) -> Self {
        Self {
            product_id,
            variant_id: None,
        }
    }

    pub fn with_variant(product_id: ProductId, variant_id: VariantId) -> Self {
        Self {
            product_id,
            variant_id: Some(variant_id),
        }
    }

    pub fn for_selection(product: &Product, variant: Option<&ProductVariant>) -> Self {
        Self {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
        }
    }

    /// Wire form of the key: `"<pid>"` or `"<pid>_<vid>"`, matching carts
    /// stored before this rewrite.
    pub(crate) fn encode(&self) -> String {
        match self.variant_id {
            Some(variant_id) => format!("{}_{}", self.product_id, variant_id),
            None => self.product_id.to_string(),
        }
    }

    pub(crate) fn decode(raw: &str) -> Option<Self> {
        match raw.split_once('_') {
            Some((pid, vid)) => Some(Self::with_variant(pid.parse().ok()?, vid.parse().ok()?)),
            None => Some(Self::product(raw.parse().ok()?)),
        }
    }
}

/// One stored cart row. `unit_price` is the snapshot taken when the row was
/// created; later catalog price changes never reprice a cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id,
            variant_id: self.variant_id,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A stored line joined with the live catalog objects for display and
/// order creation.
#[derive(Clone, Debug)]
pub struct EnrichedLine {
    pub line: CartLine,
    pub product: Product,
    /// `None` when the line has no variant, or the referenced variant no
    /// longer resolves (the snapshot price still applies).
    pub variant: Option<ProductVariant>,
}

impl EnrichedLine {
    pub fn total_price(&self) -> Decimal {
        self.line.line_total()
    }

    /// "Widget" or "Widget (Color: Gold)" for messages and receipts.
    pub fn description(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} ({})", self.product.title, variant.label()),
            None => self.product.title.clone(),
        }
    }
}

/// Outcome of resolving one stored line against the catalog. Distinguishes
/// "product gone" from a resolved row instead of collapsing both into a skip.
#[derive(Clone, Debug)]
pub enum LineResolution {
    Resolved(EnrichedLine),
    MissingProduct { key: LineKey, line: CartLine },
}

impl LineResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, LineResolution::Resolved(_))
    }

    pub fn into_resolved(self) -> Option<EnrichedLine> {
        match self {
            LineResolution::Resolved(enriched) => Some(enriched),
            LineResolution::MissingProduct { .. } => None,
        }
    }
}
