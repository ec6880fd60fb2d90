use serde::{Deserialize, Serialize};

/// Stock ceiling for a product/variant selection. `Unlimited` means no
/// ceiling applies (stock management disabled), replacing the float-infinity
/// sentinel the component historically used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    Unlimited,
    Limited(i32),
}

impl StockLevel {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, StockLevel::Unlimited)
    }

    pub fn allows(&self, quantity: i32) -> bool {
        match self {
            StockLevel::Unlimited => true,
            StockLevel::Limited(available) => quantity <= *available,
        }
    }
}

/// Tri-state result of the two-tier quantity validation.
///
/// The two failure tiers are deliberately distinct: the absolute ceiling and
/// the incremental ceiling against what the cart already holds carry
/// different allowances and different messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityCheck {
    Valid {
        available: StockLevel,
    },
    /// The requested quantity alone exceeds the stock on hand.
    ExceedsAvailable {
        available: i32,
    },
    /// The request would be fine on its own, but the cart already holds part
    /// of the allowance.
    ExceedsRemaining {
        remaining: i32,
        in_cart: i32,
    },
}

impl QuantityCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, QuantityCheck::Valid { .. })
    }

    /// How much could still be requested: the full availability when valid,
    /// otherwise the tier-specific allowance.
    pub fn allowance(&self) -> StockLevel {
        match self {
            QuantityCheck::Valid { available } => *available,
            QuantityCheck::ExceedsAvailable { available } => StockLevel::Limited(*available),
            QuantityCheck::ExceedsRemaining { remaining, .. } => StockLevel::Limited(*remaining),
        }
    }

    /// User-facing message; `None` when valid.
    pub fn message(&self) -> Option<String> {
        match self {
            QuantityCheck::Valid { .. } => None,
            QuantityCheck::ExceedsAvailable { available } => {
                Some(format!("Only {} items available", available))
            }
            QuantityCheck::ExceedsRemaining { remaining, in_cart } => Some(format!(
                "Only {} more items can be added (already have {} in cart)",
                remaining, in_cart
            )),
        }
    }
}
