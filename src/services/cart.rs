use tracing::{info, instrument};

use crate::cart::{CartStore, QuantityCheck, StockLevel};
use crate::config::CartConfig;
use crate::entities::{Product, ProductVariant};
use crate::errors::CartError;
use crate::events::{Event, EventSender};
use crate::session::SessionStore;

/// Outcome of a validated cart mutation. Stock insufficiency is an outcome,
/// not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum CartUpdateOutcome {
    Applied { new_quantity: i32 },
    Rejected(QuantityCheck),
}

impl CartUpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CartUpdateOutcome::Applied { .. })
    }
}

/// Cart mutation workflows: input checks, stock validation, the mutation
/// itself, and the event, in that order.
#[derive(Clone, Debug)]
pub struct CartService {
    events: EventSender,
    max_line_quantity: i32,
}

impl CartService {
    pub fn new(events: EventSender, config: &CartConfig) -> Self {
        Self {
            events,
            max_line_quantity: config.max_line_quantity,
        }
    }

    /// Validate then add. With `override_quantity` only the absolute stock
    /// ceiling applies (the stored quantity is being replaced); otherwise the
    /// full two-tier check runs against what the cart already holds.
    #[instrument(skip(self, cart, product, variant), fields(product_id = product.id))]
    pub fn add_item<S: SessionStore>(
        &self,
        cart: &mut CartStore<'_, S>,
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: i32,
        override_quantity: bool,
    ) -> Result<CartUpdateOutcome, CartError> {
        self.check_input(product, variant, quantity)?;

        let check = if override_quantity {
            absolute_check(cart.available_stock(product, variant), quantity)
        } else {
            cart.validate_quantity(product, quantity, variant)
        };
        if !check.is_valid() {
            info!(
                product_id = product.id,
                requested = quantity,
                "add to cart rejected by stock validation"
            );
            return Ok(CartUpdateOutcome::Rejected(check));
        }

        cart.add(product, variant, quantity, override_quantity);
        let new_quantity = cart.cart_quantity(product, variant);
        self.events.send_or_log(Event::CartLineAdded {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            quantity,
        });
        info!(
            product_id = product.id,
            new_quantity, "added item to cart"
        );
        Ok(CartUpdateOutcome::Applied { new_quantity })
    }

    /// Validated direct quantity update. Zero or less removes the line.
    #[instrument(skip(self, cart, product, variant), fields(product_id = product.id))]
    pub fn set_quantity<S: SessionStore>(
        &self,
        cart: &mut CartStore<'_, S>,
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: i32,
    ) -> Result<CartUpdateOutcome, CartError> {
        if quantity <= 0 {
            self.remove_line(cart, product, variant);
            return Ok(CartUpdateOutcome::Applied { new_quantity: 0 });
        }
        self.check_input(product, variant, quantity)?;

        let check = absolute_check(cart.available_stock(product, variant), quantity);
        if !check.is_valid() {
            return Ok(CartUpdateOutcome::Rejected(check));
        }

        cart.update_quantity(product, quantity, variant);
        self.events.send_or_log(Event::CartQuantityUpdated {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            quantity,
        });
        Ok(CartUpdateOutcome::Applied {
            new_quantity: cart.cart_quantity(product, variant),
        })
    }

    pub fn remove_line<S: SessionStore>(
        &self,
        cart: &mut CartStore<'_, S>,
        product: &Product,
        variant: Option<&ProductVariant>,
    ) {
        cart.remove(product, variant);
        self.events.send_or_log(Event::CartLineRemoved {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
        });
    }

    pub fn clear<S: SessionStore>(&self, cart: &mut CartStore<'_, S>) {
        cart.clear();
        self.events.send_or_log(Event::CartCleared);
    }

    fn check_input(
        &self,
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidInput(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        if quantity > self.max_line_quantity {
            return Err(CartError::InvalidInput(format!(
                "quantity {quantity} exceeds the per-line ceiling of {}",
                self.max_line_quantity
            )));
        }
        if let Some(v) = variant {
            if v.product_id != product.id {
                return Err(CartError::InvalidInput(format!(
                    "variant {} does not belong to product {}",
                    v.id, product.id
                )));
            }
        }
        Ok(())
    }
}

/// Tier-one check only: the requested quantity against raw availability,
/// ignoring what the cart already holds.
fn absolute_check(available: StockLevel, quantity: i32) -> QuantityCheck {
    match available {
        StockLevel::Limited(available) if quantity > available => {
            QuantityCheck::ExceedsAvailable { available }
        }
        available => QuantityCheck::Valid { available },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::StockLevel;
    use crate::catalog::InMemoryCatalog;
    use crate::session::MemorySession;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn managed_product(stock: i32) -> Product {
        Product {
            id: 1,
            title: "Widget".to_string(),
            slug: "widget".to_string(),
            sku: "W-1".to_string(),
            price: dec!(10.00),
            sale_price: None,
            manage_stock: true,
            stock_quantity: stock,
            is_active: true,
        }
    }

    fn service() -> CartService {
        CartService::new(EventSender::disabled(), &CartConfig::default())
    }

    #[test]
    fn test_add_item_validates_then_adds() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let product = managed_product(5);

        let outcome = service()
            .add_item(&mut cart, &product, None, 3, false)
            .unwrap();
        assert_eq!(outcome, CartUpdateOutcome::Applied { new_quantity: 3 });

        let outcome = service()
            .add_item(&mut cart, &product, None, 3, false)
            .unwrap();
        assert_matches!(
            outcome,
            CartUpdateOutcome::Rejected(QuantityCheck::ExceedsRemaining {
                remaining: 2,
                in_cart: 3
            })
        );
        assert_eq!(cart.cart_quantity(&product, None), 3);
    }

    #[test]
    fn test_add_item_override_checks_absolute_ceiling_only() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let product = managed_product(5);

        service()
            .add_item(&mut cart, &product, None, 4, false)
            .unwrap();
        // Replacing 4 with 5 is fine even though 4 + 5 > stock.
        let outcome = service()
            .add_item(&mut cart, &product, None, 5, true)
            .unwrap();
        assert_eq!(outcome, CartUpdateOutcome::Applied { new_quantity: 5 });

        let outcome = service()
            .add_item(&mut cart, &product, None, 6, true)
            .unwrap();
        assert_matches!(
            outcome,
            CartUpdateOutcome::Rejected(QuantityCheck::ExceedsAvailable { available: 5 })
        );
    }

    #[test]
    fn test_add_item_rejects_bad_input() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let product = managed_product(5);

        assert!(service().add_item(&mut cart, &product, None, 0, false).is_err());
        assert!(service()
            .add_item(&mut cart, &product, None, 10_001, false)
            .is_err());
    }

    #[test]
    fn test_add_item_rejects_foreign_variant() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let product = managed_product(5);
        let foreign = ProductVariant {
            id: 9,
            product_id: 77,
            name: "Size".to_string(),
            value: "L".to_string(),
            sku: "X".to_string(),
            price_adjustment: dec!(0),
            stock_quantity: 1,
            is_active: true,
        };

        let err = service()
            .add_item(&mut cart, &product, Some(&foreign), 1, false)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn test_set_quantity_zero_removes_and_emits() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let product = managed_product(5);
        let (events, receiver) = EventSender::channel();
        let service = CartService::new(events, &CartConfig::default());

        service.add_item(&mut cart, &product, None, 2, false).unwrap();
        service.set_quantity(&mut cart, &product, None, 0).unwrap();

        assert_eq!(cart.cart_quantity(&product, None), 0);
        let events: Vec<_> = receiver.try_iter().collect();
        assert_matches!(events[0], Event::CartLineAdded { quantity: 2, .. });
        assert_matches!(events[1], Event::CartLineRemoved { product_id: 1, .. });
    }

    #[test]
    fn test_set_quantity_respects_stock() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let product = managed_product(5);
        let svc = service();

        svc.add_item(&mut cart, &product, None, 2, false).unwrap();
        let outcome = svc.set_quantity(&mut cart, &product, None, 6).unwrap();
        assert_matches!(outcome, CartUpdateOutcome::Rejected(_));
        assert_eq!(cart.cart_quantity(&product, None), 2);

        let outcome = svc.set_quantity(&mut cart, &product, None, 5).unwrap();
        assert_eq!(outcome, CartUpdateOutcome::Applied { new_quantity: 5 });
    }

    #[test]
    fn test_unmanaged_product_is_never_stock_rejected() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = CartStore::open(&mut session, &catalog, &CartConfig::default());
        let mut product = managed_product(0);
        product.manage_stock = false;

        let outcome = service()
            .add_item(&mut cart, &product, None, 500, false)
            .unwrap();
        assert!(outcome.is_applied());
        assert_eq!(
            cart.available_stock(&product, None),
            StockLevel::Unlimited
        );
    }
}
