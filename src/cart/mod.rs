//! The session-backed cart aggregate.
//!
//! `CartStore` decodes the session value once when opened, keeps a typed,
//! insertion-ordered line map in memory, and writes the encoded map back
//! through the session (marking it dirty) on every mutation. Prices are
//! snapshotted when a line is first created; the catalog is consulted again
//! only to enrich lines for display and checkout.

mod codec;
mod line;
mod stock;

pub use codec::{DecodeReport, RejectedEntry};
pub use line::{CartLine, EnrichedLine, LineKey, LineResolution};
pub use stock::{QuantityCheck, StockLevel};

use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::CartConfig;
use crate::entities::{Product, ProductId, ProductVariant, VariantId};
use crate::session::SessionStore;

pub struct CartStore<'s, S: SessionStore> {
    session: &'s mut S,
    session_key: String,
    lines: IndexMap<LineKey, CartLine>,
    decode_report: DecodeReport,
}

impl<'s, S: SessionStore> CartStore<'s, S> {
    /// Open the cart for this session, creating an empty structure on first
    /// access. Legacy-format entries are migrated forward (the catalog
    /// backfills prices the oldest shape never stored) and the storage is
    /// rewritten in the current format when anything changed.
    pub fn open<C: Catalog>(session: &'s mut S, catalog: &C, config: &CartConfig) -> Self {
        let stored = session.get(&config.session_key);
        let fresh = stored.is_none();
        let (lines, decode_report) = match &stored {
            Some(value) => codec::decode_lines(value, catalog),
            None => (IndexMap::new(), DecodeReport::default()),
        };

        let mut store = Self {
            session,
            session_key: config.session_key.clone(),
            lines,
            decode_report,
        };
        if fresh {
            store.save();
        } else if !store.decode_report.is_clean() {
            debug!(
                migrated = store.decode_report.migrated,
                rejected = store.decode_report.rejected.len(),
                "rewriting cart storage in current format"
            );
            store.save();
        }
        store
    }

    /// What decoding the stored structure found (migrations, rejects).
    pub fn decode_report(&self) -> &DecodeReport {
        &self.decode_report
    }

    /// Add a product to the cart or update its quantity.
    ///
    /// The unit price is snapshotted when the line is first created — a
    /// variant's final price, or the product's current (sale-aware) price —
    /// and is not touched by later adds. A resulting quantity of zero or
    /// less removes the line; rows with non-positive quantities are never
    /// stored.
    pub fn add(
        &mut self,
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: i32,
        override_quantity: bool,
    ) {
        let key = LineKey::for_selection(product, variant);
        let unit_price = match variant {
            Some(v) => v.final_price(product),
            None => product.current_price(),
        };

        let line = self.lines.entry(key).or_insert_with(|| CartLine {
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            quantity: 0,
            unit_price,
        });
        if override_quantity {
            line.quantity = quantity;
        } else {
            line.quantity = line.quantity.saturating_add(quantity);
        }
        let new_quantity = line.quantity;
        if new_quantity <= 0 {
            self.lines.shift_remove(&key);
        }
        self.save();
        debug!(
            product_id = product.id,
            variant_id = ?key.variant_id,
            quantity = new_quantity,
            "cart line updated"
        );
    }

    /// Remove the line for this selection, if present. Idempotent.
    pub fn remove(&mut self, product: &Product, variant: Option<&ProductVariant>) {
        let key = LineKey::for_selection(product, variant);
        if self.lines.shift_remove(&key).is_some() {
            self.save();
        }
    }

    /// Set the stored quantity directly. Zero or less removes the line.
    /// A selection that is not in the cart is left alone.
    pub fn update_quantity(
        &mut self,
        product: &Product,
        quantity: i32,
        variant: Option<&ProductVariant>,
    ) {
        let key = LineKey::for_selection(product, variant);
        if !self.lines.contains_key(&key) {
            return;
        }
        if quantity <= 0 {
            self.lines.shift_remove(&key);
        } else if let Some(line) = self.lines.get_mut(&key) {
            line.quantity = quantity;
        }
        self.save();
    }

    /// Resolve every stored line against the catalog, in storage order.
    ///
    /// Ids are collected and batch-fetched up front; the yielded sequence is
    /// lazy and restartable — each call re-queries the catalog. A missing
    /// variant on a resolved product yields the line with `variant: None`
    /// (the snapshot price still applies); a missing product yields
    /// [`LineResolution::MissingProduct`] and the row stays in storage (see
    /// [`prune_missing`](Self::prune_missing)).
    pub fn enrich<'a, C: Catalog>(
        &'a self,
        catalog: &C,
    ) -> impl Iterator<Item = LineResolution> + 'a {
        let mut product_ids: Vec<ProductId> = Vec::new();
        let mut variant_ids: Vec<VariantId> = Vec::new();
        for cart_line in self.lines.values() {
            if !product_ids.contains(&cart_line.product_id) {
                product_ids.push(cart_line.product_id);
            }
            if let Some(vid) = cart_line.variant_id {
                if !variant_ids.contains(&vid) {
                    variant_ids.push(vid);
                }
            }
        }
        let products = catalog.products_by_ids(&product_ids);
        let variants = if variant_ids.is_empty() {
            HashMap::new()
        } else {
            catalog.variants_by_ids(&variant_ids)
        };

        self.lines
            .iter()
            .map(move |(key, cart_line)| match products.get(&cart_line.product_id) {
                Some(product) => {
                    let variant = cart_line.variant_id.and_then(|vid| {
                        let found = variants.get(&vid).cloned();
                        if found.is_none() {
                            debug!(
                                product_id = cart_line.product_id,
                                variant_id = vid,
                                "variant no longer resolves; keeping snapshot price"
                            );
                        }
                        found
                    });
                    LineResolution::Resolved(EnrichedLine {
                        line: cart_line.clone(),
                        product: product.clone(),
                        variant,
                    })
                }
                None => LineResolution::MissingProduct {
                    key: *key,
                    line: cart_line.clone(),
                },
            })
    }

    /// The enriched lines that resolved, in storage order.
    pub fn resolved_lines<'a, C: Catalog>(
        &'a self,
        catalog: &C,
    ) -> impl Iterator<Item = EnrichedLine> + 'a {
        self.enrich(catalog).filter_map(LineResolution::into_resolved)
    }

    /// Total item count: the sum of quantities across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.values().map(|l| i64::from(l.quantity)).sum()
    }

    /// Number of distinct line rows, independent of quantity.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Decimal-exact total over the snapshotted prices.
    pub fn total_price(&self) -> Decimal {
        self.lines.values().map(CartLine::line_total).sum()
    }

    /// The stored lines, in storage order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Remove the cart structure from the session entirely.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.session.remove(&self.session_key);
        self.session.mark_modified();
        info!("cart cleared");
    }

    /// Stock ceiling for a selection: the variant's stock when a variant is
    /// given, the product's stock when it manages stock, otherwise no
    /// ceiling.
    pub fn available_stock(
        &self,
        product: &Product,
        variant: Option<&ProductVariant>,
    ) -> StockLevel {
        match variant {
            Some(v) => StockLevel::Limited(v.stock_quantity),
            None if product.manage_stock => StockLevel::Limited(product.stock_quantity),
            None => StockLevel::Unlimited,
        }
    }

    /// Two-tier stock validation.
    ///
    /// Tier one: the requested quantity alone must not exceed availability.
    /// Tier two: the request plus what the cart already holds must fit, and
    /// the failure reports the remaining allowance rather than the raw
    /// availability. The tiers deliberately produce different messages.
    pub fn validate_quantity(
        &self,
        product: &Product,
        quantity: i32,
        variant: Option<&ProductVariant>,
    ) -> QuantityCheck {
        let available = match self.available_stock(product, variant) {
            StockLevel::Unlimited => {
                return QuantityCheck::Valid {
                    available: StockLevel::Unlimited,
                }
            }
            StockLevel::Limited(n) => n,
        };

        if quantity > available {
            return QuantityCheck::ExceedsAvailable { available };
        }

        let in_cart = self.cart_quantity(product, variant);
        if in_cart + quantity > available {
            return QuantityCheck::ExceedsRemaining {
                remaining: available - in_cart,
                in_cart,
            };
        }

        QuantityCheck::Valid {
            available: StockLevel::Limited(available),
        }
    }

    /// Stored quantity for this selection, or 0.
    pub fn cart_quantity(&self, product: &Product, variant: Option<&ProductVariant>) -> i32 {
        self.lines
            .get(&LineKey::for_selection(product, variant))
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Purge lines whose product no longer exists in the catalog. Returns
    /// the removed keys. This is the explicit counterpart to the skip-on-read
    /// behavior of [`enrich`](Self::enrich).
    pub fn prune_missing<C: Catalog>(&mut self, catalog: &C) -> Vec<LineKey> {
        let product_ids: Vec<ProductId> = {
            let mut ids: Vec<ProductId> = Vec::new();
            for cart_line in self.lines.values() {
                if !ids.contains(&cart_line.product_id) {
                    ids.push(cart_line.product_id);
                }
            }
            ids
        };
        let products = catalog.products_by_ids(&product_ids);

        let removed: Vec<LineKey> = self
            .lines
            .keys()
            .filter(|key| !products.contains_key(&key.product_id))
            .copied()
            .collect();
        if !removed.is_empty() {
            self.lines
                .retain(|key, _| products.contains_key(&key.product_id));
            self.save();
            info!(
                count = removed.len(),
                "pruned cart lines referencing deleted products"
            );
        }
        removed
    }

    fn save(&mut self) {
        self.session
            .insert(&self.session_key, codec::encode_lines(&self.lines));
        self.session.mark_modified();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::session::MemorySession;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn product(id: ProductId, price: Decimal) -> Product {
        Product {
            id,
            title: format!("Product {id}"),
            slug: format!("product-{id}"),
            sku: format!("P-{id}"),
            price,
            sale_price: None,
            manage_stock: false,
            stock_quantity: 0,
            is_active: true,
        }
    }

    fn variant(id: VariantId, product_id: ProductId, adjustment: Decimal) -> ProductVariant {
        ProductVariant {
            id,
            product_id,
            name: "Color".to_string(),
            value: "Gold".to_string(),
            sku: format!("P-{product_id}-V{id}"),
            price_adjustment: adjustment,
            stock_quantity: 5,
            is_active: true,
        }
    }

    fn open<'s>(
        session: &'s mut MemorySession,
        catalog: &InMemoryCatalog,
    ) -> CartStore<'s, MemorySession> {
        CartStore::open(session, catalog, &CartConfig::default())
    }

    #[test]
    fn test_first_access_creates_empty_structure() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();

        let cart = open(&mut session, &catalog);
        assert!(cart.is_empty());
        drop(cart);

        assert!(session.is_modified());
        assert_eq!(session.get("cart").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_add_snapshots_price_once() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let mut p = product(1, dec!(80.00));
        p.sale_price = Some(dec!(50.00));
        cart.add(&p, None, 2, false);
        assert_eq!(cart.total_price(), dec!(100.00));

        // Catalog price changes do not reprice the existing line.
        p.sale_price = Some(dec!(60.00));
        cart.add(&p, None, 1, false);
        assert_eq!(cart.cart_quantity(&p, None), 3);
        assert_eq!(cart.total_price(), dec!(150.00));
    }

    #[test]
    fn test_variant_lines_are_distinct_rows() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(100.00));
        let v = variant(3, 1, dec!(25.50));
        cart.add(&p, None, 1, false);
        cart.add(&p, Some(&v), 1, false);

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_price(), dec!(225.50));
    }

    #[test]
    fn test_add_override_replaces_quantity() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        cart.add(&p, None, 4, true);
        cart.add(&p, None, 2, true);
        assert_eq!(cart.cart_quantity(&p, None), 2);
    }

    #[test]
    fn test_nonpositive_result_removes_line() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        cart.add(&p, None, 2, false);
        cart.add(&p, None, -2, false);
        assert_eq!(cart.line_count(), 0);
        assert_eq!(cart.cart_quantity(&p, None), 0);
    }

    #[test]
    fn test_update_quantity_of_absent_selection_is_noop() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        cart.update_quantity(&p, 5, None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_removes_session_entry() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        cart.add(&p, None, 2, false);
        cart.clear();
        assert_eq!(cart.total_quantity(), 0);
        assert_eq!(cart.line_count(), 0);
        drop(cart);

        assert!(session.get("cart").is_none());
    }

    #[test]
    fn test_enrich_reports_missing_product_and_keeps_row() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_product(product(1, dec!(10.00)));
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        let gone = product(2, dec!(5.00));
        cart.add(&p, None, 1, false);
        cart.add(&gone, None, 1, false);

        let resolutions: Vec<_> = cart.enrich(&catalog).collect();
        assert_eq!(resolutions.len(), 2);
        assert_matches!(&resolutions[0], LineResolution::Resolved(e) if e.product.id == 1);
        assert_matches!(
            &resolutions[1],
            LineResolution::MissingProduct { key, .. } if key.product_id == 2
        );

        // Skip-on-read: the unresolvable row is still stored and counted.
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.resolved_lines(&catalog).count(), 1);
    }

    #[test]
    fn test_enrich_missing_variant_yields_line_without_variant() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_product(product(1, dec!(100.00)));
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(100.00));
        let v = variant(3, 1, dec!(10.00));
        cart.add(&p, Some(&v), 2, false);

        let enriched: Vec<_> = cart.resolved_lines(&catalog).collect();
        assert_eq!(enriched.len(), 1);
        assert!(enriched[0].variant.is_none());
        // Snapshot price survives the missing variant.
        assert_eq!(enriched[0].total_price(), dec!(220.00));
    }

    #[test]
    fn test_prune_missing_purges_only_dead_rows() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_product(product(1, dec!(10.00)));
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        let gone = product(2, dec!(5.00));
        cart.add(&p, None, 1, false);
        cart.add(&gone, None, 3, false);

        let removed = cart.prune_missing(&catalog);
        assert_eq!(removed, vec![LineKey::product(2)]);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_validate_quantity_two_tiers() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let mut cart = open(&mut session, &catalog);

        let mut p = product(1, dec!(10.00));
        p.manage_stock = true;
        p.stock_quantity = 5;

        assert_matches!(
            cart.validate_quantity(&p, 6, None),
            QuantityCheck::ExceedsAvailable { available: 5 }
        );

        assert!(cart.validate_quantity(&p, 3, None).is_valid());
        cart.add(&p, None, 3, false);

        assert_matches!(
            cart.validate_quantity(&p, 3, None),
            QuantityCheck::ExceedsRemaining {
                remaining: 2,
                in_cart: 3
            }
        );
    }

    #[test]
    fn test_validate_quantity_unmanaged_stock_is_unlimited() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();
        let cart = open(&mut session, &catalog);

        let p = product(1, dec!(10.00));
        let check = cart.validate_quantity(&p, 1_000_000, None);
        assert!(check.is_valid());
        assert!(check.allowance().is_unlimited());
    }

    #[test]
    fn test_reopen_restores_lines_from_session() {
        let catalog = InMemoryCatalog::new();
        let mut session = MemorySession::new();

        let p = product(1, dec!(19.99));
        {
            let mut cart = open(&mut session, &catalog);
            cart.add(&p, None, 3, false);
        }

        let cart = open(&mut session, &catalog);
        assert_eq!(cart.cart_quantity(&p, None), 3);
        assert_eq!(cart.total_price(), dec!(59.97));
    }
}
