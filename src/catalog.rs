use std::collections::HashMap;

use crate::entities::{Product, ProductId, ProductVariant, VariantId};

/// Read-only batch lookup plus stock write-down over the product catalog.
///
/// The cart treats the catalog as an external collaborator: lookups are
/// batched by id the way a storefront view would query them, and stock
/// reduction happens only at checkout.
pub trait Catalog {
    /// Batch-fetch products. Unknown ids are simply absent from the result.
    fn products_by_ids(&self, ids: &[ProductId]) -> HashMap<ProductId, Product>;

    /// Batch-fetch variants. Unknown ids are simply absent from the result.
    fn variants_by_ids(&self, ids: &[VariantId]) -> HashMap<VariantId, ProductVariant>;

    /// Decrement product stock for a fulfilled quantity. Returns `false` when
    /// the product is unknown or stock is insufficient.
    fn reduce_product_stock(&mut self, id: ProductId, quantity: i32) -> bool;

    /// Decrement variant stock. Returns `false` when the variant is unknown
    /// or stock is insufficient.
    fn reduce_variant_stock(&mut self, id: VariantId, quantity: i32) -> bool;

    fn product(&self, id: ProductId) -> Option<Product> {
        self.products_by_ids(&[id]).remove(&id)
    }

    fn variant(&self, id: VariantId) -> Option<ProductVariant> {
        self.variants_by_ids(&[id]).remove(&id)
    }
}

/// Map-backed catalog used by tests and embedding hosts.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, ProductVariant>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn insert_variant(&mut self, variant: ProductVariant) {
        self.variants.insert(variant.id, variant);
    }

    pub fn remove_product(&mut self, id: ProductId) -> Option<Product> {
        self.products.remove(&id)
    }

    pub fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.get_mut(&id)
    }

    pub fn variant_mut(&mut self, id: VariantId) -> Option<&mut ProductVariant> {
        self.variants.get_mut(&id)
    }
}

impl Catalog for InMemoryCatalog {
    fn products_by_ids(&self, ids: &[ProductId]) -> HashMap<ProductId, Product> {
        ids.iter()
            .filter_map(|id| self.products.get(id).map(|p| (*id, p.clone())))
            .collect()
    }

    fn variants_by_ids(&self, ids: &[VariantId]) -> HashMap<VariantId, ProductVariant> {
        ids.iter()
            .filter_map(|id| self.variants.get(id).map(|v| (*id, v.clone())))
            .collect()
    }

    fn reduce_product_stock(&mut self, id: ProductId, quantity: i32) -> bool {
        match self.products.get_mut(&id) {
            Some(product) => product.reduce_stock(quantity),
            None => false,
        }
    }

    fn reduce_variant_stock(&mut self, id: VariantId, quantity: i32) -> bool {
        match self.variants.get_mut(&id) {
            Some(variant) => variant.reduce_stock(quantity),
            None => false,
        }
    }
}
