#![allow(dead_code)]

use rust_decimal::Decimal;
use storefront_cart::{InMemoryCatalog, Product, ProductId, ProductVariant, VariantId};

/// Product without stock management (no quantity ceiling).
pub fn product(id: ProductId, price: Decimal) -> Product {
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

pub fn managed_product(id: ProductId, price: Decimal, stock: i32) -> Product {
    Product {
        manage_stock: true,
        stock_quantity: stock,
        ..product(id, price)
    }
}

pub fn variant(
    id: VariantId,
    product_id: ProductId,
    adjustment: Decimal,
    stock: i32,
) -> ProductVariant {
    ProductVariant {
        id,
        product_id,
        name: "Color".to_string(),
        value: "Gold".to_string(),
        sku: format!("P-{product_id}-V{id}"),
        price_adjustment: adjustment,
        stock_quantity: stock,
        is_active: true,
    }
}

pub fn catalog_with(products: Vec<Product>, variants: Vec<ProductVariant>) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    for p in products {
        catalog.insert_product(p);
    }
    for v in variants {
        catalog.insert_variant(v);
    }
    catalog
}
