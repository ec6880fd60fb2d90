use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::cart::{CartStore, LineKey, LineResolution};
use crate::catalog::Catalog;
use crate::entities::{Order, OrderLine, OrderStatus, PaymentMethod, ProductId, VariantId};
use crate::errors::CartError;
use crate::events::{Event, EventSender};
use crate::session::SessionStore;

/// Customer-facing checkout form data.
#[derive(Clone, Debug, Validate)]
pub struct PlaceOrderInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 15))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub postal_code: String,
    pub payment_method: PaymentMethod,
}

/// A stock write-down that could not be fulfilled. The order still goes
/// through; the shortfall is for the host to follow up on.
#[derive(Clone, Debug, PartialEq)]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub description: String,
}

/// The result of checkout: the order value (persistence is the host's job),
/// its lines, and everything that did not go perfectly.
#[derive(Clone, Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub shortfalls: Vec<StockShortfall>,
    /// Cart rows whose product no longer resolved; excluded from the order.
    pub skipped: Vec<LineKey>,
}

/// Turns a cart into an order: resolves lines, writes down stock, clears the
/// cart.
#[derive(Clone, Debug)]
pub struct CheckoutService {
    events: EventSender,
}

impl CheckoutService {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    /// Create an order from the cart's resolved lines.
    ///
    /// Order lines carry the snapshotted unit price and denormalized product
    /// title/SKU and variant labels. Stock is reduced per line — the variant's
    /// stock when the line has one, else the product's when it manages stock.
    /// Shortfalls do not fail the order (validation happened when the lines
    /// were added; a race against other buyers is possible) but are reported.
    /// On success the cart is cleared.
    #[instrument(skip(self, cart, catalog, input), fields(email = %input.email))]
    pub fn place_order<S: SessionStore, C: Catalog>(
        &self,
        cart: &mut CartStore<'_, S>,
        catalog: &mut C,
        input: PlaceOrderInput,
    ) -> Result<PlacedOrder, CartError> {
        input
            .validate()
            .map_err(|e| CartError::ValidationError(e.to_string()))?;
        if cart.is_empty() {
            return Err(CartError::InvalidOperation("cart is empty".to_string()));
        }

        let resolutions: Vec<LineResolution> = cart.enrich(&*catalog).collect();

        let order_id = Uuid::new_v4();
        let mut lines = Vec::new();
        let mut shortfalls = Vec::new();
        let mut skipped = Vec::new();

        for resolution in resolutions {
            match resolution {
                LineResolution::Resolved(enriched) => {
                    let quantity = enriched.line.quantity;
                    lines.push(OrderLine {
                        order_id,
                        product_id: Some(enriched.product.id),
                        variant_id: enriched.variant.as_ref().map(|v| v.id),
                        product_title: enriched.product.title.clone(),
                        product_sku: enriched.product.sku.clone(),
                        variant_name: enriched.variant.as_ref().map(|v| v.name.clone()),
                        variant_value: enriched.variant.as_ref().map(|v| v.value.clone()),
                        quantity,
                        unit_price: enriched.line.unit_price,
                    });

                    let reduced = match &enriched.variant {
                        Some(variant) => catalog.reduce_variant_stock(variant.id, quantity),
                        None if enriched.product.manage_stock => {
                            catalog.reduce_product_stock(enriched.product.id, quantity)
                        }
                        None => true,
                    };
                    if !reduced {
                        warn!(
                            product_id = enriched.product.id,
                            variant_id = ?enriched.variant.as_ref().map(|v| v.id),
                            "insufficient stock while fulfilling order line"
                        );
                        shortfalls.push(StockShortfall {
                            product_id: enriched.product.id,
                            variant_id: enriched.variant.as_ref().map(|v| v.id),
                            description: enriched.description(),
                        });
                    }
                }
                LineResolution::MissingProduct { key, .. } => {
                    warn!(
                        product_id = key.product_id,
                        "skipping cart line for deleted product at checkout"
                    );
                    skipped.push(key);
                }
            }
        }

        if lines.is_empty() {
            return Err(CartError::InvalidOperation(
                "no purchasable lines in cart".to_string(),
            ));
        }

        let total: Decimal = lines.iter().map(OrderLine::total_price).sum();
        let order = Order {
            id: order_id,
            email: input.email,
            phone: input.phone,
            address: input.address,
            city: input.city,
            postal_code: input.postal_code,
            status: OrderStatus::Pending,
            payment_method: input.payment_method,
            total,
            created_at: Utc::now(),
        };

        cart.clear();
        self.events.send_or_log(Event::OrderPlaced { order_id, total });
        info!(%order_id, %total, line_count = lines.len(), "order placed");

        Ok(PlacedOrder {
            order,
            lines,
            shortfalls,
            skipped,
        })
    }
}
