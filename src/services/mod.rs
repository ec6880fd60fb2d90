//! Request-level workflows over the cart: the validated add/update paths a
//! storefront view drives, and the checkout hand-off.

pub mod cart;
pub mod checkout;

pub use cart::{CartService, CartUpdateOutcome};
pub use checkout::{CheckoutService, PlaceOrderInput, PlacedOrder, StockShortfall};
