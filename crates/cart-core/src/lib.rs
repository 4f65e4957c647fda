//! # cart-core
//!
//! Core types and traits for the cart-checkout service.
//!
//! This crate provides:
//! - `CartRequest` / `CartItem` for the storefront's JSON cart
//! - `Order`, `LineItem`, and `CheckoutSession` for session creation
//! - `Site` and `ShippingOptions` for per-deployment checkout policy
//! - `PaymentStrategy` trait for the payment provider
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartRequest, Order, PaymentStrategy, Site};
//!
//! let site = Site::default();
//! let cart = CartRequest::from_json(body)?;
//!
//! let mut order = Order::from_cart(&cart, site.currency);
//! order.shipping = site.shipping_for_checkout().cloned();
//!
//! let urls = site.checkout_urls(origin, referer);
//! let session = strategy
//!     .create_checkout(&order, &urls.success_url(), &urls.cancel_url())
//!     .await?;
//! ```

pub mod cart;
pub mod currency;
pub mod error;
pub mod order;
pub mod shipping;
pub mod site;
pub mod strategy;

// Re-exports for convenience
pub use cart::{build_line_items, CartItem, CartRequest};
pub use currency::{Currency, Price};
pub use error::{PaymentError, PaymentResult};
pub use order::{CheckoutSession, LineItem, Order};
pub use shipping::{DeliveryUnit, ShippingOptions, ShippingRate, MAX_SHIPPING_RATES};
pub use site::{CheckoutUrls, RedirectSource, Site, DEFAULT_SITE_URL};
pub use strategy::{BoxedPaymentStrategy, PaymentStrategy};
