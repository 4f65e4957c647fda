//! # cart-stripe
//!
//! Stripe payment strategy for cart-checkout.
//!
//! **StripeCheckoutStrategy** drives the Checkout Sessions API:
//! - Dynamic line items priced by the storefront
//! - Optional shipping address collection with flat-rate options
//! - Hosted payment page (redirect by session id)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_stripe::StripeCheckoutStrategy;
//! use cart_core::{Order, PaymentStrategy};
//!
//! // Create strategy from environment
//! let strategy = StripeCheckoutStrategy::from_env()?;
//!
//! // Create checkout session
//! let session = strategy.create_checkout(
//!     &order,
//!     "https://shop.example?success=true",
//!     "https://shop.example?canceled=true",
//! ).await?;
//!
//! // Hand session.session_id back to the storefront
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
