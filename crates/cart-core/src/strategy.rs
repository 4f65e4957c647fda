//! # Payment Strategy Trait
//!
//! Seam between the HTTP handler and the payment provider. The server holds
//! one `BoxedPaymentStrategy`; tests swap in a fake.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          PaymentStrategy (trait)            │
//! │  ├── create_checkout()                      │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!               ┌───────┴───────┐
//!               │StripeCheckout │
//!               │   Strategy    │
//!               └───────────────┘
//! ```

use crate::error::PaymentResult;
use crate::order::{CheckoutSession, Order};
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Create a hosted checkout session for `order`.
    ///
    /// # Arguments
    /// * `order` - Line items and optional shipping block
    /// * `success_url` - URL to redirect after successful payment
    /// * `cancel_url` - URL to redirect if customer cancels
    async fn create_checkout(
        &self,
        order: &Order,
        success_url: &str,
        cancel_url: &str,
    ) -> PaymentResult<CheckoutSession>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;
