//! # Order Types
//!
//! The session-creation request derived from a cart, and the session the
//! provider hands back.

use crate::cart::CartRequest;
use crate::currency::{Currency, Price};
use crate::shipping::ShippingOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line item in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name shown on the checkout page
    pub name: String,

    /// Optional image URL, forwarded without validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Unit price
    pub unit_price: Price,

    /// Quantity
    pub quantity: u32,
}

impl LineItem {
    /// Calculate the total price for this line item, saturating at `i64::MAX`
    pub fn total(&self) -> Price {
        Price {
            amount: self.unit_price.amount.saturating_mul(i64::from(self.quantity)),
            currency: self.unit_price.currency,
        }
    }
}

/// An order to be checked out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID (generated, used for log correlation)
    pub id: String,

    /// Line items
    pub line_items: Vec<LineItem>,

    /// Currency (same for all items)
    pub currency: Currency,

    /// Shipping collection and rates, when the site offers them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingOptions>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order with generated ID
    pub fn new(currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            line_items: Vec::new(),
            currency,
            shipping: None,
            created_at: Utc::now(),
        }
    }

    /// Build an order from a validated cart
    pub fn from_cart(cart: &CartRequest, currency: Currency) -> Self {
        let mut order = Self::new(currency);
        order.line_items = cart.line_items(currency);
        order
    }

    /// Builder: attach shipping options
    pub fn with_shipping(mut self, shipping: ShippingOptions) -> Self {
        self.shipping = Some(shipping);
        self
    }

    /// Calculate order total (before shipping)
    ///
    /// Cart amounts come straight from the client, so the sum saturates
    /// instead of overflowing.
    pub fn total(&self) -> Price {
        let total_amount = self
            .line_items
            .iter()
            .fold(0_i64, |acc, item| acc.saturating_add(item.total().amount));
        Price {
            amount: total_amount,
            currency: self.currency,
        }
    }

    /// Check if order is empty
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Get item count
    pub fn item_count(&self) -> u64 {
        self.line_items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// A checkout session created by a payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Our order ID
    pub order_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// Hosted page URL, when the provider returns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,

    /// When the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Create a new checkout session
    pub fn new(
        session_id: impl Into<String>,
        order_id: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            order_id: order_id.into(),
            provider: provider.into(),
            checkout_url: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }
}
