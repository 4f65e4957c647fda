//! # Cart Types
//!
//! The JSON cart posted by the storefront, and its mapping onto provider
//! line items. Pricing is trusted from the client.

use crate::currency::{Currency, Price};
use crate::error::{PaymentError, PaymentResult};
use crate::order::LineItem;
use serde::{Deserialize, Serialize};

/// One item as sent by the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Display name
    pub name: String,

    /// Unit price in major units (e.g. 9.99)
    pub price: f64,

    /// Quantity
    pub quantity: u32,

    /// Absolute image URLs; only the first is forwarded
    #[serde(default)]
    pub images: Vec<String>,
}

impl CartItem {
    /// Map this item onto a provider line item
    pub fn to_line_item(&self, currency: Currency) -> LineItem {
        LineItem {
            name: self.name.clone(),
            image_url: self.images.first().cloned(),
            unit_price: Price::new(self.price, currency),
            quantity: self.quantity,
        }
    }

    fn validate(&self, index: usize) -> PaymentResult<()> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(PaymentError::InvalidRequest(format!(
                "items[{}]: price must be a non-negative amount",
                index
            )));
        }
        if self.quantity == 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "items[{}]: quantity must be at least 1",
                index
            )));
        }
        Ok(())
    }
}

/// Request body of the checkout endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartItem>,
}

impl CartRequest {
    /// Parse and validate a raw request body.
    ///
    /// The body is treated as JSON whatever the `Content-Type` says.
    pub fn from_json(body: &[u8]) -> PaymentResult<Self> {
        let cart: CartRequest = serde_json::from_slice(body)
            .map_err(|e| PaymentError::InvalidRequest(e.to_string()))?;
        cart.validate()?;
        Ok(cart)
    }

    /// Reject carts the provider would refuse or that break price invariants
    pub fn validate(&self) -> PaymentResult<()> {
        if self.items.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Cart has no items".to_string(),
            ));
        }
        self.items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| item.validate(i))
    }

    /// Build provider line items, one per cart item, in cart order
    pub fn line_items(&self, currency: Currency) -> Vec<LineItem> {
        build_line_items(&self.items, currency)
    }
}

/// Pure, order-preserving mapping from cart items to line items
pub fn build_line_items(items: &[CartItem], currency: Currency) -> Vec<LineItem> {
    items.iter().map(|item| item.to_line_item(currency)).collect()
}
