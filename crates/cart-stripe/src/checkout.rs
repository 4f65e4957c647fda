//! # Stripe Checkout Sessions
//!
//! Implementation of the Stripe Checkout Sessions API.
//! Sessions are always one-time card payments; shipping collection is added
//! when the order carries a shipping block.

use crate::config::StripeConfig;
use async_trait::async_trait;
use cart_core::{
    CheckoutSession, Order, PaymentError, PaymentResult, PaymentStrategy, ShippingOptions,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Matches the official Stripe client's default network timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(80);

/// Stripe Checkout Session strategy
///
/// Uses Stripe's hosted checkout page; card details never touch this service.
pub struct StripeCheckoutStrategy {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutStrategy {
    /// Create a new Stripe checkout strategy
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build line items for Stripe API
    fn build_line_items(order: &Order) -> Vec<StripeLineItem> {
        order
            .line_items
            .iter()
            .map(|item| StripeLineItem {
                price_data: StripePriceData {
                    currency: item.unit_price.currency.as_str(),
                    unit_amount: item.unit_price.amount,
                    product_data: StripeProductData {
                        name: item.name.clone(),
                        images: item.image_url.iter().cloned().collect(),
                    },
                },
                quantity: item.quantity as i64,
            })
            .collect()
    }

    /// Flatten the session request into Stripe's bracketed form encoding
    fn build_form_params(order: &Order, success_url: &str, cancel_url: &str) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
        ];

        for (i, item) in Self::build_line_items(order).iter().enumerate() {
            let prefix = format!("line_items[{}]", i);
            form_params.push((
                format!("{}[price_data][currency]", prefix),
                item.price_data.currency.to_string(),
            ));
            form_params.push((
                format!("{}[price_data][unit_amount]", prefix),
                item.price_data.unit_amount.to_string(),
            ));
            form_params.push((
                format!("{}[price_data][product_data][name]", prefix),
                item.price_data.product_data.name.clone(),
            ));
            for (j, img) in item.price_data.product_data.images.iter().enumerate() {
                form_params.push((
                    format!("{}[price_data][product_data][images][{}]", prefix, j),
                    img.clone(),
                ));
            }
            form_params.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
        }

        if let Some(ref shipping) = order.shipping {
            push_shipping_params(&mut form_params, shipping, order.currency.as_str());
        }

        form_params.push(("metadata[order_id]".to_string(), order.id.clone()));

        form_params
    }
}

fn push_shipping_params(
    form_params: &mut Vec<(String, String)>,
    shipping: &ShippingOptions,
    currency: &str,
) {
    for (j, country) in shipping.allowed_countries.iter().enumerate() {
        form_params.push((
            format!("shipping_address_collection[allowed_countries][{}]", j),
            country.clone(),
        ));
    }

    for (k, rate) in shipping.rates.iter().enumerate() {
        let prefix = format!("shipping_options[{}][shipping_rate_data]", k);
        form_params.push((format!("{}[type]", prefix), "fixed_amount".to_string()));
        form_params.push((
            format!("{}[fixed_amount][amount]", prefix),
            rate.amount.to_string(),
        ));
        form_params.push((
            format!("{}[fixed_amount][currency]", prefix),
            currency.to_string(),
        ));
        form_params.push((format!("{}[display_name]", prefix), rate.display_name.clone()));
        for (bound, value) in [("minimum", rate.min_days), ("maximum", rate.max_days)] {
            form_params.push((
                format!("{}[delivery_estimate][{}][unit]", prefix, bound),
                rate.unit.as_str().to_string(),
            ));
            form_params.push((
                format!("{}[delivery_estimate][{}][value]", prefix, bound),
                value.to_string(),
            ));
        }
    }
}

#[async_trait]
impl PaymentStrategy for StripeCheckoutStrategy {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_checkout(
        &self,
        order: &Order,
        success_url: &str,
        cancel_url: &str,
    ) -> PaymentResult<CheckoutSession> {
        if order.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Order has no items".to_string(),
            ));
        }

        let form_params = Self::build_form_params(order, success_url, cancel_url);

        debug!(
            "Creating Stripe checkout session: {} items, shipping={}",
            order.line_items.len(),
            order.shipping.is_some()
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            // Parse Stripe error
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                error!(
                    "Stripe API error: status={}, code={:?}, message={}",
                    status, error_response.error.code, error_response.error.message
                );
                return Err(PaymentError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_response.error.message,
                });
            }

            error!("Stripe API error: status={}, body={}", status, body);
            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let session_response: StripeCheckoutSessionResponse =
            serde_json::from_str(&body).map_err(|e| {
                PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
            })?;

        info!("Created Stripe checkout session: id={}", session_response.id);

        Ok(CheckoutSession {
            session_id: session_response.id,
            order_id: order.id.clone(),
            provider: PROVIDER.to_string(),
            checkout_url: session_response.url,
            expires_at: session_response
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: Utc::now(),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug)]
struct StripeLineItem {
    price_data: StripePriceData,
    quantity: i64,
}

#[derive(Debug)]
struct StripePriceData {
    currency: &'static str,
    unit_amount: i64,
    product_data: StripeProductData,
}

#[derive(Debug)]
struct StripeProductData {
    name: String,
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}
