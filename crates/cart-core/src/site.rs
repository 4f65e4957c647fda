//! # Site Configuration
//!
//! Per-deployment checkout policy: which currency is charged, whether shipping
//! is collected, and where the payer is sent back to afterwards.
//!
//! ```toml
//! url = "https://shop.example"
//! currency = "usd"
//! redirect_source = "static"
//!
//! [shipping]
//! enabled = true
//! allowed_countries = ["US", "CA"]
//!
//! [[shipping.rates]]
//! display_name = "Standard Ground"
//! amount = 0
//! min_days = 5
//! max_days = 7
//! ```

use crate::currency::Currency;
use crate::error::{PaymentError, PaymentResult};
use crate::shipping::ShippingOptions;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Redirect base used when nothing else is configured
pub const DEFAULT_SITE_URL: &str = "http://localhost:8888";

/// Where the success/cancel redirect base comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RedirectSource {
    /// Always the configured site URL
    #[default]
    Static,
    /// The request's `origin`, then `referer`, then the site URL
    #[serde(alias = "origin")]
    FromOriginHeader,
}

impl FromStr for RedirectSource {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(RedirectSource::Static),
            "origin" | "from_origin_header" | "header" => Ok(RedirectSource::FromOriginHeader),
            other => Err(PaymentError::Configuration(format!(
                "unknown redirect source {:?} (expected \"static\" or \"origin\")",
                other
            ))),
        }
    }
}

/// Success and cancel URLs for one checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    /// Base the payer returns to (e.g. "https://shop.example")
    pub base_url: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn success_url(&self) -> String {
        with_query_flag(&self.base_url, "success=true")
    }

    pub fn cancel_url(&self) -> String {
        with_query_flag(&self.base_url, "canceled=true")
    }
}

fn with_query_flag(url: &str, flag: &str) -> String {
    if url.contains('?') {
        format!("{}&{}", url, flag)
    } else {
        format!("{}?{}", url, flag)
    }
}

/// Checkout policy for the storefront this service fronts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Public URL of the storefront
    #[serde(default = "default_site_url")]
    pub url: String,

    /// Currency every line item and shipping rate is charged in
    #[serde(default)]
    pub currency: Currency,

    #[serde(default)]
    pub redirect_source: RedirectSource,

    #[serde(default)]
    pub shipping: ShippingOptions,
}

fn default_site_url() -> String {
    DEFAULT_SITE_URL.to_string()
}

impl Default for Site {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            currency: Currency::USD,
            redirect_source: RedirectSource::Static,
            shipping: ShippingOptions::default(),
        }
    }
}

impl Site {
    /// Load site policy from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Builder: set the storefront URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Builder: set the redirect source
    pub fn with_redirect_source(mut self, source: RedirectSource) -> Self {
        self.redirect_source = source;
        self
    }

    /// Builder: turn shipping collection on or off
    pub fn with_shipping_enabled(mut self, enabled: bool) -> Self {
        self.shipping.enabled = enabled;
        self
    }

    pub fn shipping_enabled(&self) -> bool {
        self.shipping.enabled
    }

    /// Shipping block to attach to a session, if any
    pub fn shipping_for_checkout(&self) -> Option<&ShippingOptions> {
        self.shipping.enabled.then_some(&self.shipping)
    }

    /// Resolve redirect URLs for one request.
    ///
    /// Empty header values are treated as absent.
    pub fn checkout_urls(&self, origin: Option<&str>, referer: Option<&str>) -> CheckoutUrls {
        let base = match self.redirect_source {
            RedirectSource::Static => self.url.as_str(),
            RedirectSource::FromOriginHeader => origin
                .filter(|v| !v.is_empty())
                .or(referer.filter(|v| !v.is_empty()))
                .unwrap_or(self.url.as_str()),
        };
        CheckoutUrls::new(base)
    }

    /// Check the policy before serving requests
    pub fn validate(&self) -> PaymentResult<()> {
        if self.url.trim().is_empty() {
            return Err(PaymentError::Configuration(
                "site url must not be empty".to_string(),
            ));
        }
        self.shipping.validate()
    }
}
