//! # Shipping Options
//!
//! Shipping address collection and the flat-rate table offered on the hosted
//! checkout page. Loaded from the `[shipping]` table of `config/checkout.toml`.

use crate::error::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};

/// Provider cap on shipping options per session
pub const MAX_SHIPPING_RATES: usize = 5;

/// Unit of a delivery estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryUnit {
    Hour,
    Day,
    #[default]
    BusinessDay,
    Week,
    Month,
}

impl DeliveryUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryUnit::Hour => "hour",
            DeliveryUnit::Day => "day",
            DeliveryUnit::BusinessDay => "business_day",
            DeliveryUnit::Week => "week",
            DeliveryUnit::Month => "month",
        }
    }
}

/// A named flat-cost delivery choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    /// Label shown to the payer (e.g. "Express Air")
    pub display_name: String,

    /// Flat cost in the smallest unit of the site currency
    pub amount: i64,

    /// Lower bound of the delivery estimate
    pub min_days: u32,

    /// Upper bound of the delivery estimate
    pub max_days: u32,

    #[serde(default)]
    pub unit: DeliveryUnit,
}

impl ShippingRate {
    pub fn new(display_name: impl Into<String>, amount: i64, min_days: u32, max_days: u32) -> Self {
        Self {
            display_name: display_name.into(),
            amount,
            min_days,
            max_days,
            unit: DeliveryUnit::BusinessDay,
        }
    }
}

/// Shipping policy for a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOptions {
    /// Whether shipping address collection and rates are offered at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// ISO 3166-1 alpha-2 codes the payer may ship to
    #[serde(default)]
    pub allowed_countries: Vec<String>,

    /// Rates in the order they are offered
    #[serde(default)]
    pub rates: Vec<ShippingRate>,
}

fn default_true() -> bool {
    true
}

impl Default for ShippingOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_countries: ["US", "CA", "GB", "AU"]
                .into_iter()
                .map(String::from)
                .collect(),
            rates: vec![
                ShippingRate::new("Standard Ground", 0, 5, 7),
                ShippingRate::new("Express Air", 1500, 2, 3),
            ],
        }
    }
}

impl ShippingOptions {
    /// Shipping turned off entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            allowed_countries: Vec::new(),
            rates: Vec::new(),
        }
    }

    /// Check the table before the server starts taking requests
    pub fn validate(&self) -> PaymentResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.allowed_countries.is_empty() {
            return Err(PaymentError::Configuration(
                "shipping is enabled but allowed_countries is empty".to_string(),
            ));
        }

        if let Some(bad) = self
            .allowed_countries
            .iter()
            .find(|c| c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_uppercase()))
        {
            return Err(PaymentError::Configuration(format!(
                "invalid country code: {:?} (expected two upper-case letters)",
                bad
            )));
        }

        if self.rates.len() > MAX_SHIPPING_RATES {
            return Err(PaymentError::Configuration(format!(
                "at most {} shipping rates are allowed, got {}",
                MAX_SHIPPING_RATES,
                self.rates.len()
            )));
        }

        for rate in &self.rates {
            if rate.display_name.trim().is_empty() {
                return Err(PaymentError::Configuration(
                    "shipping rate display_name must not be empty".to_string(),
                ));
            }
            if rate.amount < 0 {
                return Err(PaymentError::Configuration(format!(
                    "shipping rate {:?} has a negative amount",
                    rate.display_name
                )));
            }
            if rate.min_days > rate.max_days {
                return Err(PaymentError::Configuration(format!(
                    "shipping rate {:?}: min_days exceeds max_days",
                    rate.display_name
                )));
            }
        }

        Ok(())
    }
}
