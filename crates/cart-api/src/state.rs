//! # Application State
//!
//! Shared state for the Axum application.
//! Built once at startup from the environment and `config/checkout.toml`;
//! handlers only ever read it.

use anyhow::Context;
use cart_core::{BoxedPaymentStrategy, RedirectSource, Site};
use cart_stripe::StripeCheckoutStrategy;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SITE_CONFIG_PATHS: [&str; 3] = [
    "config/checkout.toml",
    "../config/checkout.toml",
    "../../config/checkout.toml",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment provider
    pub strategy: BoxedPaymentStrategy,
    /// Checkout policy
    pub site: Arc<Site>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by Stripe
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let site = load_site(|key| std::env::var(key).ok())?;

        let stripe_strategy = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        if stripe_strategy.config().is_live_mode() {
            tracing::info!("Stripe running with live keys");
        } else {
            tracing::info!("Stripe running with test keys");
        }

        Ok(Self::with_strategy(Arc::new(stripe_strategy), site, config))
    }

    /// Assemble state from parts (tests plug in their own strategy here)
    pub fn with_strategy(strategy: BoxedPaymentStrategy, site: Site, config: AppConfig) -> Self {
        Self {
            strategy,
            site: Arc::new(site),
            config,
        }
    }
}

/// Load site policy from TOML, then apply environment overrides.
///
/// - `CHECKOUT_CONFIG`: explicit TOML path (must exist)
/// - `URL`: storefront URL
/// - `CHECKOUT_REDIRECT_SOURCE`: `static` or `origin`
/// - `CHECKOUT_SHIPPING_ENABLED`: `true` / `false`
pub fn load_site<F>(lookup: F) -> anyhow::Result<Site>
where
    F: Fn(&str) -> Option<String>,
{
    let mut site = match lookup("CHECKOUT_CONFIG").filter(|v| !v.is_empty()) {
        Some(path) => read_site_file(Path::new(&path))?,
        None => find_site_file()?,
    };

    if let Some(url) = lookup("URL").filter(|v| !v.is_empty()) {
        site.url = url;
    }

    if let Some(source) = lookup("CHECKOUT_REDIRECT_SOURCE") {
        site.redirect_source = source
            .parse::<RedirectSource>()
            .map_err(|e| anyhow::anyhow!("CHECKOUT_REDIRECT_SOURCE: {}", e))?;
    }

    if let Some(flag) = lookup("CHECKOUT_SHIPPING_ENABLED") {
        site.shipping.enabled = parse_flag(&flag)
            .with_context(|| format!("CHECKOUT_SHIPPING_ENABLED: not a boolean: {:?}", flag))?;
    }

    site.validate()
        .map_err(|e| anyhow::anyhow!("Invalid site configuration: {}", e))?;

    Ok(site)
}

fn read_site_file(path: &Path) -> anyhow::Result<Site> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let site = Site::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    tracing::info!(
        "Loaded site config from {} ({} shipping rates)",
        path.display(),
        site.shipping.rates.len()
    );
    Ok(site)
}

fn find_site_file() -> anyhow::Result<Site> {
    let found = SITE_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file());

    match found {
        Some(path) => read_site_file(&path),
        None => {
            tracing::warn!("No site config found, using built-in defaults");
            Ok(Site::default())
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
