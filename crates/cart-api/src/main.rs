//! # cart-checkout
//!
//! Turns a storefront cart into a hosted Stripe Checkout session.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export URL=https://shop.example
//!
//! # Run the server
//! cart-checkout
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Site: url={}, currency={}, redirect={:?}, shipping={}",
        state.site.url,
        state.site.currency,
        state.site.redirect_source,
        state.site.shipping_enabled()
    );
    info!("Payment provider: {}", state.strategy.provider_name());

    // Create router
    let app = routes::create_router(state);

    info!("cart-checkout {} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);

    if !is_prod {
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
