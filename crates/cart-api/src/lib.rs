//! # cart-api
//!
//! HTTP layer for cart-checkout.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The checkout endpoint that turns a cart into a hosted payment session
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/checkout` | Create checkout session |
//! | POST | `/.netlify/functions/checkout` | Create checkout session (legacy path) |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
