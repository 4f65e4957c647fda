//! # Request Handlers
//!
//! Axum request handlers for the checkout endpoint.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{
        header::{ORIGIN, REFERER},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use cart_core::{CartRequest, CheckoutSession, Order, PaymentError, PaymentResult};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Response Types
// =============================================================================

/// Create checkout response
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    /// Provider session id the storefront redirects with
    pub id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

fn payment_error_to_response(err: &PaymentError) -> (StatusCode, Json<ErrorResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.client_message())))
}

fn header_str<'a>(headers: &'a HeaderMap, name: axum::http::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cart-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Any verb other than POST on the checkout path
pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Create a checkout session from the posted cart
///
/// A body that cannot be buffered (over the 2 MB default limit, or a broken
/// stream) keeps the rejection's status but still answers `{"error": ...}`.
#[instrument(skip_all)]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected checkout body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ErrorResponse::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    match checkout(&state, &headers, &body).await {
        Ok(session) => Json(CreateCheckoutResponse {
            id: session.session_id,
        })
        .into_response(),
        Err(err) => {
            if err.is_input_error() {
                warn!("Rejected checkout request: {}", err);
            } else {
                error!("Failed to create checkout: {}", err);
            }
            payment_error_to_response(&err).into_response()
        }
    }
}

async fn checkout(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> PaymentResult<CheckoutSession> {
    let cart = CartRequest::from_json(body)?;
    let site = &state.site;

    let mut order = Order::from_cart(&cart, site.currency);
    if let Some(shipping) = site.shipping_for_checkout() {
        order = order.with_shipping(shipping.clone());
    }

    let urls = site.checkout_urls(header_str(headers, ORIGIN), header_str(headers, REFERER));
    let success_url = urls.success_url();
    let cancel_url = urls.cancel_url();

    info!(
        "Creating checkout: order={}, {} items, total={}, shipping={}, success_url={}",
        order.id,
        order.item_count(),
        order.total().display(),
        order.shipping.is_some(),
        success_url
    );

    let session = state
        .strategy
        .create_checkout(&order, &success_url, &cancel_url)
        .await?;

    info!(
        "Created checkout session: {} via {}, url={}, expires_at={}",
        session.session_id,
        state.strategy.provider_name(),
        session.checkout_url.as_deref().unwrap_or("-"),
        session
            .expires_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use cart_core::{PaymentStrategy, RedirectSource, Site};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const CART: &str =
        r#"{"items":[{"name":"A","price":9.99,"quantity":2,"images":["http://x/a.png"]}]}"#;

    struct Call {
        order: Order,
        success_url: String,
        cancel_url: String,
    }

    enum Outcome {
        Session(&'static str),
        Rejected(&'static str),
        Unreachable(&'static str),
    }

    /// Records every call and answers with a canned outcome
    struct MockStrategy {
        outcome: Outcome,
        calls: Mutex<Vec<Call>>,
    }

    impl MockStrategy {
        fn with_outcome(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn ok(session_id: &'static str) -> Arc<Self> {
            Self::with_outcome(Outcome::Session(session_id))
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Self::with_outcome(Outcome::Rejected(message))
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentStrategy for MockStrategy {
        async fn create_checkout(
            &self,
            order: &Order,
            success_url: &str,
            cancel_url: &str,
        ) -> PaymentResult<CheckoutSession> {
            self.calls.lock().unwrap().push(Call {
                order: order.clone(),
                success_url: success_url.to_string(),
                cancel_url: cancel_url.to_string(),
            });
            match self.outcome {
                Outcome::Session(id) => Ok(CheckoutSession::new(id, order.id.clone(), "mock")),
                Outcome::Rejected(message) => Err(PaymentError::ProviderError {
                    provider: "mock".to_string(),
                    message: message.to_string(),
                }),
                Outcome::Unreachable(message) => {
                    Err(PaymentError::NetworkError(message.to_string()))
                }
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    fn state(strategy: Arc<MockStrategy>, site: Site) -> AppState {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
        };
        AppState::with_strategy(strategy, site, config)
    }

    fn post(uri: &str) -> axum::http::request::Builder {
        Request::builder().method("POST").uri(uri)
    }

    /// fmt subscriber writing into a shared buffer for the current thread
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::INFO)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[test]
    fn test_error_response_mapping() {
        let (status, Json(body)) =
            payment_error_to_response(&PaymentError::InvalidRequest("Bad data".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Bad data");

        let (status, _) = payment_error_to_response(&PaymentError::NetworkError("reset".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_non_post_is_rejected() {
        for method in ["GET", "PUT", "DELETE", "PATCH"] {
            let mock = MockStrategy::ok("sess_123");
            let request = Request::builder()
                .method(method)
                .uri("/api/v1/checkout")
                .body(Body::from(CART))
                .unwrap();

            let (status, body) = send(state(mock.clone(), Site::default()), request).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", method);
            assert_eq!(body, b"Method Not Allowed");
            assert_eq!(mock.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_success_returns_session_id() {
        let mock = MockStrategy::ok("sess_123");
        let request = post("/api/v1/checkout").body(Body::from(CART)).unwrap();

        let (status, body) = send(state(mock.clone(), Site::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"id":"sess_123"}"#);

        let calls = mock.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let line_items = &calls[0].order.line_items;
        assert_eq!(line_items.len(), 1);
        assert_eq!(line_items[0].unit_price.amount, 999);
        assert_eq!(line_items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_netlify_path_alias() {
        let mock = MockStrategy::ok("sess_alias");
        let request = post("/.netlify/functions/checkout")
            .header("content-type", "text/plain")
            .body(Body::from(CART))
            .unwrap();

        let (status, body) = send(state(mock, Site::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"id":"sess_alias"}"#);
    }

    #[tokio::test]
    async fn test_malformed_body_never_reaches_provider() {
        let mock = MockStrategy::ok("sess_123");
        let request = post("/api/v1/checkout").body(Body::from("{items: nope")).unwrap();

        let (status, body) = send(state(mock.clone(), Site::default()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let mock = MockStrategy::ok("sess_123");
        let request = post("/api/v1/checkout")
            .body(Body::from(r#"{"items":[]}"#))
            .unwrap();

        let (status, body) = send(state(mock.clone(), Site::default()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, br#"{"error":"Cart has no items"}"#);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_fault_is_500_with_message() {
        let mock = MockStrategy::failing("Invalid API Key");
        let request = post("/api/v1/checkout").body(Body::from(CART)).unwrap();

        let (status, body) = send(state(mock.clone(), Site::default()), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, br#"{"error":"Invalid API Key"}"#);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_redirect_from_origin_header() {
        let mock = MockStrategy::ok("sess_123");
        let site = Site::default().with_redirect_source(RedirectSource::FromOriginHeader);
        let request = post("/api/v1/checkout")
            .header("origin", "https://shop.example")
            .body(Body::from(CART))
            .unwrap();

        let (status, _) = send(state(mock.clone(), site), request).await;
        assert_eq!(status, StatusCode::OK);

        let calls = mock.calls.lock().unwrap();
        assert!(calls[0].success_url.starts_with("https://shop.example"));
        assert!(calls[0].cancel_url.starts_with("https://shop.example"));
    }

    #[tokio::test]
    async fn test_redirect_from_referer_then_default() {
        let site = Site::default().with_redirect_source(RedirectSource::FromOriginHeader);

        let mock = MockStrategy::ok("sess_123");
        let request = post("/api/v1/checkout")
            .header("referer", "https://shop.example/cart")
            .body(Body::from(CART))
            .unwrap();
        send(state(mock.clone(), site.clone()), request).await;
        assert_eq!(
            mock.calls.lock().unwrap()[0].success_url,
            "https://shop.example/cart?success=true"
        );

        let mock = MockStrategy::ok("sess_123");
        let request = post("/api/v1/checkout").body(Body::from(CART)).unwrap();
        send(state(mock.clone(), site), request).await;
        let calls = mock.calls.lock().unwrap();
        assert_eq!(calls[0].success_url, "http://localhost:8888?success=true");
        assert_eq!(calls[0].cancel_url, "http://localhost:8888?canceled=true");
    }

    #[tokio::test]
    async fn test_static_redirect_and_shipping_policy() {
        let mock = MockStrategy::ok("sess_123");
        let site = Site::default().with_url("https://static.example");
        let request = post("/api/v1/checkout")
            .header("origin", "https://shop.example")
            .body(Body::from(CART))
            .unwrap();
        send(state(mock.clone(), site.clone()), request).await;
        {
            let calls = mock.calls.lock().unwrap();
            assert_eq!(calls[0].success_url, "https://static.example?success=true");
            let shipping = calls[0].order.shipping.as_ref().unwrap();
            assert_eq!(shipping.allowed_countries, ["US", "CA", "GB", "AU"]);
            assert_eq!(shipping.rates.len(), 2);
        }

        let mock = MockStrategy::ok("sess_123");
        let request = post("/api/v1/checkout").body(Body::from(CART)).unwrap();
        send(state(mock.clone(), site.with_shipping_enabled(false)), request).await;
        assert!(mock.calls.lock().unwrap()[0].order.shipping.is_none());
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(state(MockStrategy::ok("x"), Site::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "cart-checkout");
    }

    #[tokio::test]
    async fn test_huge_amounts_with_logging_enabled() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let carts = [
            r#"{"items":[{"name":"A","price":1e17,"quantity":2}]}"#,
            r#"{"items":[{"name":"A","price":1.0,"quantity":4294967295},{"name":"B","price":1.0,"quantity":1}]}"#,
        ];
        for cart in carts {
            let mock = MockStrategy::ok("sess_big");
            let request = post("/api/v1/checkout").body(Body::from(cart)).unwrap();

            let (status, body) = send(state(mock.clone(), Site::default()), request).await;

            assert_eq!(status, StatusCode::OK, "{}", cart);
            assert_eq!(body, br#"{"id":"sess_big"}"#);
            assert_eq!(mock.call_count(), 1);
        }
        assert!(logs.contents().contains("Creating checkout"));
    }

    #[tokio::test]
    async fn test_provider_fault_is_logged_as_error() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let mock = MockStrategy::failing("Invalid API Key");
        let request = post("/api/v1/checkout").body(Body::from(CART)).unwrap();
        let (status, _) = send(state(mock, Site::default()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let output = logs.contents();
        let line = output
            .lines()
            .find(|line| line.contains("Failed to create checkout"))
            .unwrap();
        assert!(line.contains("ERROR"), "{}", line);
        assert!(line.contains("Invalid API Key"), "{}", line);
    }

    #[tokio::test]
    async fn test_network_fault_is_logged_as_error() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let mock = MockStrategy::with_outcome(Outcome::Unreachable("connection refused"));
        let request = post("/api/v1/checkout").body(Body::from(CART)).unwrap();
        let (status, body) = send(state(mock, Site::default()), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, br#"{"error":"connection refused"}"#);
        let output = logs.contents();
        assert!(output
            .lines()
            .any(|line| line.contains("ERROR") && line.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_input_error_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let request = post("/api/v1/checkout")
            .body(Body::from(r#"{"items":[]}"#))
            .unwrap();
        let (status, _) = send(state(MockStrategy::ok("sess_123"), Site::default()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let output = logs.contents();
        let line = output
            .lines()
            .find(|line| line.contains("Rejected checkout request"))
            .unwrap();
        assert!(line.contains("WARN"), "{}", line);
        assert!(!output.contains("ERROR"));
    }

    #[tokio::test]
    async fn test_oversized_body_gets_json_error() {
        let mock = MockStrategy::ok("sess_123");
        let oversized = vec![b' '; 3 * 1024 * 1024];
        let request = post("/api/v1/checkout").body(Body::from(oversized)).unwrap();

        let (status, body) = send(state(mock.clone(), Site::default()), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());
        assert_eq!(mock.call_count(), 0);
    }
}
