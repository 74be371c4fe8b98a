//! `sharedesk` HTTP server.
//!
//! A thin JSON proxy between the admin console and the record store:
//! collection and record routes under `/api/*`, each resolving its network
//! from the `x-nillion-config` header, plus stateless schema tools.

pub mod config;
pub mod error;
pub mod network;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, Method, header};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::network::NETWORK_HEADER;
use crate::state::AppState;

/// Concurrent `/api/setup` requests; each may register a builder.
const SETUP_CONCURRENCY: usize = 10;

/// Build the Axum router with all routes and middleware.
pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let setup_routes = Router::new()
        .nest("/api/setup", routes::setup::router())
        .layer(ConcurrencyLimitLayer::new(SETUP_CONCURRENCY));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(NETWORK_HEADER)]);

    Router::new()
        .nest("/api/collections", routes::collections::router())
        .nest("/api/data", routes::data::router())
        .nest("/api/schema", routes::schema::router())
        .merge(setup_routes)
        .merge(routes::health::router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use sharedesk_core::DRAFT_07;
    use sharedesk_store::{MemoryConnector, NetworkConfig, NetworkPreset};

    use crate::network::NETWORK_HEADER;
    use crate::state::AppState;

    pub const TEST_API_KEY: &str = "test-api-key";

    /// Collection schema used across route tests.
    pub fn people_schema() -> Value {
        json!({
            "$schema": DRAFT_07,
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "_id": {"type": "string", "format": "uuid"},
                    "name": {"type": "string"},
                    "age": {"type": "integer", "minimum": 0, "maximum": 120},
                    "secret": {
                        "type": "object",
                        "properties": {"%share": {"type": "string"}},
                        "required": ["%share"]
                    }
                },
                "required": ["_id", "name"]
            }
        })
    }

    pub fn encode_query(raw: &str) -> String {
        urlencoding::encode(raw).into_owned()
    }

    /// A router over a fresh in-memory connector.
    pub struct TestApp {
        router: Router,
    }

    impl TestApp {
        pub fn new() -> Self {
            Self::with_default_network(NetworkConfig::preset(NetworkPreset::Testnet, TEST_API_KEY))
        }

        pub fn with_default_network(network: NetworkConfig) -> Self {
            let state = AppState::new(Arc::new(MemoryConnector::new()), network);
            Self {
                router: super::app(Arc::new(state), 64 * 1024),
            }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        fn json_request(method: Method, uri: &str, body: String) -> Request<Body> {
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
        }

        pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Self::json_request(Method::POST, uri, body.to_string())).await
        }

        pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
            self.send(Self::json_request(Method::POST, uri, body.to_owned())).await
        }

        pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Self::json_request(Method::PUT, uri, body.to_string())).await
        }

        pub async fn post_with_network(&self, uri: &str, network: &NetworkConfig) -> (StatusCode, Value) {
            let mut request = Self::json_request(Method::POST, uri, "{}".to_owned());
            request.headers_mut().insert(
                NETWORK_HEADER,
                serde_json::to_string(network).unwrap().parse().unwrap(),
            );
            self.send(request).await
        }

        /// Create the `people` collection and return its id.
        pub async fn create_people(&self) -> String {
            let (status, body) = self
                .post(
                    "/api/collections",
                    json!({"name": "people", "type": "standard", "schema": people_schema()}),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["collection"]["_id"].as_str().unwrap().to_owned()
        }
    }
}
