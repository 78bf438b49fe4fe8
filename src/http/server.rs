//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, instrumentation, timeout, body limit)
//! - Bind server to listener
//! - Serve until the shutdown signal fires

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::middleware::{code_timeouts, track_metrics, InstrumentationState};
use crate::observability::{NoopMetrics, PrometheusMetrics, RequestMetrics};
use crate::store::UserStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    /// Present when the exposition route is mounted.
    pub exporter: Option<Arc<PrometheusMetrics>>,
}

/// HTTP server for the user service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server; requests are instrumented into `exporter` when given.
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn UserStore>,
        exporter: Option<Arc<PrometheusMetrics>>,
    ) -> Self {
        let sink: Arc<dyn RequestMetrics> = match &exporter {
            Some(exporter) => exporter.clone(),
            None => Arc::new(NoopMetrics),
        };
        Self::with_sink(config, store, exporter, sink)
    }

    /// Create a server recording request instrumentation into `sink`.
    pub fn with_sink(
        config: ServiceConfig,
        store: Arc<dyn UserStore>,
        exporter: Option<Arc<PrometheusMetrics>>,
        sink: Arc<dyn RequestMetrics>,
    ) -> Self {
        let state = AppState { store, exporter };
        let instrumentation =
            InstrumentationState::new(sink, config.observability.metrics_path.as_str());
        let router = Self::build_router(&config, state, instrumentation);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        instrumentation: InstrumentationState,
    ) -> Router {
        let mut routes = Router::new()
            .route("/health", get(handlers::health))
            .route("/user", post(handlers::create_user))
            .route(
                "/user/{user_id}",
                get(handlers::get_user)
                    .put(handlers::update_user)
                    .delete(handlers::delete_user),
            );

        if state.exporter.is_some() {
            routes = routes.route(
                &config.observability.metrics_path,
                get(handlers::render_metrics),
            );
        }

        // Layers run outermost-last: the instrumentation sits outside the
        // timeout so timed-out requests are still recorded with their 408.
        routes
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::map_response(code_timeouts))
            .layer(middleware::from_fn_with_state(instrumentation, track_metrics))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            metrics_path = %self.config.observability.metrics_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseDriver;
    use crate::model::{User, UserId, UserInput};
    use crate::store::{MemoryUserStore, StoreError};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server(metrics: bool) -> HttpServer {
        let mut config = ServiceConfig::default();
        config.database.driver = DatabaseDriver::Memory;
        let exporter = metrics.then(|| Arc::new(PrometheusMetrics::with_default_buckets().unwrap()));
        HttpServer::new(config, Arc::new(MemoryUserStore::new()), exporter)
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    fn ana() -> Value {
        json!({
            "username": "ana",
            "firstName": "Ana",
            "lastName": "Lee",
            "email": "a@x.com",
            "phone": "555"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(server(false).router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "OK" }));
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let router = server(false).router();

        let (status, created) = send(router.clone(), "POST", "/user", Some(ana())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["username"], "ana");

        let uri = format!("/user/{id}");
        let (status, fetched) = send(router.clone(), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["email"], "a@x.com");

        let mut changed = ana();
        changed["username"] = json!("ana2");
        let (status, updated) = send(router.clone(), "PUT", &uri, Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["username"], "ana2");

        let (status, _) = send(router.clone(), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "code": 3, "message": "Not found" }));
    }

    #[tokio::test]
    async fn test_malformed_ids() {
        let router = server(false).router();

        let (status, body) = send(router.clone(), "GET", "/user/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 3);

        let (status, body) = send(router.clone(), "PUT", "/user/-1", Some(ana())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 3);

        let (status, _) = send(router, "DELETE", "/user/abc", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_metrics_route_follows_config() {
        let (status, _) = send(server(false).router(), "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let router = server(true).router();
        send(router.clone(), "GET", "/health", None).await;
        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            handlers::PROMETHEUS_CONTENT_TYPE
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(r#"endpoint="/health""#));
        assert!(!text.contains(r#"endpoint="/metrics""#));
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let response = server(false)
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let response = server(false)
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    fn limited_server(max_body_size: usize) -> HttpServer {
        let mut config = ServiceConfig::default();
        config.database.driver = DatabaseDriver::Memory;
        config.security.max_body_size = max_body_size;
        HttpServer::new(config, Arc::new(MemoryUserStore::new()), None)
    }

    fn oversized() -> Value {
        let mut payload = ana();
        payload["username"] = json!("a".repeat(4096));
        payload
    }

    #[tokio::test]
    async fn test_oversized_bodies_are_coded_rejections() {
        let router = limited_server(1024).router();

        let (status, body) = send(router.clone(), "POST", "/user", Some(oversized())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1);
        assert!(body["message"].as_str().unwrap().starts_with("unreadable payload"));

        let (status, created) = send(router.clone(), "POST", "/user", Some(ana())).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/user/{}", created["id"]);

        let (status, body) = send(router.clone(), "PUT", &uri, Some(oversized())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 5);

        // The lookup still wins over the payload.
        let (status, body) = send(router, "PUT", "/user/999", Some(oversized())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 3);
    }

    struct StalledStore;

    #[async_trait::async_trait]
    impl UserStore for StalledStore {
        async fn create(&self, _input: UserInput) -> Result<User, StoreError> {
            Err(StoreError::database("unused"))
        }

        async fn find_by_id(&self, _id: UserId) -> Result<User, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(StoreError::NotFound)
        }

        async fn update_fields(
            &self,
            _existing: &User,
            _fields: UserInput,
        ) -> Result<User, StoreError> {
            Err(StoreError::database("unused"))
        }

        async fn delete_by_id(&self, _id: UserId) -> Result<(), StoreError> {
            Ok(())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_timeout_has_coded_body() {
        let mut config = ServiceConfig::default();
        config.database.driver = DatabaseDriver::Memory;
        config.timeouts.request_secs = 1;
        let router = HttpServer::new(config, Arc::new(StalledStore), None).router();

        let (status, body) = send(router, "GET", "/user/1", None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, json!({ "code": 8, "message": "Request timed out" }));
    }
}
