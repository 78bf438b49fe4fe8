//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use user_service::config::{DatabaseDriver, ServiceConfig};
use user_service::http::HttpServer;
use user_service::lifecycle::Shutdown;
use user_service::model::{User, UserId, UserInput};
use user_service::observability::{PrometheusMetrics, RequestMetrics};
use user_service::store::{MemoryUserStore, StoreError, UserStore};
use user_service_sdk::{NewUser, UserClient};

/// A server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> UserClient {
        UserClient::with_client(http_client(), &self.url())
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.database.driver = DatabaseDriver::Memory;
    config
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

async fn serve(server: HttpServer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Start a server with the given store and a Prometheus exporter.
pub async fn start_server(store: Arc<dyn UserStore>) -> (TestServer, Arc<PrometheusMetrics>) {
    let exporter = Arc::new(PrometheusMetrics::with_default_buckets().unwrap());
    let server = HttpServer::new(test_config(), store, Some(exporter.clone()));
    (serve(server).await, exporter)
}

/// Start a server recording instrumentation into `sink`, exposition enabled.
pub async fn start_server_with_sink(
    store: Arc<dyn UserStore>,
    sink: Arc<dyn RequestMetrics>,
) -> TestServer {
    start_configured(test_config(), store, sink).await
}

/// Like [`start_server_with_sink`] with a custom configuration.
pub async fn start_configured(
    config: ServiceConfig,
    store: Arc<dyn UserStore>,
    sink: Arc<dyn RequestMetrics>,
) -> TestServer {
    let exporter = Arc::new(PrometheusMetrics::with_default_buckets().unwrap());
    let server = HttpServer::with_sink(config, store, Some(exporter), sink);
    serve(server).await
}

pub fn ana() -> NewUser {
    NewUser {
        username: "ana".into(),
        first_name: "Ana".into(),
        last_name: "Lee".into(),
        email: "a@x.com".into(),
        phone: "555".into(),
    }
}

/// Which store operation a [`FaultyStore`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Find,
    Update,
    Delete,
}

/// Store wrapper that counts calls and can inject failures.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryUserStore,
    failures: Mutex<Vec<(Op, StoreError)>>,
    pub creates: AtomicUsize,
    pub finds: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `op` fail with `err`.
    pub fn fail(&self, op: Op, err: StoreError) {
        self.failures.lock().unwrap().push((op, err));
    }

    fn injected(&self, op: Op) -> Option<StoreError> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .find(|(o, _)| *o == op)
            .map(|(_, e)| e.clone())
    }

    pub fn count(&self, op: Op) -> usize {
        let counter = match op {
            Op::Create => &self.creates,
            Op::Find => &self.finds,
            Op::Update => &self.updates,
            Op::Delete => &self.deletes,
        };
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for FaultyStore {
    async fn create(&self, input: UserInput) -> Result<User, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match self.injected(Op::Create) {
            Some(err) => Err(err),
            None => self.inner.create(input).await,
        }
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        match self.injected(Op::Find) {
            Some(err) => Err(err),
            None => self.inner.find_by_id(id).await,
        }
    }

    async fn update_fields(&self, existing: &User, fields: UserInput) -> Result<User, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        match self.injected(Op::Update) {
            Some(err) => Err(err),
            None => self.inner.update_fields(existing, fields).await,
        }
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match self.injected(Op::Delete) {
            Some(err) => Err(err),
            None => self.inner.delete_by_id(id).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store whose lookups take `delay` before answering.
#[derive(Default)]
pub struct SlowStore {
    inner: MemoryUserStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryUserStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl UserStore for SlowStore {
    async fn create(&self, input: UserInput) -> Result<User, StoreError> {
        self.inner.create(input).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(id).await
    }

    async fn update_fields(&self, existing: &User, fields: UserInput) -> Result<User, StoreError> {
        self.inner.update_fields(existing, fields).await
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), StoreError> {
        self.inner.delete_by_id(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Instrumentation sink that keeps every call.
#[derive(Default)]
pub struct RecordingMetrics {
    pub latencies: Mutex<Vec<(String, String, f64)>>,
    pub counts: Mutex<Vec<(String, String, u16)>>,
}

impl RecordingMetrics {
    pub fn latency_keys(&self) -> Vec<(String, String)> {
        self.latencies
            .lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (m.clone(), p.clone()))
            .collect()
    }

    pub fn count_keys(&self) -> Vec<(String, String, u16)> {
        self.counts.lock().unwrap().clone()
    }
}

impl RequestMetrics for RecordingMetrics {
    fn observe_latency(&self, method: &str, path: &str, seconds: f64) {
        self.latencies
            .lock()
            .unwrap()
            .push((method.to_string(), path.to_string(), seconds));
    }

    fn increment_count(&self, method: &str, path: &str, status: u16) {
        self.counts
            .lock()
            .unwrap()
            .push((method.to_string(), path.to_string(), status));
    }
}
