//! User Service Library
//!
//! CRUD over a single `User` resource with per-request Prometheus
//! instrumentation.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod store;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
