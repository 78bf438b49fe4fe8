//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → middleware/metrics.rs (start timer)
//!     → handlers.rs (validate → store → map result)
//!     → error.rs (failure → {"code", "message"})
//!     → middleware/metrics.rs (record latency and status)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::{ApiError, ErrorBody, ErrorCode};
pub use server::{AppState, HttpServer};
