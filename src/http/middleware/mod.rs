//! Axum middleware.

pub mod metrics;
pub mod timeout;

pub use self::metrics::{track_metrics, InstrumentationState};
pub use self::timeout::code_timeouts;
