//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Require a DSN when the PostgreSQL driver is selected
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{DatabaseDriver, ServiceConfig};

/// Paths served by the resource routes.
const RESERVED_PATHS: [&str; 2] = ["/health", "/user"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every issue found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ValidationIssue::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.database.driver == DatabaseDriver::Postgres && config.database.dsn.trim().is_empty() {
        issues.push(ValidationIssue::new(
            "database.dsn",
            "required for the postgres driver (set DB_DSN)",
        ));
    }
    if config.database.max_connections == 0 {
        issues.push(ValidationIssue::new("database.max_connections", "must be > 0"));
    }
    if config.database.connect_timeout_secs == 0 {
        issues.push(ValidationIssue::new("database.connect_timeout_secs", "must be > 0"));
    }

    if config.timeouts.request_secs == 0 {
        issues.push(ValidationIssue::new("timeouts.request_secs", "must be > 0"));
    }

    let observability = &config.observability;
    let metrics_path = observability.metrics_path.as_str();
    if !metrics_path.starts_with('/') {
        issues.push(ValidationIssue::new(
            "observability.metrics_path",
            "must start with '/'",
        ));
    } else if RESERVED_PATHS
        .iter()
        .any(|p| metrics_path == *p || metrics_path.starts_with(&format!("{p}/")))
    {
        issues.push(ValidationIssue::new(
            "observability.metrics_path",
            format!("'{metrics_path}' collides with a user route"),
        ));
    } else if metrics_path.contains(['{', '}'])
        || metrics_path
            .split('/')
            .any(|segment| segment.starts_with([':', '*']))
    {
        issues.push(ValidationIssue::new(
            "observability.metrics_path",
            "must be a literal path without route parameters",
        ));
    }
    let buckets = &observability.latency_buckets;
    if buckets.is_empty() {
        issues.push(ValidationIssue::new("observability.latency_buckets", "must not be empty"));
    } else if buckets.windows(2).any(|w| w[0] >= w[1]) || buckets[0] <= 0.0 {
        issues.push(ValidationIssue::new(
            "observability.latency_buckets",
            "must be positive and strictly increasing",
        ));
    }

    if config.security.max_body_size == 0 {
        issues.push(ValidationIssue::new("security.max_body_size", "must be > 0"));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
