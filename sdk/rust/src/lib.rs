//! Typed HTTP client for the user service.

pub mod client;

pub use client::{ApiErrorBody, ClientError, NewUser, User, UserClient};
