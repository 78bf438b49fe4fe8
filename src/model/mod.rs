//! Domain model for the user resource.
//!
//! # Data Flow
//! ```text
//! request body (bytes)
//!     → input.rs (presence checks) → UserInput
//!     → store (persist) → User { meta: RecordMeta, .. }
//!     → serialized back to the client
//! ```
//!
//! # Design Decisions
//! - Record metadata is embedded by composition, never inherited
//! - The store owns every field of `RecordMeta`; handlers only read it

pub mod input;
pub mod user;

pub use input::{UserInput, ValidationError};
pub use user::{RecordMeta, User, UserId};
