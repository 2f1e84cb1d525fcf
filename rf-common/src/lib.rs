//! # Redis Factory Common
//!
//! Purpose: Parse Redis connection strings into typed descriptors and manage
//! their defaults, overrides, merges and validation.
//!
//! ## Design Principles
//! 1. **Typed Topologies**: Standalone, sentinel and cluster descriptors
//!    carry only their own fields.
//! 2. **Stable Errors**: Every rejection is a `ConfigError` variant with a
//!    fixed message.
//! 3. **No I/O**: Nothing in this crate touches a socket.

pub mod config;
pub mod error;
pub mod types;
pub mod uri;

// Re-export for convenience
pub use config::*;
pub use error::*;
pub use types::*;
pub use uri::*;
