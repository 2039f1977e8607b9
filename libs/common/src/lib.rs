//! Alarm clock basic library
//!
//! Provides basic functions shared by the service crates, including:
//! - logging functions and the HTTP access-log middleware
//! - SQLite client
//! - unified API error/response types
//! - shutdown signal handling and command-line arguments

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod api_types;
pub mod logging;
pub mod serde_helpers;
pub mod shutdown;

#[cfg(feature = "cli")]
pub mod bootstrap_args;

// Re-export commonly used API types
pub use api_types::{ErrorInfo, ErrorResponse, MessageResponse};

// Re-export AppError when axum feature is enabled
#[cfg(feature = "axum")]
pub use api_types::AppError;

// Re-export common dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;

/// Default API host for all services
pub const DEFAULT_API_HOST: &str = "0.0.0.0";
