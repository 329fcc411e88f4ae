//! Shared error types and cooperative-cancellation primitives.

pub mod cancellation;
pub mod error;
pub mod error_context;

pub use cancellation::CancellationToken;
pub use error::GitVendorError;
pub use error_context::{ErrorContext, user_friendly_error};

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, GitVendorError>;
