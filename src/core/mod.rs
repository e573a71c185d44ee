//! Core error types shared by every engine module.
//!
//! - [`StackError`] is returned by all engine operations
//! - [`ErrorContext`] and [`user_friendly_error`] turn errors into CLI output
//! - [`file_error`] carries structured context for failed file operations
//! - [`suggest`] finds close names for "did you mean" hints

pub mod error;
pub mod file_error;
pub mod suggest;

pub use error::{ErrorContext, StackError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationError, FileResultExt};

/// Result alias used throughout the engine.
pub type Result<T, E = StackError> = std::result::Result<T, E>;
