//! Structured file system errors for manifest and configuration loading
//!
//! Context is captured at the operation site (what was being done, to which file,
//! and why) rather than recovered later by parsing I/O error messages.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The kind of file system operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Canonicalize,
    Walk,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Canonicalize => write!(f, "resolving path"),
            FileOperation::Walk => write!(f, "scanning directory"),
        }
    }
}

/// A failed file operation together with the context it happened in.
#[derive(Error, Debug)]
#[error("File operation failed: {operation} {}", file_path.display())]
pub struct FileOperationError {
    pub operation: FileOperation,
    pub file_path: PathBuf,
    /// What the file was needed for (e.g. "loading stack manifest")
    pub purpose: String,
    #[source]
    pub source: std::io::Error,
}

impl Clone for FileOperationError {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation,
            file_path: self.file_path.clone(),
            purpose: self.purpose.clone(),
            source: std::io::Error::new(self.source.kind(), self.source.to_string()),
        }
    }
}

impl FileOperationError {
    pub fn new(
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self {
            operation,
            file_path: file_path.into(),
            purpose: purpose.into(),
            source,
        }
    }

    /// Multi-line message suitable for CLI output.
    pub fn user_message(&self) -> String {
        let mut message = format!(
            "Failed {} '{}' while {}",
            self.operation,
            self.file_path.display(),
            self.purpose
        );

        match self.source.kind() {
            std::io::ErrorKind::NotFound => {
                message.push_str("\n\nThe file does not exist at the specified path.");
                if is_manifest(&self.file_path) {
                    message.push_str("\nImports are resolved relative to the stacks base path.");
                }
            }
            std::io::ErrorKind::PermissionDenied => {
                message.push_str(&format!(
                    "\n\nPermission denied. Check file/directory permissions for: {}",
                    self.file_path.display()
                ));
            }
            std::io::ErrorKind::InvalidData => {
                message.push_str("\n\nThe file contains invalid data. Ensure it is valid UTF-8 text.");
            }
            _ => {
                message.push_str(&format!("\n\nError details: {}", self.source));
            }
        }

        message
    }
}

fn is_manifest(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("yaml" | "yml"))
}

/// Attach [`FileOperationError`] context to I/O results.
pub trait FileResultExt<T> {
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
    ) -> Result<T, FileOperationError>;
}

impl<T> FileResultExt<T> for Result<T, std::io::Error> {
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
    ) -> Result<T, FileOperationError> {
        self.map_err(|io_error| FileOperationError::new(operation, file_path, purpose, io_error))
    }
}
