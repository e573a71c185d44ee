//! Error handling for the stack resolution engine
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can branch on the failure kind
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`StackError`] - one variant per failure kind the engine can report
//! - [`ErrorContext`] - wrapper that adds suggestions and details for display
//!
//! # Error Categories
//!
//! - **Input**: [`StackError::Validation`] for missing stack/component/type arguments
//! - **Shape**: [`StackError::Structure`] when a section is missing or has the wrong type
//! - **Lookup**: [`StackError::NotFound`] and [`StackError::DuplicateStack`]
//! - **Loading**: [`StackError::ImportResolution`], [`StackError::Merge`], [`StackError::File`]
//! - **Setup**: [`StackError::Config`] and [`StackError::Pattern`]
//!
//! Only [`StackError::DuplicateStack`] is always fatal: an ambiguous stack identity
//! cannot be guessed. Every other kind is reported to the caller, which may offer
//! fixes, but nothing is retried since the engine performs no network or process I/O.
//!
//! # Examples
//!
//! ```rust,no_run
//! use stack_resolver::core::{StackError, user_friendly_error};
//!
//! let error = StackError::validation("stack must be provided and must not be empty");
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::file_error::FileOperationError;

/// The main error type for stack resolution.
///
/// Messages are multi-line where the original diagnostic needs it: the not-found and
/// duplicate cases name the component, the stack token, the name pattern, and the
/// files involved so a misconfigured manifest can be located without a debugger.
#[derive(Error, Debug, Clone)]
pub enum StackError {
    /// A required input (stack, component, component type) was empty or invalid.
    #[error("{message}")]
    Validation {
        /// Description of the invalid input
        message: String,
    },

    /// An expected section is missing or has the wrong shape.
    ///
    /// Raised for a component without `vars`, for sections that are not mappings,
    /// and for inheritance cycles between components.
    #[error("{message}")]
    Structure {
        /// Description naming the section, component and stack file
        message: String,
    },

    /// A stack, section or component could not be found.
    ///
    /// The message is level-specific (`stack`, `components`, `components/<type>`,
    /// component) because it is the primary diagnostic for broken manifests.
    #[error("{message}")]
    NotFound {
        /// Level-specific description of what is missing
        message: String,
        /// Close matches that the user may have meant
        suggestions: Vec<String>,
    },

    /// A stack token matched more than one manifest.
    #[error(
        "Found duplicate config for the component '{component}' for the stack '{stack}' in the files: {}.\n\
         Check that all context variables in the stack name pattern '{name_pattern}' are correctly defined in the files and not duplicated.\n\
         Check that all imports are valid.",
        files.join(", ")
    )]
    DuplicateStack {
        /// The requested component
        component: String,
        /// The stack token supplied by the user
        stack: String,
        /// The stack name pattern used for matching
        name_pattern: String,
        /// Every stack file that rendered to the token
        files: Vec<String>,
    },

    /// An `import:` entry could not be resolved.
    #[error("Failed to resolve import '{import}' in the stack manifest '{importer}': {reason}")]
    ImportResolution {
        /// The import specifier as written in the manifest
        import: String,
        /// The manifest containing the import
        importer: String,
        /// Why resolution failed (missing file, cycle, bad glob)
        reason: String,
    },

    /// A manifest could not be parsed into a mergeable document.
    #[error("Invalid YAML in the stack manifest '{file}': {reason}")]
    Merge {
        /// Path of the manifest that failed to parse
        file: String,
        /// Parser error or shape problem
        reason: String,
    },

    /// Engine configuration is invalid or could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// A glob pattern in the configuration or an import is invalid.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    Pattern {
        /// The offending pattern
        pattern: String,
        /// Reason reported by the glob parser
        reason: String,
    },

    /// A file system operation failed.
    #[error(transparent)]
    File(#[from] FileOperationError),
}

impl StackError {
    /// Build a [`StackError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a [`StackError::Structure`] error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure {
            message: message.into(),
        }
    }

    /// Build a [`StackError::NotFound`] error without suggestions.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    /// Build a [`StackError::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Attach "did you mean" suggestions to a [`StackError::NotFound`] error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_suggestions(self, suggestions: Vec<String>) -> Self {
        match self {
            Self::NotFound {
                message,
                ..
            } => Self::NotFound {
                message,
                suggestions,
            },
            other => other,
        }
    }

    /// Whether callers must treat this error as fatal rather than recoverable.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicateStack { .. })
    }
}

/// Error wrapper with user-facing suggestion and details.
///
/// ```rust,no_run
/// use stack_resolver::core::{ErrorContext, StackError};
///
/// let context = ErrorContext::new(StackError::config("stacks.name_pattern is empty"))
///     .with_suggestion("Set stacks.name_pattern, for example '{tenant}-{environment}-{stage}'");
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying engine error
    pub error: StackError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: StackError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// [`StackError`] values get a tailored suggestion per variant; I/O and YAML errors
/// get generic guidance; anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(stack_error) = error.downcast_ref::<StackError>() {
        return create_error_context(stack_error.clone());
    }

    if let Some(file_error) = error.downcast_ref::<FileOperationError>() {
        return ErrorContext::new(StackError::config(file_error.user_message()))
            .with_suggestion("Check that the path exists and is readable");
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(StackError::Merge {
            file: "unknown".to_string(),
            reason: yaml_error.to_string(),
        })
        .with_suggestion("Check the YAML syntax: indentation, quoting and list markers");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(StackError::config(message))
}

fn create_error_context(error: StackError) -> ErrorContext {
    match &error {
        StackError::Validation { message } => {
            let suggestion = if message.contains("abstract") {
                "Abstract components are templates; deploy a component that inherits from it"
            } else {
                "Provide the component as an argument and the stack with -s/--stack"
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        StackError::Structure { message } => {
            let suggestion = if message.contains("'vars'") {
                "Add a 'vars' section to the component, or define global 'vars' in an imported manifest"
            } else if message.contains("inheritance") {
                "Remove the circular reference from 'component' or 'metadata.inherits'"
            } else {
                "Check the indentation and types of the stack manifest sections"
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        StackError::NotFound { suggestions, .. } => {
            let context = if suggestions.is_empty() {
                ErrorContext::new(error.clone())
            } else {
                ErrorContext::new(error.clone())
                    .with_suggestion(format!("Did you mean: {}?", suggestions.join(", ")))
            };
            context.with_details("Components are looked up under 'components.<type>.<name>' in the merged stack")
        }

        StackError::DuplicateStack { .. } => ErrorContext::new(error)
            .with_details("A stack token must render to exactly one stack manifest; the identity is ambiguous"),

        StackError::ImportResolution { reason, .. } => {
            let suggestion = if reason.contains("Circular") {
                "Break the import cycle; manifests cannot import themselves directly or indirectly"
            } else {
                "Check the import path relative to the stacks base path, or enable ignore_missing_files"
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        StackError::Merge { file, .. } => {
            let file = file.clone();
            ErrorContext::new(error).with_suggestion(format!(
                "Check the YAML syntax in {file}. The document root must be a mapping"
            ))
        }

        StackError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Check base_path, stacks.base_path, stacks.included_paths, stacks.excluded_paths and stacks.name_pattern"),

        StackError::Pattern { .. } => ErrorContext::new(error)
            .with_suggestion("Use glob syntax such as 'orgs/**/*' or 'catalog/*.yaml'"),

        StackError::File(_) => ErrorContext::new(error)
            .with_suggestion("Check that the path exists and is readable"),
    }
}
