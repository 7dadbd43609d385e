//! Error types for varsub
//!
//! Structured errors with context and actionable help messages. The
//! engine itself produces exactly one kind of failure (an invalid
//! variable reference); the remaining kinds belong to the loader.

use std::fmt;

/// Result type alias for varsub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for varsub operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// File the offending text came from, if known
    pub source_file: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A `$` sequence in the input could not be classified as a valid
    /// variable reference. Carries the entire original input and the
    /// malformed fragment.
    Interpolation { template: String, fragment: String },
    /// Environment file is not a flat mapping of scalar values
    EnvFile,
    /// Rendered text failed structural parsing
    Parse,
    /// I/O error (file not found, etc.)
    Io,
}

impl Error {
    /// Create an invalid interpolation error
    ///
    /// Resolution is atomic: the caller gets the full original input
    /// back along with the fragment that could not be classified.
    pub fn invalid_interpolation(
        template: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::Interpolation {
                template: template.into(),
                fragment: fragment.into(),
            },
            source_file: None,
            help: Some("Use $$ to include a literal dollar sign".into()),
            cause: None,
        }
    }

    /// Create an environment file error
    pub fn env_file(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::EnvFile,
            source_file: None,
            help: Some("The env file must be a flat mapping of variable names to scalar values".into()),
            cause: Some(message.into()),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            source_file: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            source_file: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Add file context to the error
    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message
        match &self.kind {
            ErrorKind::Interpolation { fragment, .. } => {
                write!(f, "Invalid variable reference: {}", fragment)?
            }
            ErrorKind::EnvFile => write!(f, "Invalid environment file")?,
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::Io => write!(f, "I/O error")?,
        }

        // File context
        if let Some(file) = &self.source_file {
            write!(f, "\n  File: {}", file)?;
        }

        // The full input that failed to resolve
        if let ErrorKind::Interpolation { template, .. } = &self.kind {
            write!(f, "\n  In: {}", template)?;
        }

        // Cause
        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        // Help
        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
