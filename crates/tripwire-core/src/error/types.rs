//! Core error types for Tripwire

use thiserror::Error;

/// Result type alias for Tripwire operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Main error type for Tripwire
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError {
    /// Configuration values are missing or out of range
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Reading a settings file failed
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// A settings file or value could not be parsed
    #[error("Parse error ({format}): {message}")]
    Parse { format: String, message: String },
}

impl ResilienceError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an IO error tied to a path
    pub fn io(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a parse error for the given format
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code for the error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "RESILIENCE_CONFIG",
            Self::Io { .. } => "RESILIENCE_IO",
            Self::Parse { .. } => "RESILIENCE_PARSE",
        }
    }

    /// Additional context attached to the error, if any
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::Io { path, .. } => path.as_deref(),
            Self::Parse { .. } => None,
        }
    }
}

impl From<std::io::Error> for ResilienceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            path: None,
        }
    }
}
