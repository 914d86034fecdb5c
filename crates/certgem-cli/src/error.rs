//! Error types for the CLI

use certgem_e2e::SuiteError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Suite library error
    #[error("{0}")]
    Suite(#[from] SuiteError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// The binary was built without a cargo feature the command needs
    #[error("`{command}` needs the `{feature}` feature; rebuild with --features {feature}")]
    FeatureDisabled {
        /// Command that was requested
        command: String,
        /// Missing cargo feature
        feature: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a feature-disabled error
    #[must_use]
    pub fn feature_disabled(command: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::FeatureDisabled {
            command: command.into(),
            feature: feature.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod constructor_tests {
        use super::*;

        #[test]
        fn test_config_error() {
            let err = CliError::config("bad yaml");
            assert!(matches!(err, CliError::Config { .. }));
            assert_eq!(err.to_string(), "Configuration error: bad yaml");
        }

        #[test]
        fn test_invalid_argument_error() {
            let err = CliError::invalid_argument("--title is empty");
            assert!(err.to_string().contains("--title is empty"));
        }

        #[test]
        fn test_feature_disabled_mentions_feature() {
            let err = CliError::feature_disabled("setup", "browser");
            let msg = err.to_string();
            assert!(msg.contains("setup"));
            assert!(msg.contains("--features browser"));
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_from_suite_error_keeps_message() {
            let err: CliError = SuiteError::config("workers must be at least 1").into();
            assert!(matches!(err, CliError::Suite(_)));
            assert!(err.to_string().contains("workers must be at least 1"));
        }

        #[test]
        fn test_from_io_error() {
            let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
            let err: CliError = io.into();
            assert!(err.to_string().starts_with("I/O error"));
        }
    }
}
