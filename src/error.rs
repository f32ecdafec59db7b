//! Error types and handling for the contextual learning aggregator

use thiserror::Error;

/// Main error type for the `learncontext` crate
#[derive(Error, Debug)]
pub enum ContextError {
    /// A single provider call failed. Never surfaced past the coordinator,
    /// which substitutes the provider's default instead.
    #[error("{provider} provider unavailable: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// The caller cancelled before the required foreground fetches settled
    #[error("Operation cancelled before foreground data was ready")]
    Cancelled,

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP transport errors from provider adapters
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
}

impl ContextError {
    /// Create a new provider error
    pub fn provider<S: Into<String>>(provider: &'static str, message: S) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ContextError::Cancelled)
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ContextError::Provider { provider, .. } => {
                format!("The {provider} service is unavailable. Showing offline data.")
            }
            ContextError::Cancelled => "Loading was cancelled before any data arrived.".to_string(),
            ContextError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            ContextError::Http { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let provider_err = ContextError::provider("news", "missing API key");
        assert!(matches!(
            provider_err,
            ContextError::Provider {
                provider: "news",
                ..
            }
        ));

        let config_err = ContextError::config("bad ttl");
        assert!(matches!(config_err, ContextError::Config { .. }));

        assert!(ContextError::Cancelled.is_cancelled());
        assert!(!config_err.is_cancelled());
    }

    #[test]
    fn test_user_messages() {
        let provider_err = ContextError::provider("weather", "timeout");
        assert!(provider_err.user_message().contains("weather"));
        assert!(provider_err.to_string().contains("timeout"));

        let config_err = ContextError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        assert!(ContextError::Cancelled.user_message().contains("cancelled"));
    }
}
