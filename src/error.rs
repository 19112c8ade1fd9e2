//! Error types for the screenshot pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while taking a screenshot
#[derive(Error, Debug)]
pub enum Error {
    /// The browser session could not be started or was lost
    #[error("Session initialization failed: {0}")]
    InitializationError(String),

    /// Failed to navigate to a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to query the page layout metrics
    #[error("Layout metrics query failed: {0}")]
    MetricsError(String),

    /// Failed to apply a device or viewport emulation
    #[error("Emulation failed: {0}")]
    EmulationError(String),

    /// Failed to capture the screenshot
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The lifecycle event was not observed in time
    #[error("Timed out after {ms}ms waiting for lifecycle event '{event}'")]
    Timeout { event: String, ms: u128 },

    /// The run was cancelled before the operation completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),
}

impl Error {
    /// True when the error comes from the wait deadline elapsing
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// True when the error comes from cancellation of the run
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_event() {
        let err = Error::Timeout { event: "networkIdle".into(), ms: 60000 };
        assert_eq!(
            err.to_string(),
            "Timed out after 60000ms waiting for lifecycle event 'networkIdle'"
        );
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
