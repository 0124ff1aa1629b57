//! Backend error types.

use thiserror::Error;

/// Failure of the external route oracle.
///
/// Every variant is recoverable: the orchestrator answers it by searching
/// locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Oracle switched off by configuration
    #[error("route oracle disabled")]
    Disabled,

    /// HTTP client could not be constructed
    #[error("route oracle client error: {0}")]
    Client(String),

    /// Request exceeded the configured timeout
    #[error("route oracle request timed out")]
    Timeout,

    /// Connection could not be established
    #[error("route oracle connection failed: {0}")]
    Connection(String),

    /// Non-success HTTP status
    #[error("route oracle returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not a route
    #[error("invalid route oracle response: {0}")]
    InvalidResponse(String),

    /// Oracle reported an error of its own
    #[error("route oracle error: {0}")]
    Remote(String),
}

/// Errors that can occur during backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Link store failure
    #[error("link store error: {0}")]
    Store(#[from] jumpgate_core::CoreError),

    /// Data source failure other than the link store
    #[error("data source error: {0}")]
    DataSource(String),

    /// Route oracle failure
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Oracle failed and the local fallback failed as well
    #[error("local search failed after oracle failure ({oracle}): {local}")]
    FallbackFailed {
        oracle: OracleError,
        #[source]
        local: Box<BackendError>,
    },

    /// Authorization collaborator failure
    #[error("access check failed: {0}")]
    AccessCheck(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] jumpgate_config::ConfigError),

    /// Blocking task failed to complete
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl BackendError {
    /// Create a DataSource error.
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource(message.into())
    }

    /// Create an AccessCheck error.
    pub fn access_check(message: impl Into<String>) -> Self {
        Self::AccessCheck(message.into())
    }

    /// Create a FallbackFailed error.
    pub fn fallback_failed(oracle: OracleError, local: BackendError) -> Self {
        Self::FallbackFailed {
            oracle,
            local: Box::new(local),
        }
    }
}
