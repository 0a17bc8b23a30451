use thiserror::Error;

/// Main error type for the headroom application
#[derive(Error, Debug)]
pub enum HeadroomError {
    /// Kubernetes API errors
    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] KubernetesError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed resource quantities
    #[error("Quantity error: {0}")]
    Quantity(#[from] QuantityError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kubernetes-specific errors
#[derive(Error, Debug)]
pub enum KubernetesError {
    /// API server connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Object could not be interpreted
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// API error
    #[error("API error: {0}")]
    ApiError(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Configuration file error
    #[error("File error: {0}")]
    FileError(String),
}

/// Errors raised while reading a Kubernetes resource quantity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),

    #[error("unknown suffix in quantity '{0}'")]
    UnknownSuffix(String),

    #[error("quantity '{0}' does not fit in 64 bits")]
    Overflow(String),
}

/// Errors raised while reading a human-readable byte size
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ByteSizeError {
    #[error("invalid number in size '{0}'")]
    InvalidNumber(String),

    #[error("unhandled size name: {0}")]
    UnknownUnit(String),

    #[error("too large: {0}")]
    TooLarge(String),
}

/// Helper type alias for Results
pub type Result<T> = std::result::Result<T, HeadroomError>;
