//! Shared error type across metricfwd crates.

use thiserror::Error;

/// Stable error codes (used in logs and asserted by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Key has no aggregable value right now.
    NotFoundMetrics,
    /// Subscription requested for a key that was never registered.
    UnknownMetric,
    /// Forwarder built without a registry.
    InvalidSource,
    /// A periodic stream is already running on this forwarder.
    StreamRunning,
    /// Destination refused further writes.
    SinkClosed,
    /// Transport / io failure.
    Io,
    /// Malformed or out-of-range configuration.
    BadConfig,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFoundMetrics => "NOT_FOUND_METRICS",
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::InvalidSource => "INVALID_SOURCE",
            ErrorCode::StreamRunning => "STREAM_RUNNING",
            ErrorCode::SinkClosed => "SINK_CLOSED",
            ErrorCode::Io => "IO",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("not found metrics")]
    NotFoundMetrics,
    #[error("unknown metric key: {0}")]
    UnknownMetric(String),
    #[error("invalid collector source")]
    InvalidSource,
    #[error("periodic stream already running")]
    StreamRunning,
    #[error("sink closed")]
    SinkClosed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricsError::NotFoundMetrics => ErrorCode::NotFoundMetrics,
            MetricsError::UnknownMetric(_) => ErrorCode::UnknownMetric,
            MetricsError::InvalidSource => ErrorCode::InvalidSource,
            MetricsError::StreamRunning => ErrorCode::StreamRunning,
            MetricsError::SinkClosed => ErrorCode::SinkClosed,
            MetricsError::Io(_) => ErrorCode::Io,
            MetricsError::BadConfig(_) => ErrorCode::BadConfig,
            MetricsError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MetricsError::Internal(_) => ErrorCode::Internal,
        }
    }
}
