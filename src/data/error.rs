use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Per-stage errors
// ---------------------------------------------------------------------------

/// Why a trace base name could not be turned into a [`TraceKey`](super::key::TraceKey).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("expected 5 '_'-separated fields, found {found}")]
    FieldCount { found: usize },
    #[error("field '{field}' is not an integer: '{token}'")]
    InvalidNumericField { field: &'static str, token: String },
}

/// Out-of-range statistics window. Bounds are never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window start {start} is negative")]
    NegativeStart { start: i64 },
    #[error("window end {end} exceeds sample count {len}")]
    EndOutOfRange { end: i64, len: usize },
    #[error("window [{start}, {end}) is empty")]
    Empty { start: i64, end: i64 },
}

/// Metadata that cannot describe an x-axis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AxisError {
    #[error("numpnts must be positive, got {0}")]
    NonPositivePoints(i64),
    #[error("axis parameters are not finite (x_0 = {x_0}, delta_x = {delta_x})")]
    NonFinite { x_0: f64, delta_x: f64 },
    #[error("cannot allocate an axis of {0} points")]
    TooManyPoints(i64),
}

// ---------------------------------------------------------------------------
// TraceError – everything that can abort a batch
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("no matching files found for {}", .patterns.join(" "))]
    NoMatch { patterns: Vec<String> },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot parse trace name '{identifier}': {source}")]
    Parse {
        identifier: String,
        #[source]
        source: KeyError,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metadata in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported sample file {}: {reason}", .path.display())]
    SampleFormat { path: PathBuf, reason: String },

    #[error("invalid metadata for '{identifier}': {reason}")]
    InvalidMetadata { identifier: String, reason: String },

    #[error("'{identifier}': {source}")]
    Index {
        identifier: String,
        #[source]
        source: WindowError,
    },
}

impl TraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sample_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TraceError::SampleFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = TraceError> = std::result::Result<T, E>;
