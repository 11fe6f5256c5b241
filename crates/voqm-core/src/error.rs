//! Error types for metric computation.

use thiserror::Error;

/// Result type for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Which of the two input signals an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalRole {
    /// The clean reference signal.
    Reference,
    /// The degraded signal under evaluation.
    Degraded,
}

impl std::fmt::Display for SignalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalRole::Reference => write!(f, "reference"),
            SignalRole::Degraded => write!(f, "degraded"),
        }
    }
}

/// Input-contract violations, detected before any external process is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// A signal has more than one channel.
    #[error("{role} signal must be mono, got {channels} channel(s)")]
    NotMono {
        /// Which signal violated the contract.
        role: SignalRole,
        /// The offending channel count.
        channels: u16,
    },

    /// A sample rate outside the supported set.
    #[error("unsupported sample rate {rate} Hz (supported: 8000, 16000)")]
    UnsupportedSampleRate {
        /// The offending sample rate.
        rate: u32,
    },

    /// Reference and degraded signals carry different sample rates.
    #[error("sample rate mismatch: reference {reference} Hz, degraded {degraded} Hz")]
    SampleRateMismatch {
        /// Reference sample rate.
        reference: u32,
        /// Degraded sample rate.
        degraded: u32,
    },
}

/// Common trait for errors raised by the external scoring stages.
///
/// Backend crates implement this on their own error enums so failures can
/// cross the crate boundary as an [`ExternalError`] without the core crate
/// depending on any backend.
pub trait StageError: std::error::Error {
    /// Stable error code for reporting (e.g. "OCTAVE_003").
    fn code(&self) -> &'static str;

    /// The pipeline stage that failed ("pesq" or "engine").
    fn stage(&self) -> &'static str;

    /// Human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }
}

/// Type-erased carrier for a backend failure.
///
/// Captures the code, stage, and message from any [`StageError`] implementor
/// while keeping the original error reachable through `source()`.
#[derive(Debug)]
pub struct ExternalError {
    /// Stable error code (e.g. "PESQ_004").
    pub code: &'static str,
    /// The pipeline stage that failed.
    pub stage: &'static str,
    /// Human-readable error message.
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExternalError {
    /// Wraps a backend error.
    pub fn from_stage<E: StageError + Send + Sync + 'static>(err: E) -> Self {
        Self {
            code: err.code(),
            stage: err.stage(),
            message: err.message(),
            source: Some(Box::new(err)),
        }
    }

    /// Creates an error with explicit values and no underlying source.
    pub fn new(code: &'static str, stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            stage,
            message: message.into(),
            source: None,
        }
    }
}

impl std::fmt::Display for ExternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ExternalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Top-level error type for metric computation.
///
/// Every variant is fatal to the current call: there is no retry and no
/// fallback value. The only local handling anywhere in the pipeline is the
/// guaranteed release of private engine sessions on failure.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Signal shape or sample-rate contract violated.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The external PESQ function failed.
    #[error("PESQ scoring stage failed: {0}")]
    Scoring(ExternalError),

    /// The external composite-measure engine failed.
    #[error("composite engine stage failed: {0}")]
    Engine(ExternalError),
}
