//! Error types for the Octave engine backend.

use std::path::PathBuf;
use thiserror::Error;
use voqm_core::StageError;

/// Result type for Octave backend operations.
pub type OctaveResult<T> = Result<T, OctaveError>;

/// Errors that can occur while driving the Octave subprocess.
#[derive(Debug, Error)]
pub enum OctaveError {
    /// Octave executable not found.
    #[error("Octave executable not found. Ensure GNU Octave is installed and in PATH, or set the VOQM_OCTAVE_PATH environment variable")]
    OctaveNotFound,

    /// An explicitly configured Octave path does not exist.
    #[error("configured Octave executable not found at: {path}")]
    ConfiguredOctaveMissing { path: PathBuf },

    /// The composite-measure script does not exist.
    #[error("composite script not found at: {path}")]
    ScriptNotFound { path: PathBuf },

    /// The composite-measure script path has no usable function name.
    #[error("composite script path has no valid .m function name: {path}")]
    InvalidScriptPath { path: PathBuf },

    /// Failed to spawn the Octave process.
    #[error("failed to spawn Octave process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// The session's Octave process is no longer accepting work.
    #[error("Octave session is closed (process exited or pipes unavailable)")]
    SessionClosed,

    /// The script raised an error inside the interpreter.
    #[error("Octave evaluation failed: {message}")]
    EvalFailed { message: String },

    /// The script produced the wrong number of output values.
    #[error("malformed engine output: expected {expected} values, found {found}")]
    MalformedOutput { expected: usize, found: usize },

    /// Failed to terminate the Octave process.
    #[error("failed to shut down Octave process: {0}")]
    ShutdownFailed(#[source] std::io::Error),

    /// IO error during scratch-file staging.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError for OctaveError {
    fn code(&self) -> &'static str {
        match self {
            OctaveError::OctaveNotFound => "OCTAVE_001",
            OctaveError::ConfiguredOctaveMissing { .. } => "OCTAVE_010",
            OctaveError::ScriptNotFound { .. } => "OCTAVE_002",
            OctaveError::InvalidScriptPath { .. } => "OCTAVE_003",
            OctaveError::SpawnFailed(_) => "OCTAVE_004",
            OctaveError::SessionClosed => "OCTAVE_005",
            OctaveError::EvalFailed { .. } => "OCTAVE_006",
            OctaveError::MalformedOutput { .. } => "OCTAVE_007",
            OctaveError::ShutdownFailed(_) => "OCTAVE_008",
            OctaveError::Io(_) => "OCTAVE_009",
        }
    }

    fn stage(&self) -> &'static str {
        "engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OctaveError::OctaveNotFound;
        assert!(err.to_string().contains("Octave executable not found"));

        let err = OctaveError::EvalFailed {
            message: "undefined function 'composite'".into(),
        };
        assert!(err.to_string().contains("undefined function"));

        let err = OctaveError::MalformedOutput {
            expected: 4,
            found: 2,
        };
        assert!(err.to_string().contains("expected 4 values, found 2"));
    }

    #[test]
    fn stage_and_codes_are_stable() {
        assert_eq!(OctaveError::OctaveNotFound.code(), "OCTAVE_001");
        assert_eq!(OctaveError::SessionClosed.code(), "OCTAVE_005");
        assert_eq!(OctaveError::OctaveNotFound.stage(), "engine");
    }
}
