//! Error types for the PESQ tool backend.

use std::path::PathBuf;

use thiserror::Error;
use voqm_core::StageError;

/// Result type for PESQ backend operations.
pub type PesqToolResult<T> = Result<T, PesqToolError>;

/// Errors that can occur while invoking the P.862 reference tool.
#[derive(Debug, Error)]
pub enum PesqToolError {
    /// PESQ executable not found.
    #[error("PESQ executable not found. Ensure the ITU-T P.862 reference tool is in PATH, or set the PESQ_BIN environment variable")]
    ToolNotFound,

    /// An explicitly configured tool path does not exist.
    #[error("configured PESQ executable not found at: {path}")]
    ConfiguredToolMissing { path: PathBuf },

    /// Failed to stage a signal as a WAV file.
    #[error("failed to stage signal as WAV: {0}")]
    StageWav(#[source] hound::Error),

    /// Failed to spawn the PESQ process.
    #[error("failed to spawn PESQ process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// PESQ process exited with non-zero status.
    #[error("PESQ process exited with status {exit_code}: {output}")]
    ProcessFailed { exit_code: i32, output: String },

    /// PESQ process produced no parseable MOS-LQO prediction.
    #[error("no MOS-LQO prediction found in PESQ output: {output}")]
    MalformedOutput { output: String },

    /// IO error during scratch-file staging.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError for PesqToolError {
    fn code(&self) -> &'static str {
        match self {
            PesqToolError::ToolNotFound => "PESQ_001",
            PesqToolError::ConfiguredToolMissing { .. } => "PESQ_007",
            PesqToolError::StageWav(_) => "PESQ_002",
            PesqToolError::SpawnFailed(_) => "PESQ_003",
            PesqToolError::ProcessFailed { .. } => "PESQ_004",
            PesqToolError::MalformedOutput { .. } => "PESQ_005",
            PesqToolError::Io(_) => "PESQ_006",
        }
    }

    fn stage(&self) -> &'static str {
        "pesq"
    }
}
