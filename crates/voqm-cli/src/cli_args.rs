//! CLI argument definitions for the voqm command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined
//! here, keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// voqm - objective speech-quality scoring
#[derive(Parser)]
#[command(name = "voqm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Score a degraded WAV against a clean reference with PESQ (MOS-LQO)
    Pesq {
        /// Path to the clean reference WAV
        #[arg(short, long)]
        reference: PathBuf,

        /// Path to the degraded WAV
        #[arg(short, long)]
        degraded: PathBuf,

        /// PESQ tool executable (default: $PESQ_BIN, then PATH)
        #[arg(long)]
        pesq_bin: Option<PathBuf>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Compute the composite measures (pesq, csig, cbak, covl, ssnr)
    Composite {
        /// Path to the clean reference WAV
        #[arg(short, long)]
        reference: PathBuf,

        /// Path to the degraded WAV
        #[arg(short, long)]
        degraded: PathBuf,

        /// Path to the composite .m script
        /// (default: $VOQM_COMPOSITE_SCRIPT; required one way or the other)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Octave executable (default: $VOQM_OCTAVE_PATH, then PATH)
        #[arg(long)]
        octave: Option<PathBuf>,

        /// PESQ tool executable (default: $PESQ_BIN, then PATH)
        #[arg(long)]
        pesq_bin: Option<PathBuf>,

        /// Run the evaluation in a private, single-use Octave session
        /// (required when invoking voqm from parallel worker processes)
        #[arg(long)]
        isolated: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}
