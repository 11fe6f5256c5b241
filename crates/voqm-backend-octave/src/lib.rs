//! voqm Octave backend
//!
//! Production implementation of the composite-measure engine seams from
//! `voqm-core`. Each [`OctaveSession`] owns one persistent GNU Octave
//! subprocess with its own scratch directory; [`OctaveFactory`] starts them
//! on demand for the orchestrator's shared or private acquisition modes.
//!
//! The composite script itself (`composite.m`) is supplied by the caller;
//! this crate only implements the calling convention: the script's function
//! receives the reference and degraded signals as N×1 column vectors plus
//! the sample rate, and must return exactly four values
//! (csig, cbak, covl, ssnr).

pub mod error;
pub mod session;

pub use error::{OctaveError, OctaveResult};
pub use session::{OctaveConfig, OctaveSession, DEFAULT_SHUTDOWN_GRACE_SECS};

use voqm_core::{EngineFactory, EngineSession, ExternalError, RawMeasures};

impl EngineSession for OctaveSession {
    fn submit(
        &mut self,
        reference: &[f64],
        degraded: &[f64],
        sample_rate: u32,
    ) -> Result<RawMeasures, ExternalError> {
        OctaveSession::submit(self, reference, degraded, sample_rate)
            .map_err(ExternalError::from_stage)
    }

    fn shutdown(&mut self) -> Result<(), ExternalError> {
        OctaveSession::shutdown(self).map_err(ExternalError::from_stage)
    }
}

/// Starts [`OctaveSession`]s from a fixed configuration.
#[derive(Debug, Clone)]
pub struct OctaveFactory {
    config: OctaveConfig,
}

impl OctaveFactory {
    /// Creates a factory for the given configuration.
    pub fn new(config: OctaveConfig) -> Self {
        Self { config }
    }

    /// The configuration sessions are started with.
    pub fn config(&self) -> &OctaveConfig {
        &self.config
    }
}

impl EngineFactory for OctaveFactory {
    type Session = OctaveSession;

    fn create(&self) -> Result<OctaveSession, ExternalError> {
        OctaveSession::start(&self.config).map_err(ExternalError::from_stage)
    }
}
