//! Trait seams for the external composite-measure engine.

use crate::error::ExternalError;

/// The four raw sub-measures produced by one engine evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMeasures {
    /// Signal-distortion estimate.
    pub csig: f64,
    /// Background-distortion estimate.
    pub cbak: f64,
    /// Overall-quality estimate.
    pub covl: f64,
    /// Segmental SNR in dB.
    pub ssnr: f64,
}

/// One live connection to the external numerical engine.
///
/// A session is stateful and must never serve two concurrent computations.
/// Shutdown is idempotent at the trait level; implementations also release
/// their resources on drop so a session cannot leak past its owner.
pub trait EngineSession {
    /// Submits one (reference, degraded, sample rate) evaluation.
    fn submit(
        &mut self,
        reference: &[f64],
        degraded: &[f64],
        sample_rate: u32,
    ) -> Result<RawMeasures, ExternalError>;

    /// Tears the session down, terminating the engine process.
    fn shutdown(&mut self) -> Result<(), ExternalError>;
}

/// Describes how to start engine sessions.
///
/// The orchestrator decides the acquisition discipline (one shared session
/// reused across calls, or a fresh private session per call); the factory
/// only knows how to start one.
pub trait EngineFactory {
    /// The session type this factory produces.
    type Session: EngineSession;

    /// Starts a new session. Expensive: spawns the engine process and
    /// allocates its scratch directory.
    fn create(&self) -> Result<Self::Session, ExternalError>;
}
