//! voqm — objective speech-quality metrics
//!
//! Compares a degraded speech signal against a clean reference and produces
//! a PESQ MOS-LQO estimate plus the Hu & Loizou (2006) composite measures
//! (csig, cbak, covl, ssnr).
//!
//! This crate is the wired-up surface: `voqm-core`'s orchestrator combined
//! with the production backends (the ITU-T P.862 reference tool for PESQ,
//! a GNU Octave subprocess for the composite script). The module-level
//! [`pesq_mos`] and [`composite`] functions use one process-wide service
//! configured from the environment; [`MetricsConfig`] builds standalone
//! services for explicit configuration.
//!
//! # Session discipline
//!
//! The process-wide service keeps one shared Octave session alive across
//! calls, because starting the interpreter is expensive. That session is for
//! sequential use. Worker processes running in parallel must pass
//! `multiprocess = true` so every call owns a private, short-lived session;
//! the shared session is never safe to reach from multiple OS processes.
//!
//! # Example
//!
//! ```no_run
//! use voqm::AudioSignal;
//!
//! let reference = AudioSignal::mono(vec![0.0; 16000], 16000);
//! let degraded = AudioSignal::mono(vec![0.0; 16000], 16000);
//!
//! let mos = voqm::pesq_mos(&reference, &degraded)?;
//! let scores = voqm::composite(&reference, &degraded, false)?;
//! println!("pesq={mos} csig={} ssnr={}", scores.csig, scores.ssnr);
//! # Ok::<(), voqm::MetricsError>(())
//! ```

use std::path::PathBuf;
use std::sync::OnceLock;

pub use voqm_backend_octave::{OctaveConfig, OctaveFactory, OctaveSession};
pub use voqm_backend_pesq::PesqTool;
pub use voqm_core::{
    AudioSignal, CompositeMetricService, CompositeResult, ExternalError, InvalidInputError,
    MetricsError, MetricsResult, PesqMode, RawMeasures, SignalRole, SUPPORTED_SAMPLE_RATES,
};

use voqm_core::EngineFactory;

/// Environment variable naming the composite `.m` script.
pub const COMPOSITE_SCRIPT_ENV: &str = "VOQM_COMPOSITE_SCRIPT";

/// The production service type: ITU PESQ tool plus Octave engine sessions.
pub type MetricService = CompositeMetricService<PesqTool, EngineSetup>;

/// Engine factory carrying the resolved composite-script configuration.
///
/// The composite script has no default location. A service built without a
/// script still constructs (so PESQ-only use never needs one), but the first
/// composite call fails with a `CONFIG_001` configuration error rather than
/// probing the working directory for a stray `composite.m`.
#[derive(Debug, Clone)]
pub struct EngineSetup {
    factory: Option<OctaveFactory>,
}

impl EngineFactory for EngineSetup {
    type Session = OctaveSession;

    fn create(&self) -> Result<OctaveSession, ExternalError> {
        match &self.factory {
            Some(factory) => factory.create(),
            None => Err(ExternalError::new(
                "CONFIG_001",
                "engine",
                format!(
                    "no composite script configured; set MetricsConfig::composite_script \
                     or the {COMPOSITE_SCRIPT_ENV} environment variable"
                ),
            )),
        }
    }
}

/// Configuration for building a production [`MetricService`].
///
/// Paths left unset fall back to environment variables and discovery inside
/// the backends (`VOQM_OCTAVE_PATH`, `PESQ_BIN`, then `PATH`).
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Path to the composite `.m` script. Falls back to
    /// `$VOQM_COMPOSITE_SCRIPT`; required before the first composite call.
    pub composite_script: Option<PathBuf>,
    /// Octave executable override.
    pub octave_path: Option<PathBuf>,
    /// PESQ tool override.
    pub pesq_bin: Option<PathBuf>,
}

impl MetricsConfig {
    /// Creates an empty config (all discovery deferred to the backends).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the composite script path.
    pub fn composite_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.composite_script = Some(path.into());
        self
    }

    /// Sets the Octave executable path.
    pub fn octave_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.octave_path = Some(path.into());
        self
    }

    /// Sets the PESQ tool path.
    pub fn pesq_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.pesq_bin = Some(path.into());
        self
    }

    /// Builds a standalone service. No external process is started until the
    /// service is first used; an unconfigured composite script only surfaces
    /// when a composite call needs the engine.
    pub fn build(&self) -> MetricService {
        let factory = self.resolve_script().map(|script| {
            let mut octave = OctaveConfig::new(script);
            if let Some(ref path) = self.octave_path {
                octave = octave.octave_path(path.clone());
            }
            OctaveFactory::new(octave)
        });

        let pesq = match self.pesq_bin {
            Some(ref path) => PesqTool::with_path(path.clone()),
            None => PesqTool::new(),
        };

        CompositeMetricService::new(pesq, EngineSetup { factory })
    }

    fn resolve_script(&self) -> Option<PathBuf> {
        self.composite_script
            .clone()
            .or_else(|| std::env::var(COMPOSITE_SCRIPT_ENV).ok().map(PathBuf::from))
    }
}

static SHARED: OnceLock<MetricService> = OnceLock::new();

fn shared() -> &'static MetricService {
    SHARED.get_or_init(|| MetricsConfig::new().build())
}

/// Computes the PESQ MOS-LQO estimate for a (reference, degraded) pair,
/// selecting narrowband below 16000 Hz and wideband at 16000 Hz.
pub fn pesq_mos(reference: &AudioSignal, degraded: &AudioSignal) -> MetricsResult<f64> {
    shared().pesq_mos(reference, degraded)
}

/// Computes the composite measures for a (reference, degraded) pair.
///
/// With `multiprocess = false` the process-wide shared Octave session is
/// reused (created on first call). With `multiprocess = true` a private
/// session serves this call only and is torn down before it returns, on
/// success and on failure alike.
pub fn composite(
    reference: &AudioSignal,
    degraded: &AudioSignal,
    multiprocess: bool,
) -> MetricsResult<CompositeResult> {
    shared().composite(reference, degraded, multiprocess)
}

/// Tears down the process-wide shared Octave session, if one is live.
///
/// The shared session is otherwise never released automatically; a later
/// call simply starts a fresh one.
pub fn shutdown_engine() -> MetricsResult<()> {
    match SHARED.get() {
        Some(service) => service.shutdown_shared(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_builder_keeps_overrides() {
        let config = MetricsConfig::new()
            .composite_script("scripts/composite.m")
            .octave_path("/usr/bin/octave-cli")
            .pesq_bin("/usr/local/bin/pesq");

        assert_eq!(
            config.composite_script,
            Some(PathBuf::from("scripts/composite.m"))
        );
        assert_eq!(config.octave_path, Some(PathBuf::from("/usr/bin/octave-cli")));
        assert_eq!(config.pesq_bin, Some(PathBuf::from("/usr/local/bin/pesq")));
    }

    #[test]
    fn unconfigured_engine_reports_a_config_error() {
        let setup = EngineSetup { factory: None };
        let err = setup.create().unwrap_err();
        assert_eq!(err.stage, "engine");
        assert_eq!(err.code, "CONFIG_001");
        assert!(err.message.contains(COMPOSITE_SCRIPT_ENV));
    }

    #[test]
    fn script_resolution_prefers_explicit_config() {
        let config = MetricsConfig::new().composite_script("scripts/composite.m");
        assert_eq!(
            config.resolve_script(),
            Some(PathBuf::from("scripts/composite.m"))
        );

        // Without an override, resolution is whatever the environment says;
        // only assert the unset case when the variable really is unset.
        if std::env::var(COMPOSITE_SCRIPT_ENV).is_err() {
            assert_eq!(MetricsConfig::new().resolve_script(), None);
        }
    }

    #[test]
    fn shutdown_without_a_session_is_a_no_op() {
        // Nothing has touched the shared service in this test binary unless
        // another test raced ahead; either way shutdown must not fail.
        shutdown_engine().unwrap();
    }
}
