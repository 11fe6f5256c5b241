//! The metric orchestrator: validate, score, evaluate, combine.

use std::sync::Mutex;

use crate::combine::{combine, CompositeResult};
use crate::engine::{EngineFactory, EngineSession, RawMeasures};
use crate::error::{ExternalError, MetricsError, MetricsResult};
use crate::pesq::{PesqFunction, PesqMode};
use crate::signal::{validate_pair, AudioSignal};

/// Orchestrates PESQ scoring and composite-measure evaluation.
///
/// Holds the PESQ backend, the engine-session factory, and the process-scoped
/// shared session slot. The shared session is created lazily on first use and
/// reused for the service's lifetime; it is intended for sequential use and is
/// never torn down as a side effect of an engine failure. Callers running
/// OS-level worker processes in parallel must request private sessions
/// (`multiprocess = true`) so each worker owns an isolated engine process.
pub struct CompositeMetricService<P, F: EngineFactory> {
    pesq: P,
    factory: F,
    shared: Mutex<Option<F::Session>>,
}

impl<P: PesqFunction, F: EngineFactory> CompositeMetricService<P, F> {
    /// Creates a service over the given backends. No engine process is
    /// started until the first `composite` call.
    pub fn new(pesq: P, factory: F) -> Self {
        Self {
            pesq,
            factory,
            shared: Mutex::new(None),
        }
    }

    /// Computes the PESQ MOS-LQO estimate for a validated signal pair.
    pub fn pesq_mos(&self, reference: &AudioSignal, degraded: &AudioSignal) -> MetricsResult<f64> {
        validate_pair(reference, degraded)?;
        self.score_pesq(reference, degraded)
    }

    /// Computes the composite measures for a validated signal pair.
    ///
    /// Validation failures are raised before any external work happens; no
    /// engine process is spawned and no PESQ call is made. With
    /// `multiprocess = false` the evaluation reuses the shared session,
    /// creating it on first use. With `multiprocess = true` a fresh private
    /// session serves this call only and is shut down on every exit path.
    pub fn composite(
        &self,
        reference: &AudioSignal,
        degraded: &AudioSignal,
        multiprocess: bool,
    ) -> MetricsResult<CompositeResult> {
        validate_pair(reference, degraded)?;

        let pesq_score = self.score_pesq(reference, degraded)?;

        let sample_rate = reference.sample_rate();
        let raw = if multiprocess {
            self.evaluate_private(reference.samples(), degraded.samples(), sample_rate)
        } else {
            self.evaluate_shared(reference.samples(), degraded.samples(), sample_rate)
        }?;

        Ok(combine(pesq_score, raw))
    }

    /// Tears down the shared session if one is live.
    ///
    /// The shared session otherwise persists for the service's lifetime;
    /// this is the only way to release it early.
    pub fn shutdown_shared(&self) -> MetricsResult<()> {
        let mut slot = self.lock_shared();
        if let Some(mut session) = slot.take() {
            session.shutdown().map_err(engine_failure)?;
        }
        Ok(())
    }

    fn score_pesq(&self, reference: &AudioSignal, degraded: &AudioSignal) -> MetricsResult<f64> {
        let sample_rate = reference.sample_rate();
        let mode = PesqMode::for_sample_rate(sample_rate);
        self.pesq
            .evaluate(sample_rate, reference.samples(), degraded.samples(), mode)
            .map_err(|err| {
                tracing::error!(stage = "pesq", code = err.code, "PESQ scoring failed: {err}");
                MetricsError::Scoring(err)
            })
    }

    fn evaluate_shared(
        &self,
        reference: &[f64],
        degraded: &[f64],
        sample_rate: u32,
    ) -> MetricsResult<RawMeasures> {
        let mut slot = self.lock_shared();
        let session = match &mut *slot {
            Some(session) => session,
            empty => empty.insert(self.factory.create().map_err(engine_failure)?),
        };
        // An engine failure leaves the shared session in place; it is only
        // ever released through shutdown_shared.
        session
            .submit(reference, degraded, sample_rate)
            .map_err(engine_failure)
    }

    fn evaluate_private(
        &self,
        reference: &[f64],
        degraded: &[f64],
        sample_rate: u32,
    ) -> MetricsResult<RawMeasures> {
        let mut session = self.factory.create().map_err(engine_failure)?;
        let outcome = session.submit(reference, degraded, sample_rate);
        let released = session.shutdown();
        // The submit error takes precedence; a shutdown failure on an
        // otherwise successful evaluation is still a failure of the call.
        let raw = outcome.map_err(engine_failure)?;
        released.map_err(engine_failure)?;
        Ok(raw)
    }

    fn lock_shared(&self) -> std::sync::MutexGuard<'_, Option<F::Session>> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn engine_failure(err: ExternalError) -> MetricsError {
    tracing::error!(stage = "engine", code = err.code, "composite engine failed: {err}");
    MetricsError::Engine(err)
}
