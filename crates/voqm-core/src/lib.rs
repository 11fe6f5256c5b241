//! voqm core library
//!
//! Types, validation, and orchestration for objective speech-quality metrics:
//! a PESQ MOS-LQO estimate plus the Hu & Loizou (2006) composite measures
//! (signal distortion, background distortion, overall quality, segmental SNR).
//!
//! This crate is the numerical-combination and lifecycle layer only. The two
//! heavyweight collaborators are consumed through trait seams:
//!
//! - [`PesqFunction`] — the external PESQ scorer (production implementation
//!   in `voqm-backend-pesq`).
//! - [`EngineFactory`] / [`EngineSession`] — the out-of-process numerical
//!   engine evaluating the composite-measure script (production
//!   implementation in `voqm-backend-octave`).
//!
//! [`CompositeMetricService`] composes them: it validates the input pair,
//! scores PESQ with sample-rate-driven mode selection, submits the
//! evaluation through a shared or private engine session, and combines the
//! results with fixed regression weights.
//!
//! # Modules
//!
//! - [`error`]: the error taxonomy (`InvalidInput` / `Scoring` / `Engine`)
//! - [`signal`]: [`AudioSignal`] and input validation
//! - [`pesq`]: PESQ mode selection and the scoring seam
//! - [`engine`]: engine session and factory seams
//! - [`combine`]: the fixed linear combination
//! - [`service`]: the orchestrator

pub mod combine;
pub mod engine;
pub mod error;
pub mod pesq;
pub mod service;
pub mod signal;

pub use combine::{combine, CompositeResult, CBAK_PESQ_WEIGHT, COVL_PESQ_WEIGHT, CSIG_PESQ_WEIGHT};
pub use engine::{EngineFactory, EngineSession, RawMeasures};
pub use error::{
    ExternalError, InvalidInputError, MetricsError, MetricsResult, SignalRole, StageError,
};
pub use pesq::{PesqFunction, PesqMode};
pub use service::CompositeMetricService;
pub use signal::{validate_pair, AudioSignal, SUPPORTED_SAMPLE_RATES};
