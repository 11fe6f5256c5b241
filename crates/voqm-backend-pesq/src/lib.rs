//! voqm PESQ backend
//!
//! Production implementation of the `PesqFunction` seam from `voqm-core`,
//! delegating to the ITU-T P.862 reference `pesq` utility as an external
//! process. The perceptual model itself is entirely the tool's; this crate
//! only stages inputs, selects the narrowband/wideband switch, and parses
//! the MOS-LQO prediction back out.

pub mod error;
pub mod tool;

pub use error::{PesqToolError, PesqToolResult};
pub use tool::PesqTool;

use voqm_core::{ExternalError, PesqFunction, PesqMode};

impl PesqFunction for PesqTool {
    fn evaluate(
        &self,
        sample_rate: u32,
        reference: &[f64],
        degraded: &[f64],
        mode: PesqMode,
    ) -> Result<f64, ExternalError> {
        self.score(sample_rate, reference, degraded, mode)
            .map_err(ExternalError::from_stage)
    }
}
