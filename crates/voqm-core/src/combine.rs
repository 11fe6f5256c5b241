//! Linear combination of PESQ with the raw composite sub-measures.

use crate::engine::RawMeasures;

/// PESQ weight applied to the signal-distortion measure.
pub const CSIG_PESQ_WEIGHT: f64 = 0.603;
/// PESQ weight applied to the background-distortion measure.
pub const CBAK_PESQ_WEIGHT: f64 = 0.478;
/// PESQ weight applied to the overall-quality measure.
pub const COVL_PESQ_WEIGHT: f64 = 0.805;

/// Final composite scores for one (reference, degraded) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeResult {
    /// PESQ MOS-LQO estimate.
    pub pesq: f64,
    /// Signal-distortion MOS estimate.
    pub csig: f64,
    /// Background-distortion MOS estimate.
    pub cbak: f64,
    /// Overall-quality MOS estimate.
    pub covl: f64,
    /// Segmental SNR in dB, passed through unmodified.
    pub ssnr: f64,
}

/// Combines the PESQ score with the raw sub-measures.
///
/// The weights are the empirically derived regression coefficients from the
/// Hu & Loizou composite-measure formulation and are reproduced exactly.
/// Pure and deterministic: no rounding beyond floating-point arithmetic.
pub fn combine(pesq_score: f64, raw: RawMeasures) -> CompositeResult {
    CompositeResult {
        pesq: pesq_score,
        csig: raw.csig + CSIG_PESQ_WEIGHT * pesq_score,
        cbak: raw.cbak + CBAK_PESQ_WEIGHT * pesq_score,
        covl: raw.covl + COVL_PESQ_WEIGHT * pesq_score,
        ssnr: raw.ssnr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn combine_applies_exact_weights() {
        let raw = RawMeasures {
            csig: 3.0,
            cbak: 2.5,
            covl: 2.75,
            ssnr: 9.25,
        };
        let result = combine(4.0, raw);
        assert_eq!(result.pesq, 4.0);
        assert_eq!(result.csig, 3.0 + 0.603 * 4.0);
        assert_eq!(result.cbak, 2.5 + 0.478 * 4.0);
        assert_eq!(result.covl, 2.75 + 0.805 * 4.0);
        assert_eq!(result.ssnr, 9.25);
    }

    #[test]
    fn combine_is_pure_across_repeats() {
        let raw = RawMeasures {
            csig: 1.25,
            cbak: -0.5,
            covl: 0.0,
            ssnr: -3.0,
        };
        let first = combine(2.125, raw);
        let second = combine(2.125, raw);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_pesq_passes_raw_through() {
        let raw = RawMeasures {
            csig: 3.5,
            cbak: 3.0,
            covl: 3.25,
            ssnr: 12.0,
        };
        let result = combine(0.0, raw);
        assert_eq!(result.csig, 3.5);
        assert_eq!(result.cbak, 3.0);
        assert_eq!(result.covl, 3.25);
        assert_eq!(result.ssnr, 12.0);
    }
}
