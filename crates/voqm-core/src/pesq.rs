//! PESQ mode selection and the scoring seam.

use crate::error::ExternalError;

/// PESQ perceptual model variant, selected by sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PesqMode {
    /// P.862 narrowband model (telephone-band speech).
    NarrowBand,
    /// P.862.2 wideband model.
    WideBand,
}

impl PesqMode {
    /// Selects the mode for a sample rate: below 16000 Hz is narrowband,
    /// 16000 Hz and above is wideband.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        if sample_rate < 16000 {
            PesqMode::NarrowBand
        } else {
            PesqMode::WideBand
        }
    }

    /// Returns the short string identifier for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            PesqMode::NarrowBand => "nb",
            PesqMode::WideBand => "wb",
        }
    }
}

/// The external PESQ function.
///
/// Implementations are expected to be deterministic for identical inputs and
/// to perform no retries; any failure is surfaced unchanged.
pub trait PesqFunction {
    /// Computes the MOS-LQO estimate for a (reference, degraded) pair.
    fn evaluate(
        &self,
        sample_rate: u32,
        reference: &[f64],
        degraded: &[f64],
        mode: PesqMode,
    ) -> Result<f64, ExternalError>;
}

impl<T: PesqFunction + ?Sized> PesqFunction for &T {
    fn evaluate(
        &self,
        sample_rate: u32,
        reference: &[f64],
        degraded: &[f64],
        mode: PesqMode,
    ) -> Result<f64, ExternalError> {
        (**self).evaluate(sample_rate, reference, degraded, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection_follows_sample_rate() {
        assert_eq!(PesqMode::for_sample_rate(8000), PesqMode::NarrowBand);
        assert_eq!(PesqMode::for_sample_rate(15999), PesqMode::NarrowBand);
        assert_eq!(PesqMode::for_sample_rate(16000), PesqMode::WideBand);
    }

    #[test]
    fn mode_identifiers() {
        assert_eq!(PesqMode::NarrowBand.as_str(), "nb");
        assert_eq!(PesqMode::WideBand.as_str(), "wb");
    }
}
