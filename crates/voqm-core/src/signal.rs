//! Audio signal type and input validation.

use crate::error::{InvalidInputError, SignalRole};

/// Sample rates the metric pipeline accepts, in Hz.
pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [8000, 16000];

/// An owned audio buffer with its sample rate.
///
/// Samples are normalized floats in the ±1.0 range. Multi-channel buffers are
/// interleaved; the metric pipeline itself only accepts mono signals, but the
/// type can carry whatever a decoder produced so that validation can reject
/// it with a precise error instead of the decoder guessing.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f64>,
    channels: u16,
    sample_rate: u32,
}

impl AudioSignal {
    /// Creates a mono signal.
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Creates a signal from an interleaved multi-channel buffer.
    pub fn interleaved(samples: Vec<f64>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// The raw sample buffer (interleaved if more than one channel).
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of samples across all channels.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Validates the input contract for a (reference, degraded) pair.
///
/// Both signals must be mono, both sample rates must be in
/// [`SUPPORTED_SAMPLE_RATES`], and the two rates must match. Signal lengths
/// are deliberately not compared; length handling is the external scorers'
/// concern and their errors propagate unchanged.
pub fn validate_pair(
    reference: &AudioSignal,
    degraded: &AudioSignal,
) -> Result<(), InvalidInputError> {
    if reference.channels() != 1 {
        return Err(InvalidInputError::NotMono {
            role: SignalRole::Reference,
            channels: reference.channels(),
        });
    }
    if degraded.channels() != 1 {
        return Err(InvalidInputError::NotMono {
            role: SignalRole::Degraded,
            channels: degraded.channels(),
        });
    }
    for rate in [reference.sample_rate(), degraded.sample_rate()] {
        if !SUPPORTED_SAMPLE_RATES.contains(&rate) {
            return Err(InvalidInputError::UnsupportedSampleRate { rate });
        }
    }
    if reference.sample_rate() != degraded.sample_rate() {
        return Err(InvalidInputError::SampleRateMismatch {
            reference: reference.sample_rate(),
            degraded: degraded.sample_rate(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tone(sample_rate: u32) -> AudioSignal {
        let samples = (0..sample_rate as usize)
            .map(|i| (i as f64 * 0.1).sin() * 0.5)
            .collect();
        AudioSignal::mono(samples, sample_rate)
    }

    #[test]
    fn accepts_matching_mono_pairs() {
        for rate in SUPPORTED_SAMPLE_RATES {
            assert_eq!(validate_pair(&tone(rate), &tone(rate)), Ok(()));
        }
    }

    #[test]
    fn rejects_stereo_reference() {
        let stereo = AudioSignal::interleaved(vec![0.0; 64], 2, 8000);
        let err = validate_pair(&stereo, &tone(8000)).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::NotMono {
                role: SignalRole::Reference,
                channels: 2
            }
        );
    }

    #[test]
    fn rejects_stereo_degraded() {
        let stereo = AudioSignal::interleaved(vec![0.0; 64], 2, 8000);
        let err = validate_pair(&tone(8000), &stereo).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::NotMono {
                role: SignalRole::Degraded,
                channels: 2
            }
        );
    }

    #[test]
    fn rejects_unsupported_sample_rates() {
        for rate in [4000, 11025, 22050, 44100, 48000] {
            let err = validate_pair(&tone(rate), &tone(rate)).unwrap_err();
            assert_eq!(err, InvalidInputError::UnsupportedSampleRate { rate });
        }
    }

    #[test]
    fn rejects_mismatched_sample_rates() {
        let err = validate_pair(&tone(8000), &tone(16000)).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::SampleRateMismatch {
                reference: 8000,
                degraded: 16000
            }
        );
    }
}
