//! WAV decoding for the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use voqm::AudioSignal;

/// Loads a WAV file as an [`AudioSignal`] with samples normalized to ±1.0.
///
/// The channel count is preserved as-is so the metric pipeline can reject
/// non-mono input with a precise error instead of silently downmixing.
pub fn load_wav(path: &Path) -> Result<AudioSignal> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from))
            .collect::<Result<_, _>>(),
        hound::SampleFormat::Int => {
            // Scale by the format's full range so 16-bit and 24-bit files
            // land in the same ±1.0 contract.
            let scale = f64::from(1u32 << (spec.bits_per_sample - 1));
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| f64::from(value) / scale))
                .collect::<Result<_, _>>()
        }
    }
    .with_context(|| format!("failed to decode WAV samples: {}", path.display()))?;

    Ok(AudioSignal::interleaved(
        samples,
        spec.channels,
        spec.sample_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn write_test_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn mono_int_wav_normalizes_to_unit_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_test_wav(&path, 1, 8000, &[0, 16384, -16384, 32767]);

        let signal = load_wav(&path).unwrap();
        assert_eq!(signal.channels(), 1);
        assert_eq!(signal.sample_rate(), 8000);
        assert_eq!(signal.len(), 4);
        assert_relative_eq!(signal.samples()[0], 0.0);
        assert_relative_eq!(signal.samples()[1], 0.5);
        assert_relative_eq!(signal.samples()[2], -0.5);
        assert!(signal.samples()[3] < 1.0 && signal.samples()[3] > 0.999);
    }

    #[test]
    fn stereo_channel_count_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_test_wav(&path, 2, 16000, &[100, -100, 200, -200]);

        let signal = load_wav(&path).unwrap();
        assert_eq!(signal.channels(), 2);
        assert_eq!(signal.len(), 4);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.wav"));
    }
}
