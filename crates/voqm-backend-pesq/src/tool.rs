//! ITU-T P.862 reference tool adapter.
//!
//! Stages the two signals as 16-bit PCM WAV files in a scratch directory,
//! runs the `pesq` utility with the sample-rate and mode switches, and
//! parses the MOS-LQO value from its final prediction line. The scratch
//! directory is also the tool's working directory so its own byproducts
//! (`pesq_results.txt`) land there instead of the caller's cwd.

use std::path::{Path, PathBuf};
use std::process::Command;

use voqm_core::PesqMode;

use crate::error::{PesqToolError, PesqToolResult};

/// Adapter for the external PESQ scoring tool.
#[derive(Debug, Clone, Default)]
pub struct PesqTool {
    tool_path: Option<PathBuf>,
}

impl PesqTool {
    /// Creates an adapter that discovers the tool via `PESQ_BIN` or `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter with an explicit tool path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: Some(path.into()),
        }
    }

    fn find_tool(&self) -> PesqToolResult<PathBuf> {
        // An explicit override is a hard requirement: falling through to
        // discovery would silently run a different binary than the one the
        // caller asked for.
        if let Some(ref path) = self.tool_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(PesqToolError::ConfiguredToolMissing { path: path.clone() });
        }

        // Check PESQ_BIN environment variable
        if let Ok(path) = std::env::var("PESQ_BIN") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        if let Ok(path) = which::which("pesq") {
            return Ok(path);
        }

        Err(PesqToolError::ToolNotFound)
    }

    /// Scores one (reference, degraded) pair, returning the MOS-LQO value.
    pub fn score(
        &self,
        sample_rate: u32,
        reference: &[f64],
        degraded: &[f64],
        mode: PesqMode,
    ) -> PesqToolResult<f64> {
        let tool = self.find_tool()?;
        let scratch = tempfile::Builder::new().prefix("pesq-").tempdir()?;

        let ref_path = scratch.path().join("ref.wav");
        let deg_path = scratch.path().join("deg.wav");
        write_wav(&ref_path, reference, sample_rate)?;
        write_wav(&deg_path, degraded, sample_rate)?;

        let mut cmd = Command::new(&tool);
        cmd.args(mode_args(sample_rate, mode))
            .arg(&ref_path)
            .arg(&deg_path)
            .current_dir(scratch.path());

        tracing::debug!(tool = %tool.display(), rate = sample_rate, mode = mode.as_str(), "running PESQ");

        let output = cmd.output().map_err(PesqToolError::SpawnFailed)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // The reference tool reports most failures on stdout.
            let detail = if stderr.trim().is_empty() {
                last_lines(&stdout, 3)
            } else {
                stderr.trim().to_string()
            };
            return Err(PesqToolError::ProcessFailed {
                exit_code: output.status.code().unwrap_or(-1),
                output: detail,
            });
        }

        parse_mos_lqo(&stdout).ok_or_else(|| PesqToolError::MalformedOutput {
            output: last_lines(&stdout, 3),
        })
    }
}

/// Sample-rate and mode switches for the reference tool's argv.
fn mode_args(sample_rate: u32, mode: PesqMode) -> Vec<String> {
    let mut args = vec![format!("+{sample_rate}")];
    if mode == PesqMode::WideBand {
        args.push("+wb".to_string());
    }
    args
}

/// Extracts the MOS-LQO value from the tool's stdout.
///
/// The narrowband build prints
/// `P.862 Prediction (Raw MOS, MOS-LQO):  = 3.209  3.329` and the wideband
/// mode prints `P.862.2 Prediction (MOS-LQO):  = 4.644`; in both cases the
/// MOS-LQO is the last field of the last prediction line.
fn parse_mos_lqo(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .rev()
        .find(|line| line.contains("Prediction"))
        .and_then(|line| line.split_whitespace().last())
        .and_then(|field| field.parse().ok())
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join(" | ")
}

/// Writes a mono 16-bit PCM WAV, rescaling normalized ±1.0 samples.
fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> PesqToolResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(PesqToolError::StageWav)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f64::from(i16::MAX)).round() as i16;
        writer.write_sample(value).map_err(PesqToolError::StageWav)?;
    }
    writer.finalize().map_err(PesqToolError::StageWav)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn narrowband_prediction_line_parses() {
        let stdout = "PESQ results written\n\
                      P.862 Prediction (Raw MOS, MOS-LQO):  = 3.209\t3.329\n";
        assert_eq!(parse_mos_lqo(stdout), Some(3.329));
    }

    #[test]
    fn wideband_prediction_line_parses() {
        let stdout = "some banner\nP.862.2 Prediction (MOS-LQO):  = 4.644\n";
        assert_eq!(parse_mos_lqo(stdout), Some(4.644));
    }

    #[test]
    fn missing_prediction_yields_none() {
        assert_eq!(parse_mos_lqo("an error occurred\n"), None);
        assert_eq!(parse_mos_lqo("Prediction pending =\n"), None);
    }

    #[test]
    fn mode_args_add_wideband_switch() {
        assert_eq!(mode_args(8000, PesqMode::NarrowBand), vec!["+8000"]);
        assert_eq!(mode_args(16000, PesqMode::WideBand), vec!["+16000", "+wb"]);
    }

    #[test]
    fn staged_wavs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.wav");
        write_wav(&path, &[0.0, 0.5, -0.5, 1.0, -1.0, 2.0], 8000).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        // Out-of-range input clamps instead of wrapping.
        assert_eq!(samples, vec![0, 16384, -16384, 32767, -32767, 32767]);
    }

    #[test]
    fn configured_tool_path_must_exist() {
        let tool = PesqTool::with_path("/definitely/not/here/pesq");
        let err = tool.find_tool().unwrap_err();
        assert!(matches!(
            err,
            PesqToolError::ConfiguredToolMissing { ref path }
                if path == Path::new("/definitely/not/here/pesq")
        ));
    }

    #[test]
    fn last_lines_keeps_the_tail() {
        let text = "one\ntwo\n\nthree\nfour\n";
        assert_eq!(last_lines(text, 2), "three | four");
    }

    // Requires the ITU-T P.862 reference tool; run with `cargo test -- --ignored`.
    #[test]
    #[ignore = "requires the ITU-T pesq tool"]
    fn identical_tones_score_near_the_top_of_the_scale() {
        let tone: Vec<f64> = (0..16000)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 16000.0).sin() * 0.5)
            .collect();
        let score = PesqTool::new()
            .score(16000, &tone, &tone, PesqMode::WideBand)
            .unwrap();
        assert!(score > 4.0, "identical signals should score near-maximal, got {score}");
    }
}
