//! Command implementations for the voqm CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use voqm::{AudioSignal, MetricsConfig};

use crate::input::load_wav;

/// Machine-readable output for the `pesq` command.
#[derive(Debug, Serialize)]
struct PesqOutput {
    pesq: f64,
}

/// Machine-readable output for the `composite` command.
#[derive(Debug, Serialize)]
struct CompositeOutput {
    pesq: f64,
    csig: f64,
    cbak: f64,
    covl: f64,
    ssnr: f64,
}

/// Runs the `pesq` subcommand.
pub fn run_pesq(
    reference: &Path,
    degraded: &Path,
    pesq_bin: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let (reference, degraded) = load_pair(reference, degraded)?;

    let mut config = MetricsConfig::new();
    if let Some(path) = pesq_bin {
        config = config.pesq_bin(path);
    }
    let service = config.build();

    let score = service
        .pesq_mos(&reference, &degraded)
        .context("PESQ scoring failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&PesqOutput { pesq: score })?);
    } else {
        println!("{} {score:.3}", "PESQ MOS-LQO:".cyan().bold());
    }
    Ok(())
}

/// Runs the `composite` subcommand.
#[allow(clippy::too_many_arguments)]
pub fn run_composite(
    reference: &Path,
    degraded: &Path,
    script: Option<&PathBuf>,
    octave: Option<&PathBuf>,
    pesq_bin: Option<&PathBuf>,
    isolated: bool,
    json: bool,
) -> Result<()> {
    let (reference, degraded) = load_pair(reference, degraded)?;

    let mut config = MetricsConfig::new();
    if let Some(path) = script {
        config = config.composite_script(path);
    }
    if let Some(path) = octave {
        config = config.octave_path(path);
    }
    if let Some(path) = pesq_bin {
        config = config.pesq_bin(path);
    }
    let service = config.build();

    let scores = service
        .composite(&reference, &degraded, isolated)
        .context("composite scoring failed")?;

    // The CLI process is one-shot, so the shared session would otherwise be
    // torn down only by process exit; release it explicitly.
    if !isolated {
        service
            .shutdown_shared()
            .context("failed to shut down the Octave session")?;
    }

    let output = CompositeOutput {
        pesq: scores.pesq,
        csig: scores.csig,
        cbak: scores.cbak,
        covl: scores.covl,
        ssnr: scores.ssnr,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", "Composite measures".cyan().bold());
        println!("  {} {:.3}", "pesq:".dimmed(), output.pesq);
        println!("  {} {:.3}", "csig:".dimmed(), output.csig);
        println!("  {} {:.3}", "cbak:".dimmed(), output.cbak);
        println!("  {} {:.3}", "covl:".dimmed(), output.covl);
        println!("  {} {:.3} dB", "ssnr:".dimmed(), output.ssnr);
    }
    Ok(())
}

fn load_pair(reference: &Path, degraded: &Path) -> Result<(AudioSignal, AudioSignal)> {
    let reference = load_wav(reference).context("failed to load reference signal")?;
    let degraded = load_wav(degraded).context("failed to load degraded signal")?;
    Ok((reference, degraded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_output_serializes_all_five_scores() {
        let output = CompositeOutput {
            pesq: 4.5,
            csig: 3.2,
            cbak: 2.9,
            covl: 3.0,
            ssnr: 10.5,
        };
        let json = serde_json::to_string(&output).unwrap();
        for key in ["pesq", "csig", "cbak", "covl", "ssnr"] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }
}
