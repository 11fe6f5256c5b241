//! Octave subprocess session.
//!
//! Each session owns one persistent `octave-cli` process and a scratch
//! directory for staging job inputs and outputs. Evaluations are fed over
//! stdin as try/catch blocks and acknowledged with sentinel lines on stdout,
//! so a script failure is reported in-band instead of killing the session.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use voqm_core::RawMeasures;

use crate::error::{OctaveError, OctaveResult};

const OK_SENTINEL: &str = "<<voqm:ok>>";
const ERR_SENTINEL: &str = "<<voqm:err>>";

/// Number of output values the composite script must produce.
const MEASURE_COUNT: usize = 4;

/// Default grace period before a quit request escalates to a kill.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Configuration for Octave sessions.
#[derive(Debug, Clone)]
pub struct OctaveConfig {
    /// Path to the Octave executable. When unset, discovery falls back to
    /// the `VOQM_OCTAVE_PATH` environment variable, `PATH`, then common
    /// install locations.
    pub octave_path: Option<PathBuf>,
    /// Path to the composite-measure `.m` script.
    pub script_path: PathBuf,
    /// How long to wait for a clean interpreter exit before killing it.
    pub shutdown_grace: Duration,
}

impl OctaveConfig {
    /// Creates a config for the given composite script.
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            octave_path: None,
            script_path: script_path.into(),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }

    /// Sets the Octave executable path.
    pub fn octave_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.octave_path = Some(path.into());
        self
    }

    /// Sets the shutdown grace period.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    fn find_octave(&self) -> OctaveResult<PathBuf> {
        // An explicit override is a hard requirement: falling through to
        // discovery would silently run a different interpreter than the one
        // the caller asked for.
        if let Some(ref path) = self.octave_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(OctaveError::ConfiguredOctaveMissing { path: path.clone() });
        }

        // Check VOQM_OCTAVE_PATH environment variable
        if let Ok(path) = std::env::var("VOQM_OCTAVE_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        // Try to find Octave in PATH; octave-cli skips GUI library loading
        for name in ["octave-cli", "octave"] {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        // Try common installation paths
        let common_paths = if cfg!(target_os = "macos") {
            vec![
                "/Applications/Octave.app/Contents/Resources/usr/bin/octave-cli",
                "/opt/homebrew/bin/octave-cli",
                "/usr/local/bin/octave-cli",
            ]
        } else {
            vec![
                "/usr/bin/octave-cli",
                "/usr/bin/octave",
                "/usr/local/bin/octave-cli",
                "/snap/bin/octave",
            ]
        };

        for path_str in common_paths {
            let path = PathBuf::from(path_str);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(OctaveError::OctaveNotFound)
    }
}

/// One live Octave interpreter plus its scratch directory.
#[derive(Debug)]
pub struct OctaveSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    scratch: TempDir,
    script_dir: PathBuf,
    script_func: String,
    shutdown_grace: Duration,
    jobs: usize,
    reaped: bool,
}

impl OctaveSession {
    /// Starts a new session: resolves the script and the Octave executable,
    /// allocates a fresh scratch directory, and spawns the interpreter.
    pub fn start(config: &OctaveConfig) -> OctaveResult<Self> {
        if !config.script_path.exists() {
            return Err(OctaveError::ScriptNotFound {
                path: config.script_path.clone(),
            });
        }
        let script_path = config.script_path.canonicalize()?;
        let script_func = script_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_owned)
            .ok_or_else(|| OctaveError::InvalidScriptPath {
                path: config.script_path.clone(),
            })?;
        let script_dir = script_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| OctaveError::InvalidScriptPath {
                path: config.script_path.clone(),
            })?;

        let octave_path = config.find_octave()?;

        // One scratch directory per session, never reused across sessions.
        let scratch = tempfile::Builder::new().prefix("octmp-").tempdir()?;

        let mut cmd = Command::new(&octave_path);
        cmd.args(["--no-gui", "--norc", "--no-history", "--quiet"])
            .current_dir(scratch.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // Failures are reported in-band through the sentinel protocol;
            // leaving stderr unpiped avoids a filled-pipe deadlock while the
            // interpreter idles between jobs.
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(OctaveError::SpawnFailed)?;
        let stdin = child.stdin.take().ok_or(OctaveError::SessionClosed)?;
        let stdout = child.stdout.take().ok_or(OctaveError::SessionClosed)?;

        tracing::debug!(
            octave = %octave_path.display(),
            scratch = %scratch.path().display(),
            script = %script_path.display(),
            "started Octave session"
        );

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            scratch,
            script_dir,
            script_func,
            shutdown_grace: config.shutdown_grace,
            jobs: 0,
            reaped: false,
        })
    }

    /// Evaluates the composite script for one (reference, degraded, rate)
    /// triple, returning its four output values.
    ///
    /// Signals are staged as one-sample-per-line ASCII files, which Octave's
    /// `load -ascii` reads back as the N×1 column vectors the script expects.
    pub fn submit(
        &mut self,
        reference: &[f64],
        degraded: &[f64],
        sample_rate: u32,
    ) -> OctaveResult<RawMeasures> {
        let job_dir = self.scratch.path().join(format!("job{}", self.jobs));
        self.jobs += 1;
        fs::create_dir(&job_dir)?;

        let result = self.run_job(&job_dir, reference, degraded, sample_rate);
        // A shared session lives as long as the process; per-job staging
        // files must not accumulate in its scratch directory. Best effort:
        // a cleanup failure never masks the evaluation result.
        let _ = fs::remove_dir_all(&job_dir);
        result
    }

    fn run_job(
        &mut self,
        job_dir: &Path,
        reference: &[f64],
        degraded: &[f64],
        sample_rate: u32,
    ) -> OctaveResult<RawMeasures> {
        write_column(&job_dir.join("ref.dat"), reference)?;
        write_column(&job_dir.join("deg.dat"), degraded)?;

        let block = format_eval_block(
            &self.script_dir,
            &self.script_func,
            job_dir,
            sample_rate,
        );

        let stdin = self.stdin.as_mut().ok_or(OctaveError::SessionClosed)?;
        if stdin.write_all(block.as_bytes()).and_then(|_| stdin.flush()).is_err() {
            // A broken stdin pipe means the interpreter went away.
            return Err(OctaveError::SessionClosed);
        }

        loop {
            let mut line = String::new();
            let read = self.stdout.read_line(&mut line)?;
            if read == 0 {
                return Err(OctaveError::SessionClosed);
            }
            let line = line.trim();
            if line.starts_with(OK_SENTINEL) {
                break;
            }
            if let Some(message) = line.strip_prefix(ERR_SENTINEL) {
                return Err(OctaveError::EvalFailed {
                    message: message.trim().to_string(),
                });
            }
            // Anything else is interpreter chatter; skip it.
        }

        let content = fs::read_to_string(job_dir.join("out.dat"))?;
        parse_measures(&content)
    }

    /// Shuts the interpreter down: asks it to quit, waits out the grace
    /// period, kills on overrun. Idempotent.
    pub fn shutdown(&mut self) -> OctaveResult<()> {
        if let Some(mut stdin) = self.stdin.take() {
            // Best effort; a dead process has already closed the pipe.
            let _ = writeln!(stdin, "quit");
            let _ = stdin.flush();
        }
        if self.reaped {
            return Ok(());
        }

        let deadline = Instant::now() + self.shutdown_grace;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(?status, "Octave session shut down");
                    self.reaped = true;
                    return Ok(());
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        self.child.kill().map_err(OctaveError::ShutdownFailed)?;
                        self.child.wait().map_err(OctaveError::ShutdownFailed)?;
                        tracing::debug!("Octave session killed after grace period");
                        self.reaped = true;
                        return Ok(());
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(OctaveError::ShutdownFailed(e)),
            }
        }
    }
}

impl Drop for OctaveSession {
    fn drop(&mut self) {
        // Backstop for sessions dropped without an explicit shutdown: never
        // leave an interpreter running past its owner.
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Writes samples one per line so `load -ascii` yields an N×1 column vector.
fn write_column(path: &Path, samples: &[f64]) -> OctaveResult<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    for sample in samples {
        writeln!(writer, "{sample:.17e}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders the try/catch block submitted to the interpreter for one job.
fn format_eval_block(script_dir: &Path, func: &str, job_dir: &Path, sample_rate: u32) -> String {
    let script_dir = octave_quote(script_dir);
    let job = octave_quote(job_dir);
    format!(
        "try\n\
         \x20 addpath('{script_dir}');\n\
         \x20 __ref = load('-ascii', '{job}/ref.dat');\n\
         \x20 __deg = load('-ascii', '{job}/deg.dat');\n\
         \x20 [__csig, __cbak, __covl, __ssnr] = feval('{func}', __ref, __deg, {sample_rate});\n\
         \x20 __fid = fopen('{job}/out.dat', 'w');\n\
         \x20 fprintf(__fid, '%.17g\\n', [__csig; __cbak; __covl; __ssnr]);\n\
         \x20 fclose(__fid);\n\
         \x20 disp('{OK_SENTINEL}');\n\
         catch __err\n\
         \x20 disp(['{ERR_SENTINEL} ' __err.message]);\n\
         end\n"
    )
}

/// Escapes a path for a single-quoted Octave string literal.
fn octave_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}

/// Parses the four output values written by the eval block.
fn parse_measures(content: &str) -> OctaveResult<RawMeasures> {
    let mut values = Vec::with_capacity(MEASURE_COUNT);
    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match line.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                return Err(OctaveError::MalformedOutput {
                    expected: MEASURE_COUNT,
                    found: values.len(),
                })
            }
        }
    }

    match values[..] {
        [csig, cbak, covl, ssnr] => Ok(RawMeasures {
            csig,
            cbak,
            covl,
            ssnr,
        }),
        _ => Err(OctaveError::MalformedOutput {
            expected: MEASURE_COUNT,
            found: values.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn configured_octave_path_must_exist() {
        let config = OctaveConfig::new("composite.m")
            .octave_path("/definitely/not/here/octave-cli");
        let err = config.find_octave().unwrap_err();
        assert!(matches!(
            err,
            OctaveError::ConfiguredOctaveMissing { ref path }
                if path == Path::new("/definitely/not/here/octave-cli")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn job_scratch_is_removed_on_every_exit_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("stub.m");
        fs::write(&script, "function [a, b, c, d] = stub(r, d, fs)\nend\n").unwrap();

        // Stand-in interpreter: acknowledges every job without producing
        // out.dat, so submit fails after the protocol handshake.
        let fake = dir.path().join("octave-cli");
        fs::write(&fake, "#!/bin/sh\necho '<<voqm:ok>>'\ncat > /dev/null\n").unwrap();
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755)).unwrap();

        let config = OctaveConfig::new(&script).octave_path(&fake);
        let mut session = OctaveSession::start(&config).unwrap();
        let scratch = session.scratch.path().to_path_buf();

        let err = session.submit(&[0.1, 0.2], &[0.1, 0.2], 8000).unwrap_err();
        assert!(matches!(err, OctaveError::Io(_)));

        // The failed job's staging files are gone before submit returns.
        assert!(!scratch.join("job0").exists());
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);

        session.shutdown().unwrap();
    }

    #[test]
    fn quote_escapes_single_quotes() {
        let path = PathBuf::from("/tmp/o'brien/job0");
        assert_eq!(octave_quote(&path), "/tmp/o''brien/job0");
    }

    #[test]
    fn eval_block_carries_the_protocol() {
        let block = format_eval_block(
            Path::new("/opt/scripts"),
            "composite",
            Path::new("/tmp/octmp-x/job0"),
            16000,
        );
        assert!(block.contains("addpath('/opt/scripts');"));
        assert!(block.contains("feval('composite', __ref, __deg, 16000);"));
        assert!(block.contains("load('-ascii', '/tmp/octmp-x/job0/ref.dat')"));
        assert!(block.contains("disp('<<voqm:ok>>');"));
        assert!(block.contains("<<voqm:err>>"));
        assert!(block.starts_with("try\n"));
        assert!(block.ends_with("end\n"));
    }

    #[test]
    fn parse_measures_reads_four_values() {
        let raw = parse_measures("3.5\n2.25\n-1.5e-1\n10\n").unwrap();
        assert_eq!(raw.csig, 3.5);
        assert_eq!(raw.cbak, 2.25);
        assert_eq!(raw.covl, -0.15);
        assert_eq!(raw.ssnr, 10.0);
    }

    #[test]
    fn parse_measures_rejects_wrong_count() {
        let err = parse_measures("1.0\n2.0\n").unwrap_err();
        assert!(matches!(
            err,
            OctaveError::MalformedOutput {
                expected: 4,
                found: 2
            }
        ));
    }

    #[test]
    fn parse_measures_rejects_garbage() {
        let err = parse_measures("1.0\nnot-a-number\n3.0\n4.0\n").unwrap_err();
        assert!(matches!(err, OctaveError::MalformedOutput { .. }));
    }

    #[test]
    fn column_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.dat");
        write_column(&path, &[0.5, -0.25, 1.0e-3]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<f64> = content
            .lines()
            .map(|line| line.parse().unwrap())
            .collect();
        assert_eq!(parsed, vec![0.5, -0.25, 1.0e-3]);
    }

    // Requires a local GNU Octave install; run with `cargo test -- --ignored`.
    #[test]
    #[ignore = "requires GNU Octave"]
    fn evaluates_a_toy_script_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("toy.m");
        fs::write(
            &script,
            "function [a, b, c, d] = toy(ref, deg, fs)\n\
             \x20 a = mean(ref);\n\
             \x20 b = mean(deg);\n\
             \x20 c = double(fs);\n\
             \x20 d = numel(ref);\n\
             end\n",
        )
        .unwrap();

        let config = OctaveConfig::new(&script);
        let mut session = OctaveSession::start(&config).unwrap();
        let raw = session.submit(&[1.0, 2.0, 3.0], &[2.0, 2.0], 8000).unwrap();

        // Repeated submissions must not pile up staging files in the
        // session's scratch directory.
        assert_eq!(fs::read_dir(session.scratch.path()).unwrap().count(), 0);
        session.shutdown().unwrap();

        use approx::assert_relative_eq;
        assert_relative_eq!(raw.csig, 2.0);
        assert_relative_eq!(raw.cbak, 2.0);
        assert_relative_eq!(raw.covl, 8000.0);
        assert_relative_eq!(raw.ssnr, 3.0);
    }

    #[test]
    #[ignore = "requires GNU Octave"]
    fn script_error_is_reported_in_band() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken.m");
        fs::write(
            &script,
            "function [a, b, c, d] = broken(ref, deg, fs)\n\
             \x20 error('deliberate failure');\n\
             end\n",
        )
        .unwrap();

        let config = OctaveConfig::new(&script);
        let mut session = OctaveSession::start(&config).unwrap();
        let err = session.submit(&[1.0], &[1.0], 8000).unwrap_err();
        assert!(matches!(err, OctaveError::EvalFailed { .. }));
        assert_eq!(fs::read_dir(session.scratch.path()).unwrap().count(), 0);

        // Session survives a script error and still shuts down cleanly.
        session.shutdown().unwrap();
    }
}
