//! Grabbing a single frame from the live stream.
//!
//! The [`Capture`] trait is the seam between the handler and the external
//! tool. [`FfmpegCapture`] shells out to `ffmpeg` (or `avconv`, which takes
//! the same arguments):
//!
//! ```text
//! ffmpeg -analyzeduration 1000 -i rtmp://127.0.0.1:1935 \
//!        -vframes 1 -q:v 2 -f image2 -y <output> -loglevel quiet
//! ```
//!
//! The tool's own output is discarded. The call blocks until the process
//! exits or the timeout elapses, in which case the process is killed.
//! Callers must pass a path unique to the request; the tool overwrites it.

use crate::config::CaptureConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Interval between exit checks while a capture runs.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to create capture workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to wait for capture process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("Capture process exited with {0}")]
    Failed(ExitStatus),
    #[error("Capture timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Capture produced no image at {0}")]
    NoOutput(PathBuf),
    #[error("Capture failed: {0}")]
    Other(String),
}

/// Something that can write one still frame to a path.
pub trait Capture: Sync {
    /// Write a single frame to `output`, blocking until done.
    fn capture(&self, output: &Path) -> Result<(), CaptureError>;
}

impl<F> Capture for F
where
    F: Fn(&Path) -> Result<(), CaptureError> + Sync,
{
    fn capture(&self, output: &Path) -> Result<(), CaptureError> {
        self(output)
    }
}

/// Captures a frame by running an ffmpeg-compatible tool.
#[derive(Debug, Clone)]
pub struct FfmpegCapture {
    pub program: String,
    pub stream: String,
    pub analyze_duration: u32,
    pub timeout: Duration,
}

impl FfmpegCapture {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            program: config.program.clone(),
            stream: config.stream.clone(),
            analyze_duration: config.analyze_duration,
            timeout: config.timeout(),
        }
    }

    /// Arguments passed to the tool for `output`.
    pub fn args(&self, output: &Path) -> Vec<String> {
        vec![
            "-analyzeduration".into(),
            self.analyze_duration.to_string(),
            "-i".into(),
            self.stream.clone(),
            "-vframes".into(),
            "1".into(),
            "-q:v".into(),
            "2".into(),
            "-f".into(),
            "image2".into(),
            "-y".into(),
            output.to_string_lossy().into_owned(),
            "-loglevel".into(),
            "quiet".into(),
        ]
    }
}

impl Capture for FfmpegCapture {
    fn capture(&self, output: &Path) -> Result<(), CaptureError> {
        let child = Command::new(&self.program)
            .args(self.args(output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let status = wait_with_timeout(child, self.timeout)?;
        if !status.success() {
            return Err(CaptureError::Failed(status));
        }
        ensure_output(output)
    }
}

/// Wait for `child` to exit, killing it once `timeout` has passed.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<ExitStatus, CaptureError> {
    // None when the timeout is too large to represent: wait without a deadline
    let deadline = Instant::now().checked_add(timeout);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if deadline.is_some_and(|deadline| Instant::now() >= deadline) => {
                // kill fails if the child exited in between; wait reaps either way
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::TimedOut(timeout));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::Wait(e));
            }
        }
    }
}

/// A successful exit is not enough: the tool must have written a non-empty file.
pub fn ensure_output(output: &Path) -> Result<(), CaptureError> {
    match fs::metadata(output) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(CaptureError::NoOutput(output.to_path_buf())),
    }
}
