//! The screenshot request handler.
//!
//! One call to [`ScreenshotHandler::handle`] runs the whole pipeline for one
//! request on the calling thread:
//!
//! ```text
//! ?size=hi ──► unique workspace ──► capture frame.png ──► render ──► response
//!              (screenshot-XXXXXX/)                        (load, resize, encode)
//! ```
//!
//! The workspace directory is unique per request, so concurrent requests
//! never share a capture file, and it is removed before `handle` returns.
//! The handler itself is immutable and shared across worker threads.

use crate::capture::{Capture, CaptureError};
use crate::imaging::{ImageBackend, PipelineError, RenderParams, Rendered, render};
use crate::presets::PresetTable;
use crate::response::ScreenshotResponse;
use log::warn;
use std::path::PathBuf;
use thiserror::Error;

/// Name of the captured frame inside a request's workspace.
pub const FRAME_FILE_NAME: &str = "frame.png";

const WORKSPACE_PREFIX: &str = "screenshot-";

#[derive(Error, Debug)]
pub enum ScreenshotError {
    #[error("capture stage failed: {0}")]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ScreenshotError {
    /// Stage the request failed in: `capture`, `load`, `resize`, `encode` or `allocate`.
    pub fn stage(&self) -> &'static str {
        match self {
            ScreenshotError::Capture(_) => "capture",
            ScreenshotError::Pipeline(e) => e.stage.as_str(),
        }
    }
}

pub struct ScreenshotHandler<C, B> {
    capture: C,
    backend: B,
    presets: PresetTable,
    params: RenderParams,
    temp_dir: PathBuf,
}

impl<C: Capture, B: ImageBackend> ScreenshotHandler<C, B> {
    pub fn new(
        capture: C,
        backend: B,
        presets: PresetTable,
        params: RenderParams,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            capture,
            backend,
            presets,
            params,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    /// Handle a request given its raw query string.
    pub fn handle(&self, query: Option<&str>) -> ScreenshotResponse {
        let size = query.and_then(|q| query_param(q, "size"));
        ScreenshotResponse::from_outcome(self.screenshot(size))
    }

    /// Capture a fresh frame and render it for `size`.
    pub fn screenshot(&self, size: Option<&str>) -> Result<Rendered, ScreenshotError> {
        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.temp_dir)
            .map_err(CaptureError::Workspace)?;
        let frame = workspace.path().join(FRAME_FILE_NAME);

        let outcome = match self.capture.capture(&frame) {
            Ok(()) => render(&self.backend, &frame, size, &self.presets, &self.params)
                .map_err(ScreenshotError::from),
            Err(e) => Err(ScreenshotError::from(e)),
        };

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!("failed to remove {}: {}", workspace_path.display(), e);
        }
        outcome
    }
}

/// First `name=value` pair in a raw query string. Names compare ASCII
/// case-insensitively. Values are not percent-decoded; an empty value counts
/// as absent.
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
