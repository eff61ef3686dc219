//! Load → resolve → resize → encode → copy out.
//!
//! Every intermediate (decoded image, resized image, encoded buffer) is an
//! owned value, so each one is released exactly once on every exit path.
//! Locals drop in reverse order of creation, which gives the release order
//! encoded buffer → resized image → loaded image on success and failure alike.
//!
//! | Stage | Allocates | Released on failure |
//! |---|---|---|
//! | load | loaded image | nothing to release |
//! | resize | resized image (skipped when target == native) | loaded |
//! | encode | backend-owned PNG buffer | resized, loaded |
//! | allocate | response body | buffer, resized, loaded |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::resolve_target;
use super::params::RenderParams;
use crate::presets::PresetTable;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Pipeline phase, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Resize,
    Encode,
    Allocate,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Resize => "resize",
            Stage::Encode => "encode",
            Stage::Allocate => "allocate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: BackendError,
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(BackendError) -> Self {
        move |source| Self { stage, source }
    }
}

/// A finished screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// PNG bytes, owned by the caller.
    pub body: Vec<u8>,
    /// Size of the captured frame.
    pub native: Dimensions,
    /// Size of the encoded image.
    pub target: Dimensions,
}

/// Render the captured frame at `path` as PNG, sized for `size_token`.
///
/// The size is resolved only after decoding, since the clamp needs the
/// native dimensions. When the resolved size equals the native size the
/// decoded image is encoded directly and no second image is allocated.
pub fn render<B: ImageBackend>(
    backend: &B,
    path: &Path,
    size_token: Option<&str>,
    presets: &PresetTable,
    params: &RenderParams,
) -> Result<Rendered, PipelineError> {
    let loaded = backend.load(path).map_err(PipelineError::at(Stage::Load))?;
    let native = backend.dimensions(&loaded);
    let target = resolve_target(size_token, native, presets);

    let resized = if target == native {
        None
    } else {
        Some(
            backend
                .resize(&loaded, target, params.filter)
                .map_err(PipelineError::at(Stage::Resize))?,
        )
    };
    let output = resized.as_ref().unwrap_or(&loaded);

    let encoded = backend
        .encode_png(output, params.compression)
        .map_err(PipelineError::at(Stage::Encode))?;

    // The encoded buffer belongs to the backend; the body must not borrow it.
    let body = copy_out(encoded.as_ref(), params.max_body_bytes)
        .map_err(PipelineError::at(Stage::Allocate))?;

    drop(encoded);
    drop(resized);
    drop(loaded);

    Ok(Rendered {
        body,
        native,
        target,
    })
}

/// Copy `bytes` into a freshly allocated buffer of at most `limit` bytes.
fn copy_out(bytes: &[u8], limit: usize) -> Result<Vec<u8>, BackendError> {
    if bytes.len() > limit {
        return Err(BackendError::ProcessingFailed(format!(
            "Encoded image is {} bytes, limit is {}",
            bytes.len(),
            limit
        )));
    }
    let mut body = Vec::new();
    body.try_reserve_exact(bytes.len()).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to allocate response buffer: {}", e))
    })?;
    body.extend_from_slice(bytes);
    Ok(body)
}
