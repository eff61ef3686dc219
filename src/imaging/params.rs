//! Parameter types for the render pipeline.
//!
//! These describe *what* to produce, not *how*. The
//! [`pipeline`](super::pipeline) hands them to the [`backend`](super::backend),
//! which does the pixel work, so a mock backend can be swapped in without
//! touching pipeline logic.
//!
//! ## Types
//!
//! - [`PngCompression`]: PNG encoder effort (fast / default / best).
//! - [`ResizeFilter`]: Resampling filter used when downscaling.
//! - [`RenderParams`]: Everything [`render`](super::render) needs besides the image itself.

use serde::{Deserialize, Serialize};

/// PNG compression effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

/// Resampling filter for resizes.
///
/// Lanczos3 is the closest to a windowed sinc and the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

/// Knobs for one render, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    pub filter: ResizeFilter,
    pub compression: PngCompression,
    /// Encoded bodies larger than this fail the allocate stage.
    pub max_body_bytes: usize,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            filter: ResizeFilter::default(),
            compression: PngCompression::default(),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}
