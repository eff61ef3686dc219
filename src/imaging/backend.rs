//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the render pipeline
//! needs: load, dimensions, resize and PNG encode. Images and encoded buffers
//! are associated types owned by the caller, so every intermediate is released
//! exactly once when it goes out of scope, whichever stage fails.
//!
//! A backend is built once at startup and shared by reference across worker
//! threads. Process-wide decoder state (such as allocation limits) lives in the
//! backend value, not in per-request code.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{PngCompression, ResizeFilter};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// A decoded image. Dropping it releases its pixels.
    type Image;
    /// An encoded buffer owned by the backend.
    type Encoded: AsRef<[u8]>;

    /// Decode the image at `path`.
    fn load(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Native size of a decoded image.
    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Produce a new image scaled to exactly `target`.
    fn resize(
        &self,
        image: &Self::Image,
        target: Dimensions,
        filter: ResizeFilter,
    ) -> Result<Self::Image, BackendError>;

    /// Encode as PNG.
    fn encode_png(
        &self,
        image: &Self::Image,
        compression: PngCompression,
    ) -> Result<Self::Encoded, BackendError>;
}
