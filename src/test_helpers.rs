//! Shared test utilities: synthetic frames and fake capture steps.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let handler = ScreenshotHandler::new(
//!     png_capture(1920, 1080),      // always "captures" a 1920x1080 frame
//!     RustBackend::new(),
//!     PresetTable::default(),
//!     RenderParams::default(),
//!     tmp.path(),
//! );
//! ```

use crate::capture::{Capture, CaptureError};
use image::{ImageEncoder, ImageFormat, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// =========================================================================
// Synthetic frames
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a gradient PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write a gradient JPEG with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Fake capture steps
// =========================================================================

fn write_frame(path: &Path, width: u32, height: u32) -> Result<(), CaptureError> {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| CaptureError::Other(e.to_string()))
}

/// A capture that always succeeds with a `width`x`height` frame.
pub fn png_capture(width: u32, height: u32) -> impl Capture {
    move |path: &Path| write_frame(path, width, height)
}

/// A capture that always fails, as if the stream were offline.
pub fn failing_capture() -> impl Capture {
    |_: &Path| -> Result<(), CaptureError> { Err(CaptureError::Other("stream offline".into())) }
}

/// A successful capture that remembers every output path it was given.
pub struct RecordingCapture {
    width: u32,
    height: u32,
    paths: Mutex<Vec<PathBuf>>,
}

impl RecordingCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl Capture for RecordingCapture {
    fn capture(&self, output: &Path) -> Result<(), CaptureError> {
        self.paths.lock().unwrap().push(output.to_path_buf());
        write_frame(output, self.width, self.height)
    }
}
