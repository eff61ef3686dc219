//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG) | `image::ImageReader` with format sniffing and decoder [`Limits`] |
//! | Resize | `image::DynamicImage::resize_exact` (Lanczos3 by default) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{PngCompression, ResizeFilter};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// Holds the decoder limits applied to every load. Build one at startup and
/// share it; it carries no per-request state.
#[derive(Debug, Clone)]
pub struct RustBackend {
    limits: Limits,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn compression_type(compression: PngCompression) -> CompressionType {
    match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;
    type Encoded = Vec<u8>;

    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let mut reader = ImageReader::open(path)?.with_guessed_format()?;
        reader.limits(self.limits.clone());
        reader.decode().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions::new(image.width(), image.height())
    }

    fn resize(
        &self,
        image: &DynamicImage,
        target: Dimensions,
        filter: ResizeFilter,
    ) -> Result<DynamicImage, BackendError> {
        if target.width == 0 || target.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot resize to {target}"
            )));
        }
        Ok(image.resize_exact(target.width, target.height, filter_type(filter)))
    }

    fn encode_png(
        &self,
        image: &DynamicImage,
        compression: PngCompression,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        let encoder = PngEncoder::new_with_quality(
            &mut buf,
            compression_type(compression),
            PngFilter::Adaptive,
        );
        image
            .write_with_encoder(encoder)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
        Ok(buf)
    }
}
