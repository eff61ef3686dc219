//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (PNG, JPEG) |
//! | **Resize** | `resize_exact` with a configurable filter (Lanczos3 default) |
//! | **Encode** | `PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure size resolution for `?size=` tokens (unit testable)
//! - **Parameters**: Data structures describing a render
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Pipeline**: [`render`], combining calculations + backend with scoped cleanup

pub mod backend;
mod calculations;
mod params;
pub mod pipeline;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{SIZE_RULES, SizeRule, match_size_token, resolve_target};
pub use params::{PngCompression, RenderParams, ResizeFilter};
pub use pipeline::{PipelineError, Rendered, Stage, render};
pub use rust_backend::RustBackend;
