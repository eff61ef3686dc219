//! CLI output formatting for `check` and `snap`.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Server
//!     listen: 127.0.0.1:8080
//!     path: /screenshot
//!     workers: 4
//! Capture
//!     ffmpeg rtmp://127.0.0.1:1935
//!     timeout: 10s
//!     workspaces: /tmp
//! Output
//!     filter: lanczos3
//!     compression: default
//!     max body: 33554432 bytes
//! Sizes (enabled: small medium)
//!     low  320x180 (small)
//!     med  640x360 (medium)
//!     hi   960x540 (large, disabled)
//!     hd   1280x720 (large, disabled)
//! Presets
//!     001 thumb 160x90
//!     002 wide 1280x720
//! ```
//!
//! ## Snap
//!
//! ```text
//! 1920x1080 → 960x540 (48213 bytes) → frame.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::config::ServiceConfig;
use crate::imaging::{PngCompression, Rendered, ResizeFilter, SIZE_RULES};
use crate::presets::{PresetTable, SizeClasses};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn class_name(class: SizeClasses) -> &'static str {
    class.names().first().copied().unwrap_or("none")
}

fn filter_name(filter: ResizeFilter) -> &'static str {
    match filter {
        ResizeFilter::Nearest => "nearest",
        ResizeFilter::Triangle => "triangle",
        ResizeFilter::CatmullRom => "catmull-rom",
        ResizeFilter::Gaussian => "gaussian",
        ResizeFilter::Lanczos3 => "lanczos3",
    }
}

fn compression_name(compression: PngCompression) -> &'static str {
    match compression {
        PngCompression::Fast => "fast",
        PngCompression::Default => "default",
        PngCompression::Best => "best",
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the effective configuration and size table.
pub fn format_check_output(config: &ServiceConfig, presets: &PresetTable) -> Vec<String> {
    let mut lines = vec![
        "Server".to_string(),
        format!("    listen: {}", config.server.listen),
        format!("    path: {}", config.server.path),
        format!("    workers: {}", config.server.workers),
        "Capture".to_string(),
        format!("    {} {}", config.capture.program, config.capture.stream),
        format!("    timeout: {}s", config.capture.timeout_secs),
        format!(
            "    workspaces: {}",
            config.capture.effective_temp_dir().display()
        ),
        "Output".to_string(),
        format!("    filter: {}", filter_name(config.output.filter)),
        format!(
            "    compression: {}",
            compression_name(config.output.compression)
        ),
        format!("    max body: {} bytes", config.output.max_bytes),
    ];

    lines.extend(format_size_table(presets));
    lines
}

/// Built-in sizes with their enabled state, then declared presets.
pub fn format_size_table(presets: &PresetTable) -> Vec<String> {
    let mut lines = vec![format!(
        "Sizes (enabled: {})",
        presets.enabled().names().join(" ")
    )];

    for rule in SIZE_RULES {
        let state = if presets.is_enabled(rule.class) {
            String::new()
        } else {
            ", disabled".to_string()
        };
        lines.push(format!(
            "    {:<4} {}x{} ({}{})",
            rule.prefix,
            rule.width,
            rule.height,
            class_name(rule.class),
            state
        ));
    }

    if !presets.presets().is_empty() {
        lines.push("Presets".to_string());
        for (i, preset) in presets.presets().iter().enumerate() {
            lines.push(format!("    {} {}", format_index(i + 1), preset));
        }
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(config: &ServiceConfig, presets: &PresetTable) {
    for line in format_check_output(config, presets) {
        println!("{}", line);
    }
}

// ============================================================================
// snap
// ============================================================================

/// One line describing a rendered snapshot and where it went.
pub fn format_snap_output(rendered: &Rendered, out: &Path) -> String {
    format!(
        "{} \u{2192} {} ({} bytes) \u{2192} {}",
        rendered.native,
        rendered.target,
        rendered.body.len(),
        out.display()
    )
}

/// Print snap output to stdout.
pub fn print_snap_output(rendered: &Rendered, out: &Path) {
    println!("{}", format_snap_output(rendered, out));
}

// ============================================================================
// Tests
// ============================================================================
