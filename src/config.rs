//! Service configuration.
//!
//! Two files configure a running service:
//!
//! ```text
//! config.toml        # listener, capture tool, output encoding (this module)
//! screenshot.conf    # `screenshot` / `screenshot_sizes` directives (see directives)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! listen = "127.0.0.1:8080"   # Address the HTTP listener binds
//! path = "/screenshot"        # Request path served by the handler
//! workers = 4                 # Requests handled concurrently
//!
//! [capture]
//! program = "ffmpeg"          # ffmpeg or avconv
//! stream = "rtmp://127.0.0.1:1935"
//! analyze_duration = 1000     # Passed as -analyzeduration
//! timeout_secs = 10           # Capture is killed after this long
//! # temp_dir = "/tmp"         # Per-request workspaces (default: system temp dir)
//!
//! [output]
//! compression = "default"     # fast | default | best
//! filter = "lanczos3"         # nearest | triangle | catmull-rom | gaussian | lanczos3
//! max_bytes = 33554432        # Largest response body served
//!
//! [screenshot]
//! # directives = "screenshot.conf"  # Relative to this file
//! ```
//!
//! Unknown keys are rejected to catch typos early. Every error in this module
//! is fatal at startup; the service never runs with a partial configuration.

use crate::directives::load_directives;
use crate::imaging::{PngCompression, RenderParams, ResizeFilter};
use crate::presets::PresetTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up next to `config.toml` when `screenshot.directives` is unset.
pub const DEFAULT_DIRECTIVES_FILE: &str = "screenshot.conf";

/// Longest capture timeout accepted from `config.toml`.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("{location}: {message}")]
    Directive { location: Location, message: String },
}

impl ConfigError {
    pub fn directive(location: &Location, message: impl Into<String>) -> Self {
        Self::Directive {
            location: location.clone(),
            message: message.into(),
        }
    }
}

/// Position of a directive in its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: String,
    pub line: usize,
}

impl Location {
    pub fn new(source: impl Into<String>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Capture tool invocation.
    pub capture: CaptureConfig,
    /// PNG encoding and response limits.
    pub output: OutputConfig,
    /// Location of the directive file.
    pub screenshot: ScreenshotConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::Validation(
                "server.workers must be at least 1".into(),
            ));
        }
        if !self.server.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "server.path must start with '/'".into(),
            ));
        }
        if self.capture.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "capture.program must not be empty".into(),
            ));
        }
        if self.capture.stream.trim().is_empty() {
            return Err(ConfigError::Validation(
                "capture.stream must not be empty".into(),
            ));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.capture.timeout_secs) {
            return Err(ConfigError::Validation(format!(
                "capture.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.output.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "output.max_bytes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:8080"`.
    pub listen: String,
    /// Path served by the screenshot handler. Other paths get 404.
    pub path: String,
    /// Worker threads, which is also the limit on in-flight captures.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            path: "/screenshot".to_string(),
            workers: 4,
        }
    }
}

/// Capture tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Executable name or path (`ffmpeg` or `avconv`).
    pub program: String,
    /// Stream source URI handed to `-i`.
    pub stream: String,
    /// Value for `-analyzeduration`.
    pub analyze_duration: u32,
    /// Seconds before a capture is killed.
    pub timeout_secs: u64,
    /// Parent directory for per-request workspaces. Defaults to the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl CaptureConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            stream: "rtmp://127.0.0.1:1935".to_string(),
            analyze_duration: 1000,
            timeout_secs: 10,
            temp_dir: None,
        }
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// PNG compression level.
    pub compression: PngCompression,
    /// Resampling filter used when a smaller size is requested.
    pub filter: ResizeFilter,
    /// Largest encoded body the service will copy into a response.
    pub max_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression: PngCompression::default(),
            filter: ResizeFilter::default(),
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

impl OutputConfig {
    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            filter: self.filter,
            compression: self.compression,
            max_body_bytes: self.max_bytes,
        }
    }
}

/// Directive file settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotConfig {
    /// Path to the directive file, relative to `config.toml`.
    ///
    /// When unset, `screenshot.conf` next to `config.toml` is used if it
    /// exists. When set, the file must exist.
    pub directives: Option<PathBuf>,
}

/// Load and validate `config.toml`.
///
/// A missing file yields the defaults. Invalid TOML, unknown keys, and
/// out-of-range values are errors.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        let config = ServiceConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Build the preset table named by `config`, resolving paths against the
/// directory of `config_path`.
pub fn load_presets(
    config: &ServiceConfig,
    config_path: &Path,
) -> Result<PresetTable, ConfigError> {
    let base = config_path.parent().unwrap_or_else(|| Path::new(""));
    match &config.screenshot.directives {
        Some(directives) => load_directives(&base.join(directives)),
        None => {
            let fallback = base.join(DEFAULT_DIRECTIVES_FILE);
            if fallback.exists() {
                load_directives(&fallback)
            } else {
                Ok(PresetTable::default())
            }
        }
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# stream-screenshot configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP listener
# ---------------------------------------------------------------------------
[server]
# Address to bind.
listen = "127.0.0.1:8080"

# Path that serves screenshots. GET <path>?size=low|medium|hi|hd|<preset>
path = "/screenshot"

# Worker threads. Each handles one request at a time, so this also caps
# the number of capture processes running at once.
workers = 4

# ---------------------------------------------------------------------------
# Frame capture
# ---------------------------------------------------------------------------
[capture]
# Capture tool. Anything accepting ffmpeg-style arguments works (ffmpeg, avconv).
program = "ffmpeg"

# Stream to grab frames from.
stream = "rtmp://127.0.0.1:1935"

# Passed to the tool as -analyzeduration. Lower values return sooner.
analyze_duration = 1000

# The capture process is killed if it runs longer than this (at most 3600).
timeout_secs = 10

# Directory for per-request workspaces. Defaults to the system temp dir.
# temp_dir = "/var/tmp/screenshots"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# PNG compression: fast, default, or best.
compression = "default"

# Resampling filter for downscaling:
# nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# Responses larger than this many bytes fail with 500.
max_bytes = 33554432

# ---------------------------------------------------------------------------
# Size directives
# ---------------------------------------------------------------------------
[screenshot]
# File with `screenshot` and `screenshot_sizes` directives, relative to
# this file. When unset, screenshot.conf next to this file is used if present.
#
#   screenshot small medium;
#   screenshot_sizes {
#       thumb 160 90;
#   }
#
# directives = "screenshot.conf"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::SizeClasses;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.server.path, "/screenshot");
        assert_eq!(config.server.workers, 4);
        assert_eq!(config.capture.program, "ffmpeg");
        assert_eq!(config.capture.timeout(), Duration::from_secs(10));
        assert_eq!(config.output.max_bytes, 32 * 1024 * 1024);
        assert!(config.screenshot.directives.is_none());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ServiceConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ServiceConfig::default();
        assert_eq!(config.server.listen, defaults.server.listen);
        assert_eq!(config.capture.stream, defaults.capture.stream);
        assert_eq!(config.output.compression, defaults.output.compression);
        assert_eq!(config.output.filter, defaults.output.filter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[capture]
stream = "rtmp://camera.local/live/lobby"
timeout_secs = 3
"#;
        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.capture.stream, "rtmp://camera.local/live/lobby");
        assert_eq!(config.capture.timeout(), Duration::from_secs(3));
        // Unspecified defaults preserved
        assert_eq!(config.capture.program, "ffmpeg");
        assert_eq!(config.server.workers, 4);
    }

    #[test]
    fn render_params_follow_output_section() {
        let mut config = ServiceConfig::default();
        config.output.max_bytes = 1024;
        config.output.filter = ResizeFilter::Nearest;
        let params = config.output.render_params();
        assert_eq!(params.max_body_bytes, 1024);
        assert_eq!(params.filter, ResizeFilter::Nearest);
        assert_eq!(params.compression, PngCompression::Default);
    }

    #[test]
    fn parse_output_enums() {
        let toml = r#"
[output]
compression = "best"
filter = "catmull-rom"
"#;
        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output.compression, PngCompression::Best);
        assert_eq!(config.output.filter, ResizeFilter::CatmullRom);
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = r#"
[server]
listne = "0.0.0.0:80"
"#;
        let result: Result<ServiceConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str("[cache]\nenabled = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_filter_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str("[output]\nfilter = \"sinc\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = ServiceConfig::default();
        config.server.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_relative_path() {
        let mut config = ServiceConfig::default();
        config.server.path = "screenshot".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ServiceConfig::default();
        config.capture.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_huge_timeout() {
        let mut config = ServiceConfig::default();
        config.capture.timeout_secs = MAX_TIMEOUT_SECS;
        assert!(config.validate().is_ok());

        config.capture.timeout_secs = i64::MAX as u64;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_rejects_huge_timeout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[capture]\ntimeout_secs = 9223372036854775807\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_empty_stream() {
        let mut config = ServiceConfig::default();
        config.capture.stream = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_bytes() {
        let mut config = ServiceConfig::default();
        config.output.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config / load_presets tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.server.path, "/screenshot");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[server]\nworkers = 2\npath = \"/snap\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.workers, 2);
        assert_eq!(config.server.path, "/snap");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[server\nworkers = 2\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[server]\nworkers = 0\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_presets_default_when_no_directives_file() {
        let tmp = TempDir::new().unwrap();
        let config = ServiceConfig::default();
        let table = load_presets(&config, &tmp.path().join("config.toml")).unwrap();
        assert_eq!(table, PresetTable::default());
    }

    #[test]
    fn load_presets_picks_up_sibling_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_DIRECTIVES_FILE),
            "screenshot small;\nscreenshot_sizes { thumb 160 90; }\n",
        )
        .unwrap();

        let config = ServiceConfig::default();
        let table = load_presets(&config, &tmp.path().join("config.toml")).unwrap();
        assert_eq!(table.enabled(), SizeClasses::SMALL);
        assert!(table.find("thumb").is_some());
    }

    #[test]
    fn load_presets_explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        config.screenshot.directives = Some("sizes/lobby.conf".into());

        let result = load_presets(&config, &tmp.path().join("config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_presets_explicit_path_relative_to_config() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sizes")).unwrap();
        fs::write(
            tmp.path().join("sizes/lobby.conf"),
            "screenshot_sizes { lobby 800 450; }\n",
        )
        .unwrap();
        let mut config = ServiceConfig::default();
        config.screenshot.directives = Some("sizes/lobby.conf".into());

        let table = load_presets(&config, &tmp.path().join("config.toml")).unwrap();
        assert_eq!(table.find("lobby").map(|p| p.height), Some(450));
    }

    #[test]
    fn directive_error_names_location() {
        let err = ConfigError::directive(&Location::new("screenshot.conf", 12), "bad thing");
        assert_eq!(err.to_string(), "screenshot.conf:12: bad thing");
    }
}
