//! # Stream Screenshot
//!
//! An HTTP service that returns a PNG still of a live video stream. Each
//! `GET /screenshot?size=...` grabs one fresh frame with an external capture
//! tool, optionally downscales it, and returns it as `image/png`.
//!
//! # Request Flow
//!
//! ```text
//! 1. Route     GET <path>?size=hi      →  handler        (other paths 404, other methods 405)
//! 2. Capture   ffmpeg -i <stream>      →  frame.png      (unique workspace per request)
//! 3. Render    frame.png               →  PNG bytes      (load → resize → encode)
//! 4. Respond   200 image/png, or an empty 500 on any failure
//! ```
//!
//! Everything a request allocates (workspace, decoded images, encoded buffer)
//! is owned by that request and released before the response is sent, on the
//! success path and on every failure path.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`server`] | `tiny_http` listener, worker pool, routing |
//! | [`handler`] | One request: workspace, capture, render, response |
//! | [`capture`] | [`capture::Capture`] trait and the ffmpeg/avconv implementation |
//! | [`imaging`] | Size resolution, `image`-based backend, render pipeline |
//! | [`presets`] | Named sizes and the enabled-size mask |
//! | [`directives`] | Parser for the `screenshot` / `screenshot_sizes` directive file |
//! | [`response`] | Outcome to status, headers and body |
//! | [`config`] | `config.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Size Vocabulary
//!
//! | `?size=` starts with | Size | Class |
//! |---|---|---|
//! | `low` | 320x180 | small |
//! | `med` | 640x360 | medium |
//! | `hi` | 960x540 | large |
//! | `hd` | 1280x720 | large |
//!
//! A built-in token is honoured only when its class is enabled by the
//! `screenshot` directive. Any other value is looked up as a preset name from
//! `screenshot_sizes`. Sizes never exceed the captured frame, so a small
//! stream is served at its native size.

pub mod capture;
pub mod config;
pub mod directives;
pub mod handler;
pub mod imaging;
pub mod output;
pub mod presets;
pub mod response;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers;
