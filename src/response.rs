//! Mapping a request's outcome to status, headers and body.
//!
//! A [`ScreenshotResponse`] is built once per request, after the outcome is
//! fully known, so nothing reaches the client before the body is ready.
//! Failures become a bare 500: the stage and cause are logged, never sent.

use crate::handler::ScreenshotError;
use crate::imaging::Rendered;
use log::{debug, error};

pub const CONTENT_TYPE_PNG: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl ScreenshotResponse {
    pub fn from_outcome(outcome: Result<Rendered, ScreenshotError>) -> Self {
        match outcome {
            Ok(rendered) => {
                debug!(
                    "screenshot {} -> {} ({} bytes)",
                    rendered.native,
                    rendered.target,
                    rendered.body.len()
                );
                Self::png(rendered.body)
            }
            Err(e) => {
                error!("screenshot failed at {} stage: {}", e.stage(), e);
                Self::status(500)
            }
        }
    }

    /// 200 with a PNG body.
    pub fn png(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some(CONTENT_TYPE_PNG),
            body,
        }
    }

    /// A status with an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Headers in the order they are written. The server sends exactly these.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(3);
        if let Some(content_type) = self.content_type {
            headers.push(("Content-Type", content_type.to_string()));
        }
        if self.status == 405 {
            headers.push(("Allow", "GET".to_string()));
        }
        headers.push(("Content-Length", self.content_length().to_string()));
        headers
    }
}
