//! Minimal synchronous HTTP front end built on `tiny_http`.
//!
//! A fixed pool of worker threads pulls requests off one listener. Each
//! worker handles one request at a time, so the pool size bounds the number
//! of capture processes running at once.
//!
//! | Request | Response |
//! |---|---|
//! | `GET <path>[?size=...]` | handler result (200 PNG or 500) |
//! | other method on `<path>` | 405, `Allow: GET` |
//! | any other path | 404 |

use crate::capture::Capture;
use crate::handler::ScreenshotHandler;
use crate::imaging::ImageBackend;
use crate::response::ScreenshotResponse;
use log::{error, info, warn};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response};

/// How often idle workers check for shutdown.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub struct Server<C, B> {
    http: Arc<tiny_http::Server>,
    handler: Arc<ScreenshotHandler<C, B>>,
    path: Arc<str>,
    workers: usize,
}

impl<C, B> Server<C, B>
where
    C: Capture + Send + 'static,
    B: ImageBackend + Send + 'static,
{
    /// Bind the listener. `workers` is clamped to at least one.
    pub fn bind(
        addr: &str,
        path: &str,
        workers: usize,
        handler: ScreenshotHandler<C, B>,
    ) -> Result<Self, ServerError> {
        let http = tiny_http::Server::http(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            http: Arc::new(http),
            handler: Arc::new(handler),
            path: Arc::from(path),
            workers: workers.max(1),
        })
    }

    /// Bound address, useful when binding port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Serve until the process exits.
    pub fn run(self) -> Result<(), ServerError> {
        self.spawn()?.join();
        Ok(())
    }

    /// Start the worker threads and return a handle that can stop them.
    pub fn spawn(self) -> Result<RunningServer, ServerError> {
        let stop = Arc::new(AtomicBool::new(false));
        let addr = self
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown address".to_string());
        info!(
            "serving {} on {} with {} workers",
            self.path, addr, self.workers
        );

        let mut threads = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let http = Arc::clone(&self.http);
            let handler = Arc::clone(&self.handler);
            let path = Arc::clone(&self.path);
            let stop = Arc::clone(&stop);
            let thread = thread::Builder::new()
                .name(format!("screenshot-worker-{id}"))
                .spawn(move || worker_loop(&http, &handler, &path, &stop))?;
            threads.push(thread);
        }

        Ok(RunningServer {
            http: self.http,
            stop,
            threads,
        })
    }
}

/// Handle to a server whose workers are running.
pub struct RunningServer {
    http: Arc<tiny_http::Server>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Stop accepting, let in-flight requests finish, and join the workers.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.join();
    }

    fn join(self) {
        for thread in self.threads {
            if thread.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

fn worker_loop<C: Capture, B: ImageBackend>(
    http: &tiny_http::Server,
    handler: &ScreenshotHandler<C, B>,
    path: &str,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        match http.recv_timeout(ACCEPT_POLL) {
            Ok(Some(request)) => serve(request, handler, path),
            Ok(None) => {}
            Err(e) => {
                error!("listener failed: {}", e);
                return;
            }
        }
    }
}

fn serve<C: Capture, B: ImageBackend>(
    request: Request,
    handler: &ScreenshotHandler<C, B>,
    path: &str,
) {
    let url = request.url().to_string();
    let (request_path, query) = match url.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (url.as_str(), None),
    };

    let response = if request_path != path {
        warn!("404 {} {}", request.method(), url);
        ScreenshotResponse::status(404)
    } else if *request.method() != Method::Get {
        warn!("405 {} {}", request.method(), url);
        ScreenshotResponse::status(405)
    } else {
        handler.handle(query)
    };

    if let Err(e) = request.respond(to_http(response)) {
        warn!("failed to send response for {}: {}", url, e);
    }
}

/// Convert to a `tiny_http` response carrying exactly
/// [`ScreenshotResponse::headers`].
///
/// Bodies are never chunked, whatever their size, so `Content-Length` always
/// matches the body.
fn to_http(response: ScreenshotResponse) -> Response<Cursor<Vec<u8>>> {
    let headers = response.headers();
    let mut http = Response::from_data(response.body)
        .with_status_code(response.status)
        .with_chunked_threshold(usize::MAX);
    // tiny_http takes Content-Length as the data length rather than a header
    for (name, value) in headers {
        add_header(&mut http, name, &value);
    }
    http
}

fn add_header(response: &mut Response<Cursor<Vec<u8>>>, name: &str, value: &str) {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.add_header(header),
        Err(()) => warn!("invalid header {}: {}", name, value),
    }
}
