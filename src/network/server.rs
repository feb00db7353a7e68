//! HTTP server for the network API.
//!
//! Uses `tiny_http`, which works on both host and ESP32 (via std::net).
//! Requests are handled one at a time on a background thread; each handler
//! locks the connection manager for the duration of its transition.

use super::api::handle_request;
use crate::log_buffer::LogBuffer;
use crate::wifi::{SharedManager, WifiRadio};
use log::{error, info, warn};
use std::io::Read;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

/// Largest accepted request body. Network bodies are a few dozen bytes.
const MAX_BODY_BYTES: u64 = 1024;

/// HTTP API server.
///
/// Runs in a background thread. Drop it to stop the server.
pub struct ApiServer {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    port: u16,
}

impl ApiServer {
    /// Start the API server.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - IP address to bind to (use `None` for 0.0.0.0)
    /// * `port` - Port to listen on (`0` picks a free port)
    /// * `manager` - Connection manager the routes operate on
    /// * `log` - Event log served by `GET /log`
    pub fn start<R: WifiRadio + 'static>(
        bind_addr: Option<IpAddr>,
        port: u16,
        manager: SharedManager<R>,
        log: LogBuffer,
    ) -> Result<Self, std::io::Error> {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(port);

        info!("Network API listening on port {}", port);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("api-server".into())
            .spawn(move || Self::run_server(server, manager, log, shutdown_clone))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            port,
        })
    }

    /// Port the server is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    fn run_server<R: WifiRadio>(
        server: Server,
        manager: SharedManager<R>,
        log: LogBuffer,
        shutdown: Arc<AtomicBool>,
    ) {
        // Pre-create header to avoid repeated allocations
        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("static header");

        loop {
            // Use Acquire ordering to ensure we see the shutdown flag from stop()
            if shutdown.load(Ordering::Acquire) {
                info!("Network API shutting down");
                break;
            }

            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(mut request)) => {
                    let mut body = String::new();
                    if let Err(e) = request
                        .as_reader()
                        .take(MAX_BODY_BYTES)
                        .read_to_string(&mut body)
                    {
                        warn!("Failed to read request body: {}", e);
                        body.clear();
                    }

                    let method = request.method().clone();
                    let url = request.url().to_string();
                    let api_response = handle_request(&manager, &log, &method, &url, &body);
                    info!("{} {} -> {}", method, url, api_response.status);

                    let response = Response::from_string(api_response.body)
                        .with_header(content_type.clone())
                        .with_status_code(api_response.status);
                    if let Err(e) = request.respond(response) {
                        warn!("Failed to send response: {}", e);
                    }
                }
                Ok(None) => {
                    // Timeout, check shutdown flag and continue
                }
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop the server.
    ///
    /// Note: May take up to 100ms due to polling interval, longer if a
    /// connect request is in flight.
    pub fn stop(&mut self) {
        // Use Release ordering to ensure the server thread sees this write
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}
