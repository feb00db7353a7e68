//! Network API request handling.
//!
//! Transport-independent: [`handle_request`] maps a method, path and body to
//! a status code and JSON body, so routes are tested without sockets.
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `GET /networks` | - | `[{"ssid":"home","isDefault":true}]` |
//! | `POST /networks` | `{"ssid","password","isDefault"}` | `{"message":"Network added or updated successfully"}` |
//! | `DELETE /networks` | `{"ssid"}` | `{"message":"Network deleted successfully"}` |
//! | `POST /connect` | `{"ssid","password"?}` | `{"message":"Connected successfully","ip":"192.168.1.20"}` |
//! | `GET /status` | - | `{"mode":"connected","ssid":"home","ip":"192.168.1.20",...}` |
//! | `GET /log` | - | `["00:00:01: Started AP mode: TrainController"]` |
//!
//! Errors are `{"error":"..."}` with a 4xx/5xx status.

use crate::config::{ConfigError, NetworkCredential};
use crate::log_buffer::LogBuffer;
use crate::wifi::{ConnectError, ConnectionManager, SharedManager, StoreError, WifiRadio};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::MutexGuard;
use tiny_http::Method;

/// Status code and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    fn message(message: &str) -> Self {
        Self::ok(json!({ "message": message }).to_string())
    }
}

/// Request-level failures.
#[derive(Debug)]
pub enum ApiError {
    /// Body is not valid JSON.
    MalformedRequest,
    /// A required body field is absent.
    MissingField(&'static str),
    /// Supplied credential fails validation.
    InvalidCredential(ConfigError),
    /// SSID not stored.
    NetworkNotFound,
    /// Unknown path.
    NotFound,
    /// Known path, wrong method.
    MethodNotAllowed,
    /// Change kept in memory but not persisted.
    Storage(StoreError),
    /// Connection request failed.
    Connect(ConnectError),
    /// Manager lock poisoned by a panicked handler.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::MalformedRequest | Self::MissingField(_) | Self::InvalidCredential(_) => 400,
            Self::NetworkNotFound | Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Storage(_) | Self::Internal => 500,
            Self::Connect(e) => match e {
                ConnectError::MissingField(_)
                | ConnectError::MissingCredential(_)
                | ConnectError::InvalidCredential(_) => 400,
                ConnectError::Radio(_) => 502,
                ConnectError::AssociationTimeout { .. } => 504,
            },
        }
    }

    /// Message placed in the `error` field.
    pub fn message(&self) -> String {
        match self {
            Self::MalformedRequest => "Invalid JSON".into(),
            Self::MissingField("ssid") => "Missing SSID".into(),
            Self::MissingField(field) => format!("Missing {}", field),
            Self::InvalidCredential(e) => format!("Invalid network: {}", e),
            Self::NetworkNotFound => "Network not found".into(),
            Self::NotFound => "Not found".into(),
            Self::MethodNotAllowed => "Method not allowed".into(),
            Self::Storage(e) => format!("Failed to save networks: {}", e),
            Self::Internal => "Internal error".into(),
            Self::Connect(e) => match e {
                ConnectError::MissingField(_) => "Missing SSID".into(),
                ConnectError::MissingCredential(_) => "Missing password for unknown SSID".into(),
                ConnectError::InvalidCredential(e) => format!("Invalid network: {}", e),
                ConnectError::AssociationTimeout { .. } | ConnectError::Radio(_) => {
                    "Failed to connect, AP mode restarted".into()
                }
            },
        }
    }

    fn into_response(self) -> ApiResponse {
        ApiResponse {
            status: self.status(),
            body: json!({ "error": self.message() }).to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCredential(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::Connect(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConnectError> for ApiError {
    fn from(e: ConnectError) -> Self {
        Self::Connect(e)
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidCredential(e)
    }
}

#[derive(Debug, Default, Deserialize)]
struct NetworkBody {
    ssid: Option<String>,
    password: Option<String>,
    #[serde(rename = "isDefault")]
    is_default: Option<bool>,
}

#[derive(Serialize)]
struct NetworkSummary<'a> {
    ssid: &'a str,
    #[serde(rename = "isDefault")]
    is_default: bool,
}

fn parse_body(body: &str) -> Result<NetworkBody, ApiError> {
    serde_json::from_str(body).map_err(|_| ApiError::MalformedRequest)
}

fn require_ssid(body: &NetworkBody) -> Result<&str, ApiError> {
    match body.ssid.as_deref() {
        Some(ssid) if !ssid.is_empty() => Ok(ssid),
        _ => Err(ApiError::MissingField("ssid")),
    }
}

fn lock<R: WifiRadio>(
    manager: &SharedManager<R>,
) -> Result<MutexGuard<'_, ConnectionManager<R>>, ApiError> {
    manager.lock().map_err(|_| ApiError::Internal)
}

/// Route one request.
pub fn handle_request<R: WifiRadio>(
    manager: &SharedManager<R>,
    log: &LogBuffer,
    method: &Method,
    url: &str,
    body: &str,
) -> ApiResponse {
    let path = url.split('?').next().unwrap_or(url).trim_end_matches('/');

    let result = match (path, method) {
        ("/networks", Method::Get) => list_networks(manager),
        ("/networks", Method::Post) => add_network(manager, body),
        ("/networks", Method::Delete) => delete_network(manager, body),
        ("/connect", Method::Post) => connect(manager, body),
        ("/status", Method::Get) => status(manager),
        ("/log", Method::Get) => Ok(ApiResponse::ok(log.to_json())),
        ("/networks" | "/connect" | "/status" | "/log", _) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::NotFound),
    };

    result.unwrap_or_else(|e| {
        log::debug!("{} {} failed: {}", method, path, e);
        e.into_response()
    })
}

fn list_networks<R: WifiRadio>(manager: &SharedManager<R>) -> Result<ApiResponse, ApiError> {
    let manager = lock(manager)?;
    let summaries: Vec<NetworkSummary<'_>> = manager
        .networks()
        .iter()
        .map(|n| NetworkSummary {
            ssid: &n.ssid,
            is_default: n.is_default,
        })
        .collect();
    let json = serde_json::to_string(&summaries).map_err(|_| ApiError::Internal)?;
    Ok(ApiResponse::ok(json))
}

fn add_network<R: WifiRadio>(
    manager: &SharedManager<R>,
    body: &str,
) -> Result<ApiResponse, ApiError> {
    let body = parse_body(body)?;
    let ssid = require_ssid(&body)?;
    let credential = NetworkCredential::new(
        ssid,
        body.password.clone().unwrap_or_default(),
        body.is_default.unwrap_or(false),
    )?;

    lock(manager)?.add_or_update_network(credential)?;
    Ok(ApiResponse::message("Network added or updated successfully"))
}

fn delete_network<R: WifiRadio>(
    manager: &SharedManager<R>,
    body: &str,
) -> Result<ApiResponse, ApiError> {
    let body = parse_body(body)?;
    let ssid = require_ssid(&body)?;

    if lock(manager)?.delete_network(ssid)? {
        Ok(ApiResponse::message("Network deleted successfully"))
    } else {
        Err(ApiError::NetworkNotFound)
    }
}

fn connect<R: WifiRadio>(manager: &SharedManager<R>, body: &str) -> Result<ApiResponse, ApiError> {
    let body = parse_body(body)?;
    let connected =
        lock(manager)?.request_connect(body.ssid.as_deref(), body.password.as_deref())?;
    Ok(ApiResponse::ok(
        json!({
            "message": "Connected successfully",
            "ip": connected.ip.to_string(),
        })
        .to_string(),
    ))
}

fn status<R: WifiRadio>(manager: &SharedManager<R>) -> Result<ApiResponse, ApiError> {
    let snapshot = lock(manager)?.status();
    let json = serde_json::to_string(&snapshot).map_err(|_| ApiError::Internal)?;
    Ok(ApiResponse::ok(json))
}
