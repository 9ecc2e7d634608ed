//! Shared types for the cookie checker service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// RPC Request Types
// =====================================================

/// One cookie-validation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieCheckRequest {
    /// Service name; resolved to `<configs dir>/<lowercased name>.json`.
    pub service: String,
    /// Opaque to the checker; echoed back so callers can correlate results.
    #[serde(default)]
    pub file_path: String,
    /// Raw cookie payload (json / netscape / header format).
    pub cookies: String,
    /// Optional HTTP proxy URL, empty for direct.
    #[serde(default)]
    pub proxy: String,
    /// Delegate to the external browser-driven checker instead of running here.
    #[serde(default)]
    pub use_stealth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckRequest {
    pub requests: Vec<CookieCheckRequest>,
}

// =====================================================
// RPC Response Types
// =====================================================

/// Outcome of one cookie check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieCheckResponse {
    pub service: String,
    pub file_path: String,
    pub valid: bool,
    /// HTTP status of the most recent REQUEST block, 0 if none ran.
    pub status_code: u16,
    /// Terminal status: HIT / FAIL / ERROR / NO_KEYCHECK / DELEGATED /
    /// USE_PYTHON_STEALTH, or whatever label the keycheck block carries.
    pub message: String,
    pub check_time: f64,
    /// JSON-encoded captures map.
    pub extracted_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub configs_dir: String,
    /// Number of `.json` configs currently present in the configs directory.
    pub available_configs: usize,
}
