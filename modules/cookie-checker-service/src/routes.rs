//! Axum route handlers for the cookie checker RPC API.

use crate::config_store;
use crate::engine::executor::execute_config;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use cookie_checker_types::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub configs_dir: PathBuf,
    pub start_time: Instant,
}

/// Message returned when a request asks for the browser-driven checker.
const USE_PYTHON_STEALTH: &str = "USE_PYTHON_STEALTH";

// =====================================================
// Check Endpoints
// =====================================================

// POST /rpc/check
pub async fn check_cookie(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CookieCheckRequest>,
) -> (StatusCode, Json<RpcResponse<CookieCheckResponse>>) {
    let response = run_check(&state, request).await;
    (StatusCode::OK, Json(RpcResponse::ok(response)))
}

// POST /rpc/check/batch
//
// Server-streaming: one NDJSON line per completed check, in request order.
pub async fn check_batch(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<BatchCheckRequest>,
) -> Response {
    let stream = futures_util::stream::unfold(
        (batch.requests.into_iter(), state),
        |(mut requests, state)| async move {
            let request = requests.next()?;
            let response = run_check(&state, request).await;
            let mut line =
                serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
            line.push('\n');
            Some((
                Ok::<Bytes, std::convert::Infallible>(Bytes::from(line)),
                (requests, state),
            ))
        },
    );

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Run one check end to end: stealth short-circuit, config load, execution.
async fn run_check(state: &AppState, request: CookieCheckRequest) -> CookieCheckResponse {
    if request.use_stealth {
        return CookieCheckResponse {
            service: request.service,
            file_path: request.file_path,
            valid: false,
            status_code: 0,
            message: USE_PYTHON_STEALTH.to_string(),
            check_time: 0.0,
            extracted_data: "{}".to_string(),
        };
    }

    let config = match config_store::load_config(&state.configs_dir, &request.service) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("[COOKIE_CHECKER] {}: {}", request.service, e);
            return CookieCheckResponse {
                service: request.service,
                file_path: request.file_path,
                valid: false,
                status_code: 0,
                message: format!("Config error: {}", e),
                check_time: 0.0,
                extracted_data: "{}".to_string(),
            };
        }
    };

    let result = execute_config(
        &config,
        &request.cookies,
        &request.proxy,
        CancellationToken::new(),
    )
    .await;

    if let Some(ref message) = result.error_message {
        log::debug!(
            "[COOKIE_CHECKER] {} finished with error: {}",
            request.service,
            message
        );
    }

    let extracted_data =
        serde_json::to_string(&result.captures).unwrap_or_else(|_| "{}".to_string());

    CookieCheckResponse {
        service: request.service,
        file_path: request.file_path,
        valid: result.valid,
        status_code: result.status_code,
        message: result.status,
        check_time: result.check_time_seconds,
        extracted_data,
    }
}

// =====================================================
// Service Endpoints
// =====================================================

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let status = ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        configs_dir: state.configs_dir.display().to_string(),
        available_configs: config_store::count_configs(&state.configs_dir),
    };
    (StatusCode::OK, Json(RpcResponse::ok(status)))
}
