//! The block interpreter: walks a service config's blocks in order and
//! produces a terminal verdict.
//!
//! A check is strictly sequential. The interpreter owns the per-check
//! environment (cookies, captures, saved responses); nothing is shared
//! across checks.

use super::config::{Block, ParseType, ServiceConfig};
use super::cookies::parse_cookies;
use super::functions::execute_function;
use super::keycheck::evaluate_key_check;
use super::parse;
use super::substitute::replace_variables;
use crate::http::build_check_client;
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Terminal outcome of one check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckResult {
    pub valid: bool,
    /// HIT / FAIL / ERROR / NO_KEYCHECK / DELEGATED, or whatever label the
    /// keycheck block carries.
    pub status: String,
    /// HTTP status of the most recent REQUEST block, 0 if none ran.
    pub status_code: u16,
    pub captures: HashMap<String, String>,
    pub check_time_seconds: f64,
    pub error_message: Option<String>,
}

pub const STATUS_HIT: &str = "HIT";
pub const STATUS_ERROR: &str = "ERROR";
pub const STATUS_NO_KEYCHECK: &str = "NO_KEYCHECK";
pub const STATUS_DELEGATED: &str = "DELEGATED";

/// Run one check: parse the cookie payload, then interpret the blocks.
///
/// Cancelling `cancel` aborts an in-flight request and surfaces as an ERROR
/// result; PARSE/FUNCTION work between requests runs to completion.
pub async fn execute_config(
    config: &ServiceConfig,
    cookie_content: &str,
    proxy_url: &str,
    cancel: CancellationToken,
) -> CheckResult {
    let start = Instant::now();

    let cookies = match parse_cookies(cookie_content, config.cookie_format()) {
        Ok(cookies) => cookies,
        Err(e) => {
            return error_result(start, 0, HashMap::new(), format!("Cookie parse error: {}", e))
        }
    };

    // Browser-driven configs are not executed here; the external stealth
    // checker owns them.
    if config.wants_browser() {
        log::debug!(
            "[EXECUTOR] {} requires a browser flow, delegating",
            config.name
        );
        return CheckResult {
            valid: false,
            status: STATUS_DELEGATED.to_string(),
            status_code: 0,
            captures: HashMap::new(),
            check_time_seconds: start.elapsed().as_secs_f64(),
            error_message: None,
        };
    }

    let client = match build_check_client(config.timeout, proxy_url) {
        Ok(client) => client,
        Err(e) => return error_result(start, 0, HashMap::new(), e),
    };

    let mut captures: HashMap<String, String> = HashMap::new();
    let mut responses: HashMap<String, String> = HashMap::new();
    let mut last_status: u16 = 0;

    for block in &config.blocks {
        match block {
            Block::Request {
                url,
                method,
                headers,
                body,
                save_response,
            } => {
                let url = replace_variables(url, Some(&cookies), &captures);
                let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
                    .unwrap_or(reqwest::Method::GET);
                log::debug!("[EXECUTOR] {} {} {}", config.name, method, url);

                let mut request = client.request(method, url);
                for (name, value) in headers {
                    request = request
                        .header(name.as_str(), replace_variables(value, Some(&cookies), &captures));
                }
                let body = replace_variables(body, Some(&cookies), &captures);
                if !body.is_empty() {
                    request = request.body(body);
                }

                let send = async {
                    let response = request.send().await?;
                    let status = response.status().as_u16();
                    let text = response.text().await?;
                    Ok::<(u16, String), reqwest::Error>((status, text))
                };

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => {
                        return error_result(
                            start,
                            last_status,
                            captures,
                            "check cancelled by caller".to_string(),
                        );
                    }
                    outcome = send => outcome,
                };

                match outcome {
                    Ok((status, text)) => {
                        last_status = status;
                        if !save_response.is_empty() {
                            responses.insert(save_response.clone(), text);
                        }
                    }
                    Err(e) => {
                        return error_result(
                            start,
                            last_status,
                            captures,
                            format!("Request failed: {}", e),
                        );
                    }
                }
            }

            Block::Parse {
                source,
                parse_type,
                captures: spec,
                left,
                right,
                capture_name,
                recursive,
                case_sensitive,
            } => {
                let response = responses.get(source).map(String::as_str).unwrap_or("");
                match parse_type {
                    ParseType::Json => {
                        captures.extend(parse::parse_json_captures(response, spec));
                    }
                    ParseType::Regex => {
                        captures.extend(parse::parse_regex_captures(response, spec));
                    }
                    ParseType::Lr => {
                        if capture_name.is_empty() {
                            continue;
                        }
                        if *recursive {
                            let all =
                                parse::parse_lr_recursive(response, left, right, *case_sensitive);
                            if !all.is_empty() {
                                captures.insert(capture_name.clone(), all.join("\n"));
                            }
                        } else if let Some(value) =
                            parse::parse_lr(response, left, right, *case_sensitive)
                        {
                            captures.insert(capture_name.clone(), value);
                        }
                    }
                }
            }

            Block::Function {
                function,
                input,
                param1,
                param2,
                save_as,
            } => {
                let input = replace_variables(input, Some(&cookies), &captures);
                let param1 = replace_variables(param1, Some(&cookies), &captures);
                let param2 = replace_variables(param2, Some(&cookies), &captures);
                match execute_function(function, &input, &param1, &param2) {
                    Ok(value) => {
                        captures.insert(save_as.clone(), value);
                    }
                    Err(e) => {
                        return error_result(
                            start,
                            last_status,
                            captures,
                            format!("Function {} failed: {}", function, e),
                        );
                    }
                }
            }

            Block::KeyCheck {
                conditions,
                logic,
                success,
                failure,
            } => {
                let status = evaluate_key_check(conditions, *logic, success, failure, &captures);
                return CheckResult {
                    valid: status == STATUS_HIT,
                    status,
                    status_code: last_status,
                    captures,
                    check_time_seconds: start.elapsed().as_secs_f64(),
                    error_message: None,
                };
            }
        }
    }

    CheckResult {
        valid: false,
        status: STATUS_NO_KEYCHECK.to_string(),
        status_code: last_status,
        captures,
        check_time_seconds: start.elapsed().as_secs_f64(),
        error_message: None,
    }
}

fn error_result(
    start: Instant,
    status_code: u16,
    captures: HashMap<String, String>,
    message: String,
) -> CheckResult {
    CheckResult {
        valid: false,
        status: STATUS_ERROR.to_string(),
        status_code,
        captures,
        check_time_seconds: start.elapsed().as_secs_f64(),
        error_message: Some(message),
    }
}
