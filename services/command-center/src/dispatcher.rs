//! Request dispatcher: fires one endpoint with operator supplied inputs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::io::{HttpClient, HttpRequest};
use crate::normalizer::normalize;
use crate::registry::{Endpoint, HttpMethod};
use crate::state::{current_epoch_ms, LogEntry, Reachability, Severity, StateHandle, Toast};

/// Operator input for one dispatch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Raw JSON text; only sent for POST endpoints
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Result of a dispatch as shown in the response viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub data: Value,
    pub status: u16,
    pub duration_ms: u64,
    pub size_bytes: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Join base, path and the non-empty query pairs
pub fn build_url(
    base_url: &str,
    path: &str,
    query: &BTreeMap<String, String>,
) -> crate::Result<String> {
    let mut url = reqwest::Url::parse(&format!("{}{}", base_url, path)).map_err(|e| {
        crate::CommandCenterError::Config(format!("Invalid URL {}{}: {}", base_url, path, e))
    })?;

    let pairs: Vec<_> = query
        .iter()
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url.to_string())
}

/// JSON content type first, then operator headers, which may replace it.
/// An explicitly empty `Content-Type` removes the default.
pub fn build_headers(custom: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    for (name, value) in custom {
        if name.eq_ignore_ascii_case("content-type") && value.is_empty() {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            continue;
        }
        if name.is_empty() || value.is_empty() {
            continue;
        }
        match headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value.clone(),
            None => headers.push((name.clone(), value.clone())),
        }
    }
    headers
}

/// What happened to a dispatched request, before it is recorded
#[derive(Debug)]
enum Outcome {
    Completed { status: u16, data: Value },
    Malformed { status: u16, error: String },
    Unreachable { error: String },
    RejectedBody { error: String },
}

/// Fires single requests and records their outcome
pub struct Dispatcher {
    state: StateHandle,
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(config: &Config, state: StateHandle, http: Arc<dyn HttpClient>) -> Self {
        Self {
            state,
            http,
            base_url: config.base_url(),
            timeout: config.target.request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fire the request and record the outcome in the status board, the log
    /// and, on failure, the toasts. Fails only for unknown endpoints or an
    /// unbuildable URL; every other failure is reported in the response.
    pub async fn dispatch(&self, request: &DispatchRequest) -> crate::Result<ApiResponse> {
        let endpoint = self
            .state
            .registry
            .find(&request.path)
            .cloned()
            .ok_or_else(|| crate::CommandCenterError::UnknownEndpoint(request.path.clone()))?;
        let url = build_url(&self.base_url, &endpoint.path, &request.query)?;

        let body = match endpoint.method {
            HttpMethod::Post => request
                .body
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            HttpMethod::Get => None,
        };

        let started = Instant::now();
        let outcome = match body.as_deref().map(serde_json::from_str::<Value>) {
            Some(Err(e)) => Outcome::RejectedBody {
                error: format!("Request body is not valid JSON: {}", e),
            },
            _ => {
                let http_request = HttpRequest {
                    method: endpoint.method,
                    url,
                    headers: build_headers(&request.headers),
                    body,
                    timeout: self.timeout,
                };
                self.fire(&http_request).await
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        Ok(self.record(&endpoint, outcome, duration_ms).await)
    }

    async fn fire(&self, request: &HttpRequest) -> Outcome {
        match self.http.send(request).await {
            Ok(response) => match serde_json::from_str::<Value>(&response.body) {
                Ok(data) => Outcome::Completed {
                    status: response.status,
                    data,
                },
                Err(e) => Outcome::Malformed {
                    status: response.status,
                    error: format!("Invalid JSON response: {}", e),
                },
            },
            Err(e) => Outcome::Unreachable {
                error: e.to_string(),
            },
        }
    }

    async fn record(&self, endpoint: &Endpoint, outcome: Outcome, duration_ms: u64) -> ApiResponse {
        let path = endpoint.path.as_str();
        let method = endpoint.method;
        let reached_target = !matches!(outcome, Outcome::RejectedBody { .. });

        let (response, entry, toast) = match outcome {
            Outcome::Completed { status, data } => {
                let success = (200..300).contains(&status);
                let size_bytes = data.to_string().len();
                if success {
                    let entry = LogEntry::new(
                        Severity::Success,
                        path,
                        method,
                        status,
                        format!("{} in {} ms", status, duration_ms),
                    );
                    let response = ApiResponse {
                        data,
                        status,
                        duration_ms,
                        size_bytes,
                        success,
                        error: None,
                        hint: None,
                    };
                    (response, entry, None)
                } else {
                    let normalized = normalize(&data);
                    let severity = if (400..500).contains(&status) {
                        Severity::Warning
                    } else {
                        Severity::Error
                    };
                    let entry = LogEntry::new(severity, path, method, status, &normalized.message)
                        .with_hint(normalized.hint.clone());
                    let toast = Toast::new(severity, format!("HTTP {}", status), &normalized.message)
                        .with_endpoint(path)
                        .with_status(status);
                    let response = ApiResponse {
                        data,
                        status,
                        duration_ms,
                        size_bytes,
                        success,
                        error: Some(normalized.message),
                        hint: normalized.hint,
                    };
                    (response, entry, Some(toast))
                }
            }
            Outcome::Malformed { status, error } => {
                let entry = LogEntry::new(Severity::Error, path, method, status, &error);
                let toast = Toast::new(Severity::Error, "Invalid response", &error)
                    .with_endpoint(path)
                    .with_status(status);
                (failed(status, duration_ms, error), entry, Some(toast))
            }
            Outcome::Unreachable { error } => {
                let message = format!("Connection failed: {}", error);
                let entry = LogEntry::new(Severity::Error, path, method, 0, &message);
                let toast = Toast::new(Severity::Error, "Connection error", &message).with_endpoint(path);
                (failed(0, duration_ms, message), entry, Some(toast))
            }
            Outcome::RejectedBody { error } => {
                let entry = LogEntry::new(Severity::Warning, path, method, 0, &error);
                let toast = Toast::new(Severity::Warning, "Invalid request body", &error).with_endpoint(path);
                (failed(0, duration_ms, error), entry, Some(toast))
            }
        };

        if response.success {
            tracing::debug!("{} {} -> {} in {} ms", method, path, response.status, duration_ms);
        } else {
            tracing::warn!(
                "{} {} failed ({}): {}",
                method,
                path,
                response.status,
                entry.message
            );
        }

        // A rejected body never reached the target, so reachability is unchanged
        if reached_target {
            let online = if response.success {
                Reachability::Online
            } else {
                Reachability::Offline
            };
            let http_status = (response.status != 0).then_some(response.status);
            self.state
                .statuses
                .write()
                .await
                .record(path, online, http_status, current_epoch_ms());
        }

        self.state
            .log
            .write()
            .await
            .push(entry.with_duration(duration_ms));
        if let Some(toast) = toast {
            self.state.toasts.write().await.push(toast, Instant::now());
        }

        response
    }
}

fn failed(status: u16, duration_ms: u64, error: String) -> ApiResponse {
    ApiResponse {
        data: Value::Null,
        status,
        duration_ms,
        size_bytes: 0,
        success: false,
        error: Some(error),
        hint: None,
    }
}
