//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::registry::HttpMethod;

/// An outgoing request to the target API
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a bare GET request, as used for reachability probes
    async fn get(&self, url: &str, timeout: Option<Duration>) -> crate::Result<HttpResponse>;

    /// Send a fully specified request
    async fn send(&self, request: &HttpRequest) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn execute(
        &self,
        label: &str,
        builder: reqwest::RequestBuilder,
    ) -> crate::Result<HttpResponse> {
        let response = builder.send().await.map_err(|e| map_send_error(label, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::CommandCenterError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("{} -> {} ({} bytes)", label, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, timeout: Option<Duration>) -> crate::Result<HttpResponse> {
        let label = format!("GET {}", url);
        tracing::debug!("{}", label);

        let mut builder = self.client.get(url);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        self.execute(&label, builder).await
    }

    async fn send(&self, request: &HttpRequest) -> crate::Result<HttpResponse> {
        let label = format!("{} {}", request.method, request.url);
        tracing::debug!("{}", label);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        self.execute(&label, builder).await
    }
}

fn map_send_error(label: &str, e: reqwest::Error) -> crate::CommandCenterError {
    if e.is_timeout() {
        crate::CommandCenterError::Timeout(format!("{} timed out: {}", label, e))
    } else {
        crate::CommandCenterError::Http(format!("{} failed: {}", label, e))
    }
}
