//! BDD test world for the command center service

use std::sync::Arc;
use std::time::Duration;

use cucumber::World;
use tokio::sync::RwLock;

use command_center::config::Config;
use command_center::dispatcher::{ApiResponse, Dispatcher};
use command_center::io::{HttpClient, HttpRequest, HttpResponse};
use command_center::normalizer::NormalizedError;
use command_center::registry::{Endpoint, HttpMethod, Registry};
use command_center::state::{new_state_handle, RequestLog, StateHandle};
use command_center::sweeper::{SweepGuard, SweepSummary, Sweeper};

pub const TARGET: &str = "http://target.test";

// --- Test doubles ---

/// Canned behavior for one target path
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond { status: u16, body: String },
    Fail(String),
}

/// An HTTP client that answers from a script and records every call.
/// Unscripted paths answer 200 with an empty object.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    pub script: RwLock<Vec<(String, Scripted)>>,
    pub probes: RwLock<Vec<String>>,
    pub requests: RwLock<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub async fn script(&self, path: &str, scripted: Scripted) {
        self.script.write().await.push((path.to_string(), scripted));
    }

    async fn answer(&self, url: &str) -> command_center::Result<HttpResponse> {
        let path = url
            .strip_prefix(TARGET)
            .unwrap_or(url)
            .split('?')
            .next()
            .unwrap_or_default();
        let scripted = self
            .script
            .read()
            .await
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, s)| s.clone());

        match scripted {
            Some(Scripted::Respond { status, body }) => Ok(HttpResponse { status, body }),
            Some(Scripted::Fail(reason)) => Err(command_center::CommandCenterError::Http(reason)),
            None => Ok(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(
        &self,
        url: &str,
        _timeout: Option<Duration>,
    ) -> command_center::Result<HttpResponse> {
        self.probes.write().await.push(url.to_string());
        self.answer(url).await
    }

    async fn send(&self, request: &HttpRequest) -> command_center::Result<HttpResponse> {
        self.requests.write().await.push(request.clone());
        self.answer(&request.url).await
    }
}

#[derive(Debug, Default, World)]
pub struct CommandCenterWorld {
    // Target and registry
    pub http: Arc<ScriptedHttpClient>,
    pub endpoints: Vec<Endpoint>,
    pub state: Option<StateHandle>,

    // Sweep testing
    pub sweeper: Option<Arc<Sweeper>>,
    pub held_sweep: Option<SweepGuard>,
    pub sweep_summary: Option<SweepSummary>,
    pub sweep_error: Option<String>,

    // Dispatch testing
    pub dispatcher: Option<Dispatcher>,
    pub response: Option<ApiResponse>,
    pub dispatch_error: Option<String>,

    // Normalizer testing
    pub normalized: Option<NormalizedError>,

    // Log testing
    pub log: Option<RequestLog>,

    // Login and dashboard testing
    pub credentials: Option<(String, String)>,
    pub http_status: Option<u16>,
    pub set_cookie: Option<String>,
    pub body: Option<serde_json::Value>,

    // Lifecycle testing
    pub config: Option<Config>,
    pub build_succeeded: Option<bool>,
    pub serve_succeeded: Option<bool>,
}

impl CommandCenterWorld {
    pub fn config(&self) -> Config {
        let mut config = self.config.clone().unwrap_or_default();
        config.target.base_url = TARGET.to_string();
        config.sweep.delay = Duration::from_millis(1);
        config.sweep.on_start = false;
        config.system.health_interval = None;
        config.system.queue_interval = None;
        config
    }

    pub fn add_endpoint(&mut self, method: HttpMethod, path: &str) {
        if self.endpoints.iter().any(|e| e.path == path) {
            return;
        }
        self.endpoints.push(Endpoint {
            path: path.to_string(),
            method,
            category: "kern".to_string(),
            name: String::new(),
            description: String::new(),
        });
    }

    /// Shared state over the scenario's registry, created on first use
    pub fn state(&mut self) -> StateHandle {
        if self.state.is_none() {
            let registry = Registry::new(self.endpoints.clone()).expect("valid registry");
            self.state = Some(new_state_handle(registry, 50, Duration::from_secs(8)));
        }
        Arc::clone(self.state.as_ref().expect("state"))
    }

    pub fn sweeper(&mut self) -> Arc<Sweeper> {
        if self.sweeper.is_none() {
            let state = self.state();
            let http: Arc<dyn HttpClient> = self.http.clone();
            self.sweeper = Some(Arc::new(Sweeper::new(&self.config(), state, http)));
        }
        Arc::clone(self.sweeper.as_ref().expect("sweeper"))
    }

    pub fn dispatcher(&mut self) -> &Dispatcher {
        if self.dispatcher.is_none() {
            let state = self.state();
            let http: Arc<dyn HttpClient> = self.http.clone();
            self.dispatcher = Some(Dispatcher::new(&self.config(), state, http));
        }
        self.dispatcher.as_ref().expect("dispatcher")
    }
}
