//! Command Center - operations dashboard for a remote HTTP API
//!
//! Sweeps a fixed registry of endpoints for reachability, fires ad-hoc
//! requests against them, and keeps a bounded log and toast list of the
//! outcomes for the dashboard. The target's health and live-queue routes
//! are polled in the background.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod normalizer;
pub mod registry;
pub mod snippet;
pub mod state;
pub mod stats;
pub mod sweeper;
pub mod system;

pub use config::{load_config, Config};
pub use error::{CommandCenterError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::auth::{Credentials, LoginGate};
use crate::dashboard::DashboardState;
use crate::dispatcher::Dispatcher;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::state::StateHandle;
use crate::sweeper::Sweeper;
use crate::system::SystemPoller;

/// Builder for the command center service
pub struct CommandCenterBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    credentials: Option<Option<Credentials>>,
    cancel: Option<CancellationToken>,
}

impl CommandCenterBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            credentials: None,
            cancel: None,
        }
    }

    /// Replace the reqwest client, e.g. with a test double
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Use these login secrets instead of reading the environment
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn build(self) -> Result<CommandCenter> {
        self.config.validate()?;

        let registry = self.config.registry()?;
        tracing::debug!(
            "Registry has {} endpoints in {} categories",
            registry.len(),
            registry.categories().len()
        );

        let state = state::new_state_handle(
            registry,
            self.config.dashboard.log_capacity,
            self.config.dashboard.toast_duration,
        );
        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::new()),
        };
        let credentials = self
            .credentials
            .unwrap_or_else(|| self.config.resolve_secrets());

        let sweeper = Arc::new(Sweeper::new(
            &self.config,
            Arc::clone(&state),
            Arc::clone(&http),
        ));
        let poller = Arc::new(SystemPoller::new(
            &self.config,
            Arc::clone(&state),
            Arc::clone(&http),
        ));
        let dispatcher = Arc::new(Dispatcher::new(&self.config, Arc::clone(&state), http));
        let gate = Arc::new(LoginGate::new(credentials, self.config.auth.secure_cookie));

        Ok(CommandCenter {
            config: self.config,
            state,
            sweeper,
            poller,
            dispatcher,
            gate,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A built command center, ready to serve
pub struct CommandCenter {
    config: Config,
    state: StateHandle,
    sweeper: Arc<Sweeper>,
    poller: Arc<SystemPoller>,
    dispatcher: Arc<Dispatcher>,
    gate: Arc<LoginGate>,
    cancel: CancellationToken,
}

impl CommandCenter {
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn router(&self) -> axum::Router {
        dashboard::build_router(DashboardState {
            state: Arc::clone(&self.state),
            sweeper: Arc::clone(&self.sweeper),
            dispatcher: Arc::clone(&self.dispatcher),
            gate: Arc::clone(&self.gate),
        })
    }

    /// Bind the configured port and serve until ctrl-c or cancellation
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Shutdown signal received");
            cancel_for_signal.cancel();
        });

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.dashboard.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            CommandCenterError::Dashboard(format!(
                "Failed to bind dashboard to port {}: {}",
                self.config.dashboard.port, e
            ))
        })?;

        self.serve(listener).await
    }

    /// Run the sweep and polling loops and serve the dashboard on `listener`
    /// until cancelled
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            "Command center listening on http://{} (target {})",
            addr,
            self.dispatcher.base_url()
        );

        let sweeper = Arc::clone(&self.sweeper);
        let sweep_cancel = self.cancel.clone();
        let on_start = self.config.sweep.on_start;
        let interval = self.config.sweep.interval;
        let sweep_task = tokio::spawn(async move {
            sweeper.run(on_start, interval, sweep_cancel).await;
        });
        let poller = Arc::clone(&self.poller);
        let poll_cancel = self.cancel.clone();
        let poll_task = tokio::spawn(async move {
            poller.run(poll_cancel).await;
        });

        let router = self.router();
        let cancel = self.cancel.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await;

        // The server can also stop on its own; take the background loops down with it
        self.cancel.cancel();
        if let Err(e) = sweep_task.await {
            tracing::warn!("Sweep task ended abnormally: {}", e);
        }
        if let Err(e) = poll_task.await {
            tracing::warn!("Polling task ended abnormally: {}", e);
        }

        served?;
        tracing::info!("Command center stopped");
        Ok(())
    }
}
