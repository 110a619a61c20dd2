//! Configuration types for the command center service

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::registry::{Endpoint, Registry};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Replaces the built-in registry when set
    #[serde(default)]
    pub endpoints: Option<Vec<Endpoint>>,
}

/// The remote API being inspected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for ad-hoc dispatches; `None` waits for the client default
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: None,
        }
    }
}

/// Health sweep pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Pause between consecutive probes
    #[serde(default = "default_sweep_delay", with = "humantime_serde")]
    pub delay: Duration,
    /// Per-probe timeout; `None` waits indefinitely
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Option<Duration>,
    #[serde(default = "default_true")]
    pub on_start: bool,
    /// Re-sweep period; `None` sweeps only on start and on demand
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delay: default_sweep_delay(),
            probe_timeout: default_probe_timeout(),
            on_start: true,
            interval: None,
        }
    }
}

/// Background polling of the target's health and live-queue routes.
/// `None` disables a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_health_interval", with = "humantime_serde")]
    pub health_interval: Option<Duration>,
    #[serde(default = "default_queue_interval", with = "humantime_serde")]
    pub queue_interval: Option<Duration>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            health_interval: default_health_interval(),
            queue_interval: default_queue_interval(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default = "default_toast_duration", with = "humantime_serde")]
    pub toast_duration: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: default_dashboard_port(),
            log_capacity: default_log_capacity(),
            toast_duration: default_toast_duration(),
        }
    }
}

/// Login gate configuration. The secrets themselves only come from the
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username_env: default_username_env(),
            password_env: default_password_env(),
            secure_cookie: false,
        }
    }
}

impl Config {
    /// Check the values serde cannot
    pub fn validate(&self) -> crate::Result<()> {
        let base_url = self.target.base_url.trim();
        if base_url.is_empty() {
            return Err(crate::CommandCenterError::Config(
                "target.base_url must not be empty".to_string(),
            ));
        }
        reqwest::Url::parse(base_url).map_err(|e| {
            crate::CommandCenterError::Config(format!(
                "target.base_url '{}' is not a valid URL: {}",
                base_url, e
            ))
        })?;

        if self.dashboard.log_capacity == 0 {
            return Err(crate::CommandCenterError::Config(
                "dashboard.log_capacity must be at least 1".to_string(),
            ));
        }

        self.registry().map(|_| ())
    }

    /// The endpoint registry this configuration selects
    pub fn registry(&self) -> crate::Result<Registry> {
        match &self.endpoints {
            Some(endpoints) => Registry::new(endpoints.clone()),
            None => Ok(Registry::builtin()),
        }
    }

    /// Base URL without a trailing slash, so paths can be appended directly
    pub fn base_url(&self) -> String {
        self.target.base_url.trim().trim_end_matches('/').to_string()
    }

    /// Read the login secrets from the process environment
    pub fn resolve_secrets(&self) -> Option<Credentials> {
        self.resolve_secrets_with(|name| std::env::var(name).ok())
    }

    /// Read the login secrets through `lookup`. Both must be set and non-empty.
    pub fn resolve_secrets_with<F>(&self, lookup: F) -> Option<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(&self.auth.username_env).filter(|v| !v.is_empty());
        let password = lookup(&self.auth.password_env).filter(|v| !v.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => {
                tracing::warn!(
                    "Login secrets {} / {} are not set; login will be rejected",
                    self.auth.username_env,
                    self.auth.password_env
                );
                None
            }
        }
    }
}

fn default_base_url() -> String {
    "https://dev.syntx-system.com".to_string()
}

fn default_sweep_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_probe_timeout() -> Option<Duration> {
    Some(Duration::from_secs(10))
}

fn default_health_interval() -> Option<Duration> {
    Some(Duration::from_secs(30))
}

fn default_queue_interval() -> Option<Duration> {
    Some(Duration::from_secs(15))
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_log_capacity() -> usize {
    50
}

fn default_toast_duration() -> Duration {
    Duration::from_secs(8)
}

fn default_username_env() -> String {
    "AUTH_USER".to_string()
}

fn default_password_env() -> String {
    "AUTH_PASS".to_string()
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::CommandCenterError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
