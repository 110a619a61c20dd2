//! Background pollers for the target's system health and live queue

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::io::HttpClient;
use crate::state::{current_epoch_ms, StateHandle};

pub const HEALTH_PATH: &str = "/health";
pub const QUEUE_PATH: &str = "/monitoring/live-queue";

/// Body of the target's `/health` route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemHealth {
    pub status: String,
    pub api_version: String,
    pub timestamp: String,
    pub queue_accessible: bool,
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueCounts {
    pub incoming: u64,
    pub processing: u64,
    pub processed: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuePerformance {
    pub jobs_per_hour: f64,
    pub avg_duration_minutes: f64,
    pub estimated_completion_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentJob {
    pub filename: String,
    pub score: f64,
    pub wrapper: String,
    pub completed_at: String,
    pub rating: String,
}

/// Body of the target's `/monitoring/live-queue` route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueData {
    pub status: String,
    pub system_health: String,
    pub queue: QueueCounts,
    pub performance: Option<QueuePerformance>,
    pub recent_completed: Vec<RecentJob>,
}

/// Last successful reading of a feed plus the outcome of the latest poll.
/// A failed poll keeps the previous value.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus<T> {
    pub value: Option<T>,
    pub error: Option<String>,
    pub last_poll_epoch_ms: Option<u64>,
    pub consecutive_errors: u32,
}

impl<T> Default for FeedStatus<T> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            last_poll_epoch_ms: None,
            consecutive_errors: 0,
        }
    }
}

impl<T> FeedStatus<T> {
    pub fn update(&mut self, outcome: std::result::Result<T, String>, now_ms: u64) {
        self.last_poll_epoch_ms = Some(now_ms);
        match outcome {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                self.consecutive_errors = 0;
            }
            Err(e) => {
                self.error = Some(e);
                self.consecutive_errors += 1;
            }
        }
    }
}

/// Everything the pollers have observed
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    pub health: FeedStatus<SystemHealth>,
    pub queue: FeedStatus<QueueData>,
}

#[derive(Debug, Clone, Copy)]
enum Feed {
    Health,
    Queue,
}

impl Feed {
    fn name(self) -> &'static str {
        match self {
            Feed::Health => "system health",
            Feed::Queue => "live queue",
        }
    }
}

/// Polls the health and queue routes on their own intervals
pub struct SystemPoller {
    state: StateHandle,
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Option<Duration>,
    health_interval: Option<Duration>,
    queue_interval: Option<Duration>,
}

impl std::fmt::Debug for SystemPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPoller")
            .field("base_url", &self.base_url)
            .field("health_interval", &self.health_interval)
            .field("queue_interval", &self.queue_interval)
            .finish()
    }
}

impl SystemPoller {
    pub fn new(config: &Config, state: StateHandle, http: Arc<dyn HttpClient>) -> Self {
        Self {
            state,
            http,
            base_url: config.base_url(),
            timeout: config.sweep.probe_timeout,
            health_interval: config.system.health_interval,
            queue_interval: config.system.queue_interval,
        }
    }

    pub async fn poll_health(&self) -> bool {
        let outcome = self.fetch::<SystemHealth>(HEALTH_PATH).await;
        let ok = outcome.is_ok();
        self.state
            .system
            .write()
            .await
            .health
            .update(outcome, current_epoch_ms());
        ok
    }

    pub async fn poll_queue(&self) -> bool {
        let outcome = self.fetch::<QueueData>(QUEUE_PATH).await;
        let ok = outcome.is_ok();
        self.state
            .system
            .write()
            .await
            .queue
            .update(outcome, current_epoch_ms());
        ok
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url, self.timeout)
            .await
            .map_err(|e| e.to_string())?;

        if !(200..300).contains(&response.status) {
            return Err(format!("Status {}", response.status));
        }
        serde_json::from_str(&response.body).map_err(|e| format!("Invalid JSON response: {}", e))
    }

    /// Poll both feeds until cancelled. A feed without an interval is skipped.
    pub async fn run(&self, cancel: CancellationToken) {
        tokio::join!(
            self.poll_loop(Feed::Health, self.health_interval, &cancel),
            self.poll_loop(Feed::Queue, self.queue_interval, &cancel),
        );
    }

    async fn poll_loop(&self, feed: Feed, interval: Option<Duration>, cancel: &CancellationToken) {
        let Some(interval) = interval else {
            return;
        };

        while !cancel.is_cancelled() {
            let ok = tokio::select! {
                ok = self.poll(feed) => ok,
                _ = cancel.cancelled() => break,
            };
            if !ok {
                let snapshot = self.state.system.read().await;
                let (errors, message) = match feed {
                    Feed::Health => (snapshot.health.consecutive_errors, &snapshot.health.error),
                    Feed::Queue => (snapshot.queue.consecutive_errors, &snapshot.queue.error),
                };
                if errors == 5 {
                    tracing::warn!("Polling {} has failed {} times in a row", feed.name(), errors);
                } else {
                    tracing::debug!("Polling {} failed: {:?}", feed.name(), message);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }
        }
        tracing::debug!("Polling loop for {} cancelled", feed.name());
    }

    async fn poll(&self, feed: Feed) -> bool {
        match feed {
            Feed::Health => self.poll_health().await,
            Feed::Queue => self.poll_queue().await,
        }
    }
}
