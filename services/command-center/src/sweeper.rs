//! Health sweeper: probes every registered endpoint, one at a time

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::io::HttpClient;
use crate::registry::{Endpoint, HttpMethod};
use crate::state::{current_epoch_ms, LogEntry, Reachability, Severity, StateHandle};

/// Anything below 500 means the server answered
pub fn classify_status(status: u16) -> Reachability {
    if status < 500 {
        Reachability::Online
    } else {
        Reachability::Offline
    }
}

/// Outcome of a completed sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub duration_ms: u64,
}

/// Exclusive claim on the sweep slot, released on drop
#[derive(Debug)]
pub struct SweepGuard {
    state: StateHandle,
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.state.end_sweep();
    }
}

/// Sequential reachability prober
pub struct Sweeper {
    state: StateHandle,
    http: Arc<dyn HttpClient>,
    base_url: String,
    delay: Duration,
    probe_timeout: Option<Duration>,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("base_url", &self.base_url)
            .field("delay", &self.delay)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl Sweeper {
    pub fn new(config: &Config, state: StateHandle, http: Arc<dyn HttpClient>) -> Self {
        Self {
            state,
            http,
            base_url: config.base_url(),
            delay: config.sweep.delay,
            probe_timeout: config.sweep.probe_timeout,
        }
    }

    /// Reserve the sweep slot, failing if another sweep holds it
    pub fn claim(&self) -> crate::Result<SweepGuard> {
        if self.state.try_begin_sweep() {
            Ok(SweepGuard {
                state: Arc::clone(&self.state),
            })
        } else {
            Err(crate::CommandCenterError::SweepInProgress)
        }
    }

    /// Claim the slot and run one full sweep
    pub async fn sweep(&self) -> crate::Result<SweepSummary> {
        let guard = self.claim()?;
        Ok(self.sweep_claimed(guard).await)
    }

    /// Run one full sweep under an existing claim
    pub async fn sweep_claimed(&self, guard: SweepGuard) -> SweepSummary {
        let endpoints = self.state.registry.endpoints();
        let total = endpoints.len();
        let started = Instant::now();

        tracing::info!("Sweeping {} endpoints", total);
        self.state.sweep.write().await.start(total, current_epoch_ms());

        let mut online = 0;
        for (index, endpoint) in endpoints.iter().enumerate() {
            self.state.statuses.write().await.begin_check(&endpoint.path);

            let (reachability, status) = self.probe(endpoint).await;
            if reachability == Reachability::Online {
                online += 1;
            }

            self.state.statuses.write().await.record(
                &endpoint.path,
                reachability,
                status,
                current_epoch_ms(),
            );
            self.state.sweep.write().await.record_probe(index + 1);

            if index + 1 < total {
                tokio::time::sleep(self.delay).await;
            }
        }

        let summary = SweepSummary {
            total,
            online,
            offline: total - online,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        self.state.sweep.write().await.finish(current_epoch_ms());
        self.state.log.write().await.push(
            LogEntry::new(
                Severity::Info,
                "*",
                HttpMethod::Get,
                0,
                format!("Sweep complete: {}/{} endpoints online", online, total),
            )
            .with_duration(summary.duration_ms),
        );
        drop(guard);

        tracing::info!(
            "Sweep complete: {}/{} online in {} ms",
            summary.online,
            summary.total,
            summary.duration_ms
        );
        summary
    }

    /// GET the endpoint regardless of its declared method
    async fn probe(&self, endpoint: &Endpoint) -> (Reachability, Option<u16>) {
        let url = format!("{}{}", self.base_url, endpoint.path);
        match self.http.get(&url, self.probe_timeout).await {
            Ok(response) => {
                let reachability = classify_status(response.status);
                tracing::debug!(
                    "Probe {} -> {} ({})",
                    endpoint.path,
                    response.status,
                    reachability
                );
                (reachability, Some(response.status))
            }
            Err(e) => {
                tracing::debug!("Probe {} failed: {}", endpoint.path, e);
                (Reachability::Offline, None)
            }
        }
    }

    /// Sweep on start and/or periodically until cancelled
    pub async fn run(&self, on_start: bool, interval: Option<Duration>, cancel: CancellationToken) {
        if on_start {
            self.sweep_unless_cancelled(&cancel).await;
        }

        let Some(interval) = interval else {
            return;
        };

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Sweep loop cancelled");
                    break;
                }
            }
            self.sweep_unless_cancelled(&cancel).await;
        }
    }

    async fn sweep_unless_cancelled(&self, cancel: &CancellationToken) {
        tokio::select! {
            result = self.sweep() => {
                if let Err(e) = result {
                    tracing::debug!("Scheduled sweep skipped: {}", e);
                }
            }
            _ = cancel.cancelled() => {
                // The dropped sweep released its claim; a claim still held
                // belongs to a dashboard sweep whose state is not ours
                if !self.state.is_sweeping() {
                    let abandoned = self.state.statuses.write().await.abandon_checks();
                    let mut progress = self.state.sweep.write().await;
                    if progress.running {
                        progress.finish(current_epoch_ms());
                    }
                    tracing::debug!("Sweep abandoned on shutdown ({} probes outstanding)", abandoned);
                }
            }
        }
    }
}
