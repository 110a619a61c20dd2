//! Shared state: endpoint statuses, request log, toasts, sweep progress
//! and the latest system readings
//!
//! Each collection sits behind its own lock. Writers never hold a lock
//! across network I/O.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::registry::{HttpMethod, Registry};
use crate::system::SystemSnapshot;

/// Reachability of an endpoint as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Online,
    Offline,
    Unknown,
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reachability::Online => write!(f, "Online"),
            Reachability::Offline => write!(f, "Offline"),
            Reachability::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Status of a single endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub path: String,
    pub online: Reachability,
    pub loading: bool,
    pub last_check_epoch_ms: Option<u64>,
    pub last_status: Option<u16>,
}

/// One status per registered path, in registry order
#[derive(Debug, Clone)]
pub struct StatusBoard {
    statuses: Vec<EndpointStatus>,
}

impl StatusBoard {
    pub fn new(paths: Vec<String>) -> Self {
        let statuses = paths
            .into_iter()
            .map(|path| EndpointStatus {
                path,
                online: Reachability::Unknown,
                loading: false,
                last_check_epoch_ms: None,
                last_status: None,
            })
            .collect();
        Self { statuses }
    }

    /// Mark a probe as outstanding. Returns false for unregistered paths.
    pub fn begin_check(&mut self, path: &str) -> bool {
        match self.statuses.iter_mut().find(|s| s.path == path) {
            Some(status) => {
                status.online = Reachability::Unknown;
                status.loading = true;
                true
            }
            None => false,
        }
    }

    /// Store the outcome of a probe or dispatch. Returns false for
    /// unregistered paths, which are never added.
    pub fn record(
        &mut self,
        path: &str,
        online: Reachability,
        http_status: Option<u16>,
        now_ms: u64,
    ) -> bool {
        match self.statuses.iter_mut().find(|s| s.path == path) {
            Some(status) => {
                status.online = online;
                status.loading = false;
                status.last_check_epoch_ms = Some(now_ms);
                status.last_status = http_status;
                true
            }
            None => false,
        }
    }

    /// Clear every outstanding probe, leaving those endpoints unknown
    pub fn abandon_checks(&mut self) -> usize {
        let mut abandoned = 0;
        for status in self.statuses.iter_mut().filter(|s| s.loading) {
            status.loading = false;
            status.online = Reachability::Unknown;
            abandoned += 1;
        }
        abandoned
    }

    pub fn get(&self, path: &str) -> Option<&EndpointStatus> {
        self.statuses.iter().find(|s| s.path == path)
    }

    pub fn all(&self) -> &[EndpointStatus] {
        &self.statuses
    }

    pub fn count(&self, online: Reachability) -> usize {
        self.statuses.iter().filter(|s| s.online == online).count()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Severity shared by log entries and toasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

/// A request outcome in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Severity,
    pub endpoint: String,
    pub method: HttpMethod,
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub timestamp_epoch_ms: u64,
}

impl LogEntry {
    /// Build an entry; the id is assigned when it is pushed
    pub fn new(
        kind: Severity,
        endpoint: impl Into<String>,
        method: HttpMethod,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            kind,
            endpoint: endpoint.into(),
            method,
            status,
            message: message.into(),
            hint: None,
            duration_ms: None,
            timestamp_epoch_ms: current_epoch_ms(),
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Bounded log, newest entry first
#[derive(Debug)]
pub struct RequestLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Add an entry at the front, dropping the oldest beyond capacity.
    /// Returns the assigned id.
    pub fn push(&mut self, mut entry: LogEntry) -> u64 {
        entry.id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.next_id - 1
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A self-expiring notification
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Severity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub duration_ms: u64,
    #[serde(skip)]
    expires_at: Option<Instant>,
}

impl Toast {
    pub fn new(kind: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind,
            title: title.into(),
            message: message.into(),
            endpoint: None,
            status: None,
            duration_ms: 0,
            expires_at: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Active toasts, oldest first
#[derive(Debug)]
pub struct ToastList {
    toasts: Vec<Toast>,
    default_duration: Duration,
    next_id: u64,
}

impl ToastList {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            default_duration,
            next_id: 1,
        }
    }

    /// Add a toast that expires `duration_ms` after `now` (the list default
    /// when unset), dropping any that have already expired. Returns the
    /// assigned id.
    pub fn push(&mut self, mut toast: Toast, now: Instant) -> u64 {
        self.toasts.retain(|t| !t.is_expired(now));
        if toast.duration_ms == 0 {
            toast.duration_ms = self.default_duration.as_millis() as u64;
        }
        toast.id = self.next_id;
        toast.expires_at = Some(now + Duration::from_millis(toast.duration_ms));
        self.next_id += 1;
        self.toasts.push(toast);
        self.next_id - 1
    }

    /// Drop expired toasts and return the remaining ones
    pub fn active(&mut self, now: Instant) -> Vec<Toast> {
        self.toasts.retain(|t| !t.is_expired(now));
        self.toasts.clone()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Remove a toast before it expires. Returns false if it is already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }
}

/// Progress of the current or last sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepProgress {
    pub running: bool,
    pub completed: usize,
    pub total: usize,
    pub fraction: f64,
    pub started_epoch_ms: Option<u64>,
    pub finished_epoch_ms: Option<u64>,
}

impl SweepProgress {
    pub fn start(&mut self, total: usize, now_ms: u64) {
        *self = Self {
            running: true,
            completed: 0,
            total,
            fraction: if total == 0 { 1.0 } else { 0.0 },
            started_epoch_ms: Some(now_ms),
            finished_epoch_ms: None,
        };
    }

    pub fn record_probe(&mut self, completed: usize) {
        self.completed = completed;
        self.fraction = if self.total == 0 {
            1.0
        } else {
            completed as f64 / self.total as f64
        };
    }

    pub fn finish(&mut self, now_ms: u64) {
        self.running = false;
        self.finished_epoch_ms = Some(now_ms);
    }
}

/// State shared by the sweeper, the dispatcher and the dashboard
#[derive(Debug)]
pub struct AppState {
    pub registry: Registry,
    pub statuses: RwLock<StatusBoard>,
    pub log: RwLock<RequestLog>,
    pub toasts: RwLock<ToastList>,
    pub sweep: RwLock<SweepProgress>,
    pub system: RwLock<SystemSnapshot>,
    sweeping: AtomicBool,
}

impl AppState {
    pub fn new(registry: Registry, log_capacity: usize, toast_duration: Duration) -> Self {
        let statuses = StatusBoard::new(registry.paths());
        Self {
            registry,
            statuses: RwLock::new(statuses),
            log: RwLock::new(RequestLog::new(log_capacity)),
            toasts: RwLock::new(ToastList::new(toast_duration)),
            sweep: RwLock::new(SweepProgress::default()),
            system: RwLock::new(SystemSnapshot::default()),
            sweeping: AtomicBool::new(false),
        }
    }

    /// Claim the single sweep slot
    pub fn try_begin_sweep(&self) -> bool {
        self.sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_sweep(&self) {
        self.sweeping.store(false, Ordering::Release);
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::Acquire)
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<AppState>;

pub fn new_state_handle(
    registry: Registry,
    log_capacity: usize,
    toast_duration: Duration,
) -> StateHandle {
    Arc::new(AppState::new(registry, log_capacity, toast_duration))
}

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
