//! Derived statistics for the dashboard header

use serde::{Deserialize, Serialize};

use crate::state::{Reachability, RequestLog, Severity, StatusBoard};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_endpoints: usize,
    pub online: usize,
    pub offline: usize,
    pub unknown: usize,
    pub checked: usize,
    /// Percentage of checked endpoints that are online, rounded
    pub success_rate: u32,
    pub requests: usize,
    pub failed_requests: usize,
    pub avg_duration_ms: Option<u64>,
    pub min_duration_ms: Option<u64>,
    pub max_duration_ms: Option<u64>,
}

pub fn compute(statuses: &StatusBoard, log: &RequestLog) -> DashboardStats {
    let online = statuses.count(Reachability::Online);
    let offline = statuses.count(Reachability::Offline);
    let checked = online + offline;
    let success_rate = if checked == 0 {
        0
    } else {
        (online as f64 / checked as f64 * 100.0).round() as u32
    };

    // Sweep summaries are info entries, not requests
    let requests: Vec<_> = log
        .entries()
        .filter(|e| e.kind != Severity::Info)
        .collect();
    let durations: Vec<u64> = requests.iter().filter_map(|e| e.duration_ms).collect();
    let avg_duration_ms = if durations.is_empty() {
        None
    } else {
        Some((durations.iter().sum::<u64>() as f64 / durations.len() as f64).round() as u64)
    };

    DashboardStats {
        total_endpoints: statuses.len(),
        online,
        offline,
        unknown: statuses.count(Reachability::Unknown),
        checked,
        success_rate,
        requests: requests.len(),
        failed_requests: requests
            .iter()
            .filter(|e| e.kind != Severity::Success)
            .count(),
        avg_duration_ms,
        min_duration_ms: durations.iter().min().copied(),
        max_duration_ms: durations.iter().max().copied(),
    }
}
