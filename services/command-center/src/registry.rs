//! Endpoint registry: the routes of the target API known to the dashboard

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method declared for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known route on the target API. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub category: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Grouping shown in the endpoint listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

const BUILTIN_CATEGORIES: &[(&str, &str)] = &[
    ("kern", "Kern-System"),
    ("prompts", "Prompts"),
    ("advanced", "Advanced"),
    ("analytics", "Analytics"),
    ("evolution", "Evolution"),
    ("compare", "Compare"),
    ("feld", "Feld"),
    ("resonanz", "Resonanz"),
    ("generation", "Generation"),
    ("strom", "Strom"),
];

// (path, method, category, name, description)
const BUILTIN_ENDPOINTS: &[(&str, HttpMethod, &str, &str, &str)] = &[
    ("/health", HttpMethod::Get, "kern", "Health", "System heartbeat"),
    ("/monitoring/live-queue", HttpMethod::Get, "kern", "Live Queue", "Real-time queue monitor"),
    ("/prompts/all", HttpMethod::Get, "prompts", "All Prompts", "List of all prompts"),
    ("/prompts/best", HttpMethod::Get, "prompts", "Best Prompts", "Score 100 only"),
    ("/prompts/table-view", HttpMethod::Get, "prompts", "Table View", "Tabular format"),
    ("/prompts/complete-export", HttpMethod::Get, "prompts", "Complete Export", "Full export"),
    ("/prompts/search", HttpMethod::Get, "prompts", "Search", "Keyword search"),
    ("/prompts/fields/breakdown", HttpMethod::Get, "prompts", "Fields Breakdown", "Field detection analysis"),
    ("/prompts/costs/total", HttpMethod::Get, "prompts", "Costs", "Token costs"),
    ("/prompts/advanced/predict-score", HttpMethod::Post, "advanced", "Predict Score", "Score prediction"),
    ("/prompts/advanced/fields-missing-analysis", HttpMethod::Get, "advanced", "Fields Missing", "Missing fields"),
    ("/prompts/advanced/keyword-combinations", HttpMethod::Get, "advanced", "Keyword Combos", "Best combinations"),
    ("/prompts/advanced/optimal-wrapper-for-topic", HttpMethod::Get, "advanced", "Optimal Wrapper", "Wrapper per topic"),
    ("/prompts/advanced/templates-by-score", HttpMethod::Get, "advanced", "Templates", "Sorted by score"),
    ("/prompts/advanced/evolution-learning-curve", HttpMethod::Get, "advanced", "Learning Curve", "Evolution curve"),
    ("/analytics/complete-dashboard", HttpMethod::Get, "analytics", "Dashboard", "Complete overview"),
    ("/analytics/scores/distribution", HttpMethod::Get, "analytics", "Score Distribution", "Distribution"),
    ("/evolution/syntx-vs-normal", HttpMethod::Get, "evolution", "SYNTX vs Normal", "Side-by-side comparison"),
    ("/evolution/keywords/power", HttpMethod::Get, "evolution", "Keyword Power", "Strongest keywords"),
    ("/evolution/topics/resonance", HttpMethod::Get, "evolution", "Topic Resonance", "Topic analysis"),
    ("/compare/wrapper-performance", HttpMethod::Get, "compare", "Wrapper Performance", "Wrapper comparison"),
    ("/feld/drift", HttpMethod::Get, "feld", "Drift", "Drift detection"),
    ("/feld/topics", HttpMethod::Get, "feld", "Topics", "Active topics"),
    ("/feld/prompts", HttpMethod::Get, "feld", "Prompts", "Raw prompt data"),
    ("/resonanz/queue", HttpMethod::Get, "resonanz", "Queue Resonanz", "Queue flow rate"),
    ("/resonanz/system", HttpMethod::Get, "resonanz", "System Resonanz", "Overall status"),
    ("/generation/progress", HttpMethod::Get, "generation", "Progress", "Evolution progress"),
    ("/strom/health", HttpMethod::Get, "strom", "Strom Health", "Infrastructure"),
    ("/strom/queue/status", HttpMethod::Get, "strom", "Queue Status", "Queue details"),
];

/// Immutable set of endpoints, kept in declaration order
#[derive(Debug, Clone)]
pub struct Registry {
    endpoints: Vec<Endpoint>,
    categories: Vec<Category>,
}

impl Registry {
    /// The routes the dashboard ships with
    pub fn builtin() -> Self {
        let endpoints = BUILTIN_ENDPOINTS
            .iter()
            .map(|(path, method, category, name, description)| Endpoint {
                path: path.to_string(),
                method: *method,
                category: category.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect();

        Self {
            endpoints,
            categories: builtin_categories(),
        }
    }

    /// Build a registry from configured endpoints. Paths must be unique.
    ///
    /// Categories not in the built-in list are appended using their id as
    /// display name.
    pub fn new(endpoints: Vec<Endpoint>) -> crate::Result<Self> {
        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            if !endpoint.path.starts_with('/') {
                return Err(crate::CommandCenterError::Config(format!(
                    "Endpoint path '{}' must start with '/'",
                    endpoint.path
                )));
            }
            if !seen.insert(endpoint.path.as_str()) {
                return Err(crate::CommandCenterError::Config(format!(
                    "Duplicate endpoint path '{}'",
                    endpoint.path
                )));
            }
        }

        let mut categories = builtin_categories();
        for endpoint in &endpoints {
            if !categories.iter().any(|c| c.id == endpoint.category) {
                categories.push(Category {
                    id: endpoint.category.clone(),
                    name: endpoint.category.clone(),
                });
            }
        }
        categories.retain(|c| endpoints.iter().any(|e| e.category == c.id));

        Ok(Self {
            endpoints,
            categories,
        })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn find(&self, path: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.path == path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_categories() -> Vec<Category> {
    BUILTIN_CATEGORIES
        .iter()
        .map(|(id, name)| Category {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}
