//! Web dashboard with JSON API endpoints

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::auth::{session_user, LoginGate, LoginRequest};
use crate::dispatcher::{DispatchRequest, Dispatcher};
use crate::error::CommandCenterError;
use crate::snippet::{self, SnippetRequest};
use crate::state::{current_epoch_ms, Reachability, StateHandle};
use crate::stats;
use crate::sweeper::Sweeper;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub sweeper: Arc<Sweeper>,
    pub dispatcher: Arc<Dispatcher>,
    pub gate: Arc<LoginGate>,
}

impl IntoResponse for CommandCenterError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommandCenterError::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
            CommandCenterError::SweepInProgress => StatusCode::CONFLICT,
            CommandCenterError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            CommandCenterError::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the dashboard axum router
pub fn build_router(dashboard: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler))
        .route("/health", get(health_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/endpoints", get(endpoints_handler))
        .route("/api/status", get(status_handler))
        .route("/api/sweep", get(sweep_progress_handler).post(sweep_handler))
        .route("/api/dispatch", post(dispatch_handler))
        .route("/api/logs", get(logs_handler).delete(clear_logs_handler))
        .route("/api/toasts", get(toasts_handler))
        .route("/api/toasts/{id}", delete(dismiss_toast_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/system", get(system_handler))
        .route("/api/snippet", post(snippet_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(dashboard)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn badge_colors(online: Reachability) -> (&'static str, &'static str) {
    match online {
        Reachability::Online => ("#155724", "#d4edda"),
        Reachability::Offline => ("#721c24", "#f8d7da"),
        Reachability::Unknown => ("#383d41", "#e2e3e5"),
    }
}

const CELL: &str = "padding: 0.5rem;";
const HEAD_CELL: &str = "padding: 0.5rem; text-align: left;";
const PANEL: &str = "border: 1px solid #dee2e6; border-radius: 0.5rem; padding: 1rem; margin-bottom: 1rem;";

/// Client side of the dashboard: polling, the request form, the log and toasts.
/// Everything taken from API responses is inserted with `textContent`.
const DASHBOARD_SCRIPT: &str = r#"
const colors = {
    'online': ['#155724', '#d4edda', 'Online'],
    'offline': ['#721c24', '#f8d7da', 'Offline'],
};
const severityColors = {
    'success': '#155724',
    'error': '#721c24',
    'warning': '#856404',
    'info': '#0c5460',
};
const cellStyle = 'padding: 0.5rem;';

function el(tag, text, style) {
    const node = document.createElement(tag);
    if (text !== undefined && text !== null) node.textContent = text;
    if (style) node.style.cssText = style;
    return node;
}

function setText(id, text) {
    document.getElementById(id).textContent = text;
}

// One pair per line, split at the first separator
function parseLines(text, separator) {
    const pairs = {};
    text.split('\n').forEach(line => {
        const at = line.indexOf(separator);
        if (at <= 0) return;
        const key = line.slice(0, at).trim();
        if (key) pairs[key] = line.slice(at + 1).trim();
    });
    return pairs;
}

function postJson(url, body) {
    return fetch(url, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body),
    }).then(r => r.json());
}

function currentRequest() {
    return {
        path: document.getElementById('path').value,
        query: parseLines(document.getElementById('query').value, '='),
        headers: parseLines(document.getElementById('headers').value, ':'),
        body: document.getElementById('body').value || null,
    };
}

function updateMethod() {
    const option = document.getElementById('path').selectedOptions[0];
    setText('method', option ? option.dataset.method : '');
    document.getElementById('body-row').style.display =
        option && option.dataset.method === 'POST' ? 'block' : 'none';
}

function selectEndpoint(path) {
    document.getElementById('path').value = path;
    updateMethod();
    document.getElementById('request').scrollIntoView();
}

function showResponse(res) {
    const summary = document.getElementById('response-summary');
    if (res.status === undefined) {
        summary.textContent = res.error || 'Request rejected';
        summary.style.color = '#721c24';
        setText('response-body', '');
        return;
    }
    summary.textContent = `${res.success ? 'OK' : 'Failed'} | HTTP ${res.status} | ${res.duration_ms} ms | ${res.size_bytes} bytes`;
    summary.style.color = res.success ? '#155724' : '#721c24';
    let text = res.data !== null ? JSON.stringify(res.data, null, 2) : '';
    if (!res.success && res.error) {
        text = res.error + (res.hint ? ` (field: ${res.hint})` : '') + (text ? '\n\n' + text : '');
    }
    setText('response-body', text);
}

function sendRequest() {
    const button = document.getElementById('send');
    button.disabled = true;
    postJson('/api/dispatch', currentRequest())
        .then(showResponse)
        .finally(() => {
            button.disabled = false;
            refreshData();
            pollToasts();
        });
}

function showSnippet() {
    const request = currentRequest();
    request.language = document.getElementById('language').value;
    postJson('/api/snippet', request).then(s => setText('snippet', s.code || s.error));
}

function renderLogs(entries) {
    const body = document.getElementById('log-body');
    body.replaceChildren();
    entries.forEach(e => {
        const row = el('tr', null, 'border-bottom: 1px solid #dee2e6;');
        row.appendChild(el('td', new Date(e.timestamp_epoch_ms).toLocaleTimeString(), cellStyle));
        row.appendChild(el('td', e.type, cellStyle + `color: ${severityColors[e.type]}; font-weight: 600;`));
        row.appendChild(el('td', `${e.method} ${e.endpoint}`, cellStyle));
        row.appendChild(el('td', e.status ? String(e.status) : '-', cellStyle));
        const message = el('td', e.message, cellStyle);
        if (e.hint) message.appendChild(el('div', `Field: ${e.hint}`, 'color: #6c757d; font-size: 0.85em;'));
        row.appendChild(message);
        row.appendChild(el('td', e.duration_ms !== undefined ? `${e.duration_ms} ms` : '', cellStyle));
        body.appendChild(row);
    });
    document.getElementById('log-empty').style.display = entries.length ? 'none' : 'block';
}

function clearLogs() {
    fetch('/api/logs', { method: 'DELETE' }).then(refreshData);
}

function renderToasts(toasts) {
    const container = document.getElementById('toasts');
    container.replaceChildren();
    toasts.forEach(t => {
        const box = el('div', null,
            `background: #fff; border-left: 4px solid ${severityColors[t.type]}; box-shadow: 0 2px 6px rgba(0,0,0,0.15); padding: 0.5rem 0.75rem; margin-top: 0.5rem; min-width: 260px;`);
        const close = el('button', 'x', 'float: right; border: none; background: none; cursor: pointer;');
        close.onclick = () => fetch(`/api/toasts/${t.id}`, { method: 'DELETE' }).then(pollToasts);
        box.appendChild(close);
        box.appendChild(el('strong', t.title));
        box.appendChild(el('div', t.message, 'font-size: 0.9em;'));
        if (t.endpoint) box.appendChild(el('div', t.endpoint, 'font-size: 0.8em; color: #6c757d;'));
        container.appendChild(box);
    });
}

function pollToasts() {
    fetch('/api/toasts').then(r => r.json()).then(renderToasts);
}

function renderSystem(system) {
    const health = system.health.value;
    setText('health-status', health ? health.status : 'Waiting for first poll');
    setText('api-version', health ? health.api_version : '-');
    setText('queue-accessible', health ? (health.queue_accessible ? 'yes' : 'no') : '-');
    setText('modules', health && health.modules.length ? health.modules.join(', ') : '-');
    setText('health-error', system.health.error ? `Last poll failed: ${system.health.error}` : '');

    const queue = system.queue.value;
    ['incoming', 'processing', 'processed', 'errors'].forEach(key => {
        setText(`queue-${key}`, queue ? String(queue.queue[key]) : '-');
    });
    const perf = queue && queue.performance;
    setText('jobs-per-hour', perf ? String(perf.jobs_per_hour) : '-');
    setText('avg-duration', perf ? `${perf.avg_duration_minutes}m` : '-');
    setText('queue-error', system.queue.error ? `Last poll failed: ${system.queue.error}` : '');
}

function refreshData() {
    fetch('/api/status')
        .then(r => r.json())
        .then(data => {
            data.forEach(s => {
                const row = document.querySelector(`tr[data-path="${s.path}"] .badge`);
                if (!row) return;
                const [color, bg, label] = colors[s.online] || ['#383d41', '#e2e3e5', s.loading ? 'Checking' : 'Unknown'];
                row.style.color = color;
                row.style.backgroundColor = bg;
                row.textContent = label;
            });
        });
    fetch('/api/stats')
        .then(r => r.json())
        .then(s => {
            let text = `${s.online} online, ${s.offline} offline, ${s.unknown} unknown (${s.success_rate}% of checked)`;
            if (s.requests) {
                text += ` | ${s.requests} requests, ${s.failed_requests} failed`;
                if (s.avg_duration_ms !== null) text += `, avg ${s.avg_duration_ms} ms`;
            }
            setText('stats', text);
        });
    fetch('/api/sweep')
        .then(r => r.json())
        .then(p => {
            setText('progress', p.running ? `Sweeping ${p.completed}/${p.total}` : '');
        });
    fetch('/api/logs').then(r => r.json()).then(renderLogs);
    fetch('/api/system').then(r => r.json()).then(renderSystem);
}

function startSweep() {
    fetch('/api/sweep', { method: 'POST' }).then(refreshData);
}

document.addEventListener('click', event => {
    const path = event.target.dataset && event.target.dataset.select;
    if (path) selectEndpoint(path);
});
document.addEventListener('DOMContentLoaded', () => {
    updateMethod();
    refreshData();
    pollToasts();
});
setInterval(refreshData, 2000);
setInterval(pollToasts, 1000);
"#;

async fn index_handler(
    State(dashboard): State<DashboardState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let registry = &dashboard.state.registry;
    let statuses = dashboard.state.statuses.read().await;

    let signed_in = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_user)
        .map(|user| format!("Signed in as {}", escape_html(&user)))
        .unwrap_or_else(|| r#"<a href="/login">Sign in</a>"#.to_string());

    let grouped: Vec<_> = registry
        .categories()
        .iter()
        .flat_map(move |category| {
            registry
                .endpoints()
                .iter()
                .filter(move |e| e.category == category.id)
                .map(move |e| (category, e))
        })
        .collect();

    let endpoint_rows: String = grouped
        .iter()
        .map(|(category, e)| {
            let online = statuses
                .get(&e.path)
                .map(|s| s.online)
                .unwrap_or(Reachability::Unknown);
            let (color, bg) = badge_colors(online);
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;" data-path="{path}">
                    <td style="{cell}">{category}</td>
                    <td style="{cell}"><code>{method}</code></td>
                    <td style="{cell}"><code>{path}</code></td>
                    <td style="{cell}">{description}</td>
                    <td style="{cell}">
                        <span class="badge" style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {color}; background-color: {bg};">{online}</span>
                    </td>
                    <td style="{cell}"><button data-select="{path}">Use</button></td>
                </tr>"#,
                cell = CELL,
                path = escape_html(&e.path),
                category = escape_html(&category.name),
                method = e.method,
                description = escape_html(&e.description),
                color = color,
                bg = bg,
                online = online,
            )
        })
        .collect();
    drop(statuses);

    let endpoint_options: String = grouped
        .iter()
        .map(|(_, e)| {
            format!(
                r#"<option value="{path}" data-method="{method}">{method} {path}</option>"#,
                path = escape_html(&e.path),
                method = e.method,
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Command Center</title>
    <script>{script}</script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 1100px; margin: 0 auto; padding: 1rem;">
    <header style="display: flex; justify-content: space-between; align-items: center;">
        <h1>Command Center</h1>
        <span>{signed_in}</span>
    </header>
    <p>Target: <code>{base_url}</code></p>

    <section id="system" style="display: flex; gap: 1rem;">
        <div style="{panel} flex: 1;">
            <h2 style="margin-top: 0;">System Health</h2>
            <p>Status: <strong id="health-status">Waiting for first poll</strong></p>
            <p>API version: <span id="api-version">-</span></p>
            <p>Queue accessible: <span id="queue-accessible">-</span></p>
            <p>Modules: <span id="modules">-</span></p>
            <p id="health-error" style="color: #721c24;"></p>
        </div>
        <div style="{panel} flex: 1;">
            <h2 style="margin-top: 0;">Queue Status</h2>
            <p>Incoming: <strong id="queue-incoming">-</strong> | Processing: <strong id="queue-processing">-</strong></p>
            <p>Processed: <strong id="queue-processed">-</strong> | Errors: <strong id="queue-errors">-</strong></p>
            <p>Jobs/hour: <span id="jobs-per-hour">-</span> | Avg duration: <span id="avg-duration">-</span></p>
            <p id="queue-error" style="color: #721c24;"></p>
        </div>
    </section>

    <p>
        <button onclick="startSweep()">Run health sweep</button>
        <span id="progress"></span>
    </p>
    <p id="stats"></p>

    <section>
        <h2>Endpoints</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="{head}">Category</th>
                    <th style="{head}">Method</th>
                    <th style="{head}">Path</th>
                    <th style="{head}">Description</th>
                    <th style="{head}">Status</th>
                    <th style="{head}"></th>
                </tr>
            </thead>
            <tbody id="endpoint-body">{endpoint_rows}</tbody>
        </table>
    </section>

    <section id="request" style="{panel} margin-top: 1rem;">
        <h2 style="margin-top: 0;">Request</h2>
        <p>
            <code id="method"></code>
            <select id="path" onchange="updateMethod()">{endpoint_options}</select>
        </p>
        <p>Query parameters (one <code>key=value</code> per line)<br>
            <textarea id="query" rows="3" style="width: 100%; font-family: monospace;"></textarea></p>
        <p>Headers (one <code>Name: value</code> per line; an empty <code>Content-Type:</code> drops the default)<br>
            <textarea id="headers" rows="3" style="width: 100%; font-family: monospace;"></textarea></p>
        <p id="body-row">JSON body<br>
            <textarea id="body" rows="6" style="width: 100%; font-family: monospace;"></textarea></p>
        <p>
            <button id="send" onclick="sendRequest()">Send request</button>
            <select id="language">
                <option value="curl">curl</option>
                <option value="python">Python</option>
                <option value="javascript">JavaScript</option>
                <option value="typescript">TypeScript</option>
            </select>
            <button onclick="showSnippet()">Show code</button>
        </p>
        <pre id="snippet" style="background: #f8f9fa; padding: 0.5rem; overflow-x: auto;"></pre>
    </section>

    <section id="response" style="{panel}">
        <h2 style="margin-top: 0;">Response</h2>
        <p id="response-summary">No request sent yet</p>
        <pre id="response-body" style="background: #f8f9fa; padding: 0.5rem; max-height: 400px; overflow: auto;"></pre>
    </section>

    <section id="log">
        <h2>Request Log <button onclick="clearLogs()">Clear</button></h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="{head}">Time</th>
                    <th style="{head}">Type</th>
                    <th style="{head}">Request</th>
                    <th style="{head}">Status</th>
                    <th style="{head}">Message</th>
                    <th style="{head}">Duration</th>
                </tr>
            </thead>
            <tbody id="log-body"></tbody>
        </table>
        <p id="log-empty" style="color: #6c757d;">No requests yet</p>
    </section>

    <div id="toasts" style="position: fixed; right: 1rem; bottom: 1rem; z-index: 10;"></div>
</body>
</html>"#,
        script = DASHBOARD_SCRIPT,
        signed_in = signed_in,
        base_url = escape_html(dashboard.dispatcher.base_url()),
        panel = PANEL,
        head = HEAD_CELL,
        endpoint_rows = endpoint_rows,
        endpoint_options = endpoint_options,
    );

    Html(html)
}

async fn login_page_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Command Center Login</title>
    <script>
        function login(event) {
            event.preventDefault();
            const body = {
                username: document.getElementById('username').value,
                password: document.getElementById('password').value,
            };
            fetch('/api/auth/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(body),
            })
                .then(r => r.json())
                .then(data => {
                    if (data.success) {
                        window.location.href = '/';
                    } else {
                        document.getElementById('error').textContent = data.error;
                    }
                });
        }
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 360px; margin: 4rem auto; padding: 1rem;">
    <h1>Command Center</h1>
    <form onsubmit="login(event)">
        <p><input id="username" placeholder="Username" autocomplete="username" style="width: 100%;"></p>
        <p><input id="password" type="password" placeholder="Password" autocomplete="current-password" style="width: 100%;"></p>
        <p><button type="submit">Sign in</button></p>
        <p id="error" style="color: #721c24;"></p>
    </form>
</body>
</html>"#,
    )
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn login_handler(State(dashboard): State<DashboardState>, body: Bytes) -> Response {
    let request: LoginRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Rejected login body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid request body" })),
            )
                .into_response();
        }
    };

    match dashboard.gate.login(&request, current_epoch_ms()) {
        Ok(session) => (
            [(
                header::SET_COOKIE,
                dashboard.gate.session_cookie(&session.token),
            )],
            Json(serde_json::json!({
                "success": true,
                "message": "Welcome to the field",
                "timestamp": session.timestamp_epoch_ms,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn endpoints_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let registry = &dashboard.state.registry;
    Json(serde_json::json!({
        "categories": registry.categories(),
        "endpoints": registry.endpoints(),
    }))
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let statuses = dashboard.state.statuses.read().await;
    Json(statuses.all().to_vec())
}

async fn sweep_progress_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.state.sweep.read().await.clone())
}

async fn sweep_handler(State(dashboard): State<DashboardState>) -> crate::Result<Response> {
    let guard = dashboard.sweeper.claim()?;
    let total = dashboard.state.registry.len();

    let sweeper = Arc::clone(&dashboard.sweeper);
    tokio::spawn(async move {
        sweeper.sweep_claimed(guard).await;
    });

    tracing::info!("Sweep requested from dashboard");
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "started": true, "total": total })),
    )
        .into_response())
}

async fn dispatch_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<DispatchRequest>,
) -> crate::Result<impl IntoResponse> {
    let response = dashboard.dispatcher.dispatch(&request).await?;
    Ok(Json(response))
}

async fn logs_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let log = dashboard.state.log.read().await;
    Json(log.entries().cloned().collect::<Vec<_>>())
}

async fn clear_logs_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    dashboard.state.log.write().await.clear();
    tracing::debug!("Request log cleared");
    StatusCode::NO_CONTENT
}

async fn toasts_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let active = dashboard.state.toasts.write().await.active(Instant::now());
    Json(active)
}

async fn dismiss_toast_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<u64>,
) -> Response {
    if dashboard.state.toasts.write().await.dismiss(id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Unknown toast: {}", id) })),
        )
            .into_response()
    }
}

async fn stats_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let statuses = dashboard.state.statuses.read().await;
    let log = dashboard.state.log.read().await;
    Json(stats::compute(&statuses, &log))
}

async fn system_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.state.system.read().await.clone())
}

async fn snippet_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<SnippetRequest>,
) -> crate::Result<impl IntoResponse> {
    let endpoint = dashboard
        .state
        .registry
        .find(&request.path)
        .ok_or_else(|| CommandCenterError::UnknownEndpoint(request.path.clone()))?;
    let snippet = snippet::generate(dashboard.dispatcher.base_url(), endpoint, &request)?;
    Ok(Json(snippet))
}
