//! BDD step definitions for the request dispatch feature

use std::time::Instant;

use cucumber::{then, when};

use command_center::dispatcher::DispatchRequest;
use command_center::state::Severity;

use crate::world::CommandCenterWorld;

fn parse_severity(s: &str) -> Severity {
    match s {
        "success" => Severity::Success,
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "info" => Severity::Info,
        other => panic!("Unknown severity: {}", other),
    }
}

async fn dispatch(world: &mut CommandCenterWorld, request: DispatchRequest) {
    let result = world.dispatcher().dispatch(&request).await;
    match result {
        Ok(response) => world.response = Some(response),
        Err(e) => world.dispatch_error = Some(e.to_string()),
    }
}

#[when(expr = "{string} is dispatched")]
async fn path_dispatched(world: &mut CommandCenterWorld, path: String) {
    dispatch(
        world,
        DispatchRequest {
            path,
            ..Default::default()
        },
    )
    .await;
}

#[when(expr = "{string} is dispatched with query {string} = {string}")]
async fn path_dispatched_with_query(
    world: &mut CommandCenterWorld,
    path: String,
    key: String,
    value: String,
) {
    let mut request = DispatchRequest {
        path,
        ..Default::default()
    };
    request.query.insert(key, value);
    dispatch(world, request).await;
}

#[when(expr = "{string} is dispatched with body {string}")]
async fn path_dispatched_with_body(world: &mut CommandCenterWorld, path: String, body: String) {
    dispatch(
        world,
        DispatchRequest {
            path,
            body: Some(body),
            ..Default::default()
        },
    )
    .await;
}

#[then("the dispatch should succeed")]
fn dispatch_should_succeed(world: &mut CommandCenterWorld) {
    let response = world.response.as_ref().expect("no response");
    assert!(response.success, "expected success, got {:?}", response);
    assert!(response.error.is_none());
}

#[then(expr = "the dispatch should fail with status {int}")]
fn dispatch_should_fail(world: &mut CommandCenterWorld, status: u16) {
    let response = world.response.as_ref().expect("no response");
    assert!(!response.success);
    assert_eq!(response.status, status);
}

#[then(expr = "the error should be {string}")]
fn error_should_be(world: &mut CommandCenterWorld, message: String) {
    let response = world.response.as_ref().expect("no response");
    assert_eq!(response.error.as_deref(), Some(message.as_str()));
}

#[then(expr = "the error should start with {string}")]
fn error_should_start_with(world: &mut CommandCenterWorld, prefix: String) {
    let response = world.response.as_ref().expect("no response");
    let error = response.error.as_deref().unwrap_or_default();
    assert!(error.starts_with(&prefix), "error was {:?}", error);
}

#[then(expr = "the hint should be {string}")]
fn hint_should_be(world: &mut CommandCenterWorld, hint: String) {
    let response = world.response.as_ref().expect("no response");
    assert_eq!(response.hint.as_deref(), Some(hint.as_str()));
}

#[then(expr = "the dispatch should be refused with {string}")]
fn dispatch_refused(world: &mut CommandCenterWorld, message: String) {
    assert_eq!(world.dispatch_error.as_deref(), Some(message.as_str()));
}

#[then(expr = "the target should have received {string}")]
async fn target_received(world: &mut CommandCenterWorld, url: String) {
    let requests = world.http.requests.read().await;
    assert!(
        requests.iter().any(|r| r.url == url),
        "requests were {:?}",
        requests.iter().map(|r| &r.url).collect::<Vec<_>>()
    );
}

#[then("the target should have received no requests")]
async fn target_received_nothing(world: &mut CommandCenterWorld) {
    assert!(world.http.requests.read().await.is_empty());
}

#[then(expr = "the newest log entry should be a(n) {word} for {string}")]
async fn newest_log_entry(world: &mut CommandCenterWorld, kind: String, path: String) {
    let state = world.state();
    let log = state.log.read().await;
    let entry = log.entries().next().expect("log should not be empty");
    assert_eq!(entry.kind, parse_severity(&kind));
    assert_eq!(entry.endpoint, path);
    assert!(entry.duration_ms.is_some());
}

#[then(expr = "a toast titled {string} should be shown")]
async fn toast_shown(world: &mut CommandCenterWorld, title: String) {
    let state = world.state();
    let toasts = state.toasts.write().await.active(Instant::now());
    assert!(
        toasts.iter().any(|t| t.title == title),
        "toasts were {:?}",
        toasts
    );
}

#[then("no toast should be shown")]
async fn no_toast(world: &mut CommandCenterWorld) {
    let state = world.state();
    assert!(state.toasts.write().await.active(Instant::now()).is_empty());
}

#[then("the log should be empty")]
async fn log_empty(world: &mut CommandCenterWorld) {
    let state = world.state();
    assert!(state.log.read().await.is_empty());
}
