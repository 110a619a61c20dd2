//! BDD step definitions for the health sweep feature

use cucumber::{given, then, when};

use command_center::registry::HttpMethod;
use command_center::state::{Reachability, Severity};

use crate::world::{CommandCenterWorld, Scripted, TARGET};

fn parse_method(method: &str) -> HttpMethod {
    match method {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("Unknown method: {}", other),
    }
}

fn parse_reachability(s: &str) -> Reachability {
    match s {
        "online" => Reachability::Online,
        "offline" => Reachability::Offline,
        "unknown" => Reachability::Unknown,
        other => panic!("Unknown reachability: {}", other),
    }
}

#[given(expr = "a {word} endpoint {string} answering {int}")]
async fn endpoint_answering(world: &mut CommandCenterWorld, method: String, path: String, status: u16) {
    world.add_endpoint(parse_method(&method), &path);
    world
        .http
        .script(
            &path,
            Scripted::Respond {
                status,
                body: "{}".to_string(),
            },
        )
        .await;
}

#[given(expr = "a {word} endpoint {string} answering {int} with body {string}")]
async fn endpoint_answering_with_body(
    world: &mut CommandCenterWorld,
    method: String,
    path: String,
    status: u16,
    body: String,
) {
    world.add_endpoint(parse_method(&method), &path);
    world
        .http
        .script(&path, Scripted::Respond { status, body })
        .await;
}

#[given(expr = "an unreachable {word} endpoint {string}")]
async fn unreachable_endpoint(world: &mut CommandCenterWorld, method: String, path: String) {
    world.add_endpoint(parse_method(&method), &path);
    world
        .http
        .script(&path, Scripted::Fail("connection refused".to_string()))
        .await;
}

#[given("a sweep is already running")]
fn sweep_already_running(world: &mut CommandCenterWorld) {
    let sweeper = world.sweeper();
    world.held_sweep = Some(sweeper.claim().expect("sweep slot should be free"));
}

#[when("a health sweep runs")]
async fn health_sweep_runs(world: &mut CommandCenterWorld) {
    let sweeper = world.sweeper();
    match sweeper.sweep().await {
        Ok(summary) => world.sweep_summary = Some(summary),
        Err(e) => world.sweep_error = Some(e.to_string()),
    }
}

#[when("the running sweep finishes")]
fn running_sweep_finishes(world: &mut CommandCenterWorld) {
    world.held_sweep = None;
}

#[then(expr = "endpoint {string} should be {word}")]
async fn endpoint_should_be(world: &mut CommandCenterWorld, path: String, expected: String) {
    let state = world.state();
    let statuses = state.statuses.read().await;
    let status = statuses.get(&path).expect("status should exist");
    assert_eq!(status.online, parse_reachability(&expected), "status of {}", path);
}

#[then("every endpoint should have exactly one settled status")]
async fn every_endpoint_settled(world: &mut CommandCenterWorld) {
    let state = world.state();
    let statuses = state.statuses.read().await;
    assert_eq!(statuses.len(), state.registry.len());
    for endpoint in state.registry.endpoints() {
        let status = statuses.get(&endpoint.path).expect("status should exist");
        assert!(!status.loading, "{} is still loading", endpoint.path);
        assert_ne!(status.online, Reachability::Unknown);
    }
}

#[then(expr = "the sweep should report {int} online and {int} offline")]
fn sweep_should_report(world: &mut CommandCenterWorld, online: usize, offline: usize) {
    let summary = world.sweep_summary.as_ref().expect("sweep did not complete");
    assert_eq!(summary.online, online);
    assert_eq!(summary.offline, offline);
}

#[then(expr = "{string} should have been probed with GET")]
async fn probed_with_get(world: &mut CommandCenterWorld, path: String) {
    let expected = format!("{}{}", TARGET, path);
    assert!(world.http.probes.read().await.contains(&expected));
    assert!(world.http.requests.read().await.is_empty());
}

#[then(expr = "the sweep should be rejected with {string}")]
fn sweep_rejected(world: &mut CommandCenterWorld, message: String) {
    assert_eq!(world.sweep_error.as_deref(), Some(message.as_str()));
}

#[then(expr = "the log should start with an info entry {string}")]
async fn log_starts_with_info(world: &mut CommandCenterWorld, message: String) {
    let state = world.state();
    let log = state.log.read().await;
    let entry = log.entries().next().expect("log should not be empty");
    assert_eq!(entry.kind, Severity::Info);
    assert_eq!(entry.message, message);
}

#[then("the sweep progress should be complete")]
async fn sweep_progress_complete(world: &mut CommandCenterWorld) {
    let state = world.state();
    let progress = state.sweep.read().await.clone();
    assert!(!progress.running);
    assert_eq!(progress.completed, progress.total);
    assert_eq!(progress.fraction, 1.0);
}
