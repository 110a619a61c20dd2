//! BDD step definitions for the request log feature

use cucumber::{given, then, when};

use command_center::registry::HttpMethod;
use command_center::state::{LogEntry, RequestLog, Severity};

use crate::world::CommandCenterWorld;

#[given(expr = "an empty request log holding {int} entries")]
fn empty_log(world: &mut CommandCenterWorld, capacity: usize) {
    world.log = Some(RequestLog::new(capacity));
}

#[when(expr = "{int} requests are logged")]
fn requests_logged(world: &mut CommandCenterWorld, count: usize) {
    let log = world.log.as_mut().expect("log not set");
    let start = log.len();
    for i in start + 1..=start + count {
        log.push(LogEntry::new(
            Severity::Success,
            format!("/request/{}", i),
            HttpMethod::Get,
            200,
            "ok",
        ));
    }
}

#[when("the log is cleared")]
fn log_cleared(world: &mut CommandCenterWorld) {
    world.log.as_mut().expect("log not set").clear();
}

#[then(expr = "the log should hold {int} entries")]
fn log_should_hold(world: &mut CommandCenterWorld, count: usize) {
    assert_eq!(world.log.as_ref().expect("log not set").len(), count);
}

#[then(expr = "the newest entry should be for {string}")]
fn newest_entry(world: &mut CommandCenterWorld, endpoint: String) {
    let log = world.log.as_ref().expect("log not set");
    assert_eq!(log.entries().next().expect("log is empty").endpoint, endpoint);
}

#[then(expr = "the oldest entry should be for {string}")]
fn oldest_entry(world: &mut CommandCenterWorld, endpoint: String) {
    let log = world.log.as_ref().expect("log not set");
    assert_eq!(log.entries().last().expect("log is empty").endpoint, endpoint);
}
