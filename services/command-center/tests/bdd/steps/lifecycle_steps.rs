//! BDD step definitions for the service builder and lifecycle feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use command_center::config::Config;
use command_center::io::HttpClient;
use command_center::CommandCenterBuilder;

use crate::world::CommandCenterWorld;

fn builder(world: &CommandCenterWorld, config: Config) -> CommandCenterBuilder {
    let http: Arc<dyn HttpClient> = world.http.clone();
    CommandCenterBuilder::new(config)
        .with_http_client(http)
        .with_credentials(None)
}

#[given("a default command center config")]
fn default_config(world: &mut CommandCenterWorld) {
    world.config = Some(Config::default());
}

#[given(expr = "a config with log capacity {int}")]
fn config_with_log_capacity(world: &mut CommandCenterWorld, capacity: usize) {
    let mut config = Config::default();
    config.dashboard.log_capacity = capacity;
    world.config = Some(config);
}

#[when("the command center is built")]
async fn command_center_built(world: &mut CommandCenterWorld) {
    let result = builder(world, world.config()).build().await;
    world.build_succeeded = Some(result.is_ok());
}

#[when(expr = "the command center is built with target {string}")]
async fn command_center_built_with_target(world: &mut CommandCenterWorld, base_url: String) {
    let mut config = world.config();
    config.target.base_url = base_url;
    let result = builder(world, config).build().await;
    world.build_succeeded = Some(result.is_ok());
}

#[when("the command center serves with a pre-cancelled token")]
async fn serves_pre_cancelled(world: &mut CommandCenterWorld) {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let center = builder(world, world.config())
        .with_cancellation_token(cancel)
        .build()
        .await
        .expect("command center should build");
    world.build_succeeded = Some(true);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let served = tokio::time::timeout(Duration::from_secs(5), center.serve(listener)).await;
    world.serve_succeeded = Some(matches!(served, Ok(Ok(()))));
}

#[then("the build should succeed")]
fn build_should_succeed(world: &mut CommandCenterWorld) {
    assert_eq!(world.build_succeeded, Some(true), "Expected build to succeed");
}

#[then("the build should fail")]
fn build_should_fail(world: &mut CommandCenterWorld) {
    assert_eq!(world.build_succeeded, Some(false), "Expected build to fail");
}

#[then("the service should shut down cleanly")]
fn shut_down_cleanly(world: &mut CommandCenterWorld) {
    assert_eq!(world.serve_succeeded, Some(true));
}
