//! BDD step definitions for the login gate and dashboard API features

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use cucumber::{given, then, when};
use tower::ServiceExt;

use command_center::auth::{decode_token, Credentials, SESSION_COOKIE};
use command_center::io::HttpClient;
use command_center::CommandCenterBuilder;

use crate::world::CommandCenterWorld;

async fn send(world: &mut CommandCenterWorld, request: Request<Body>) {
    let credentials = world
        .credentials
        .clone()
        .map(|(username, password)| Credentials::new(username, password));
    let http: Arc<dyn HttpClient> = world.http.clone();
    let center = CommandCenterBuilder::new(world.config())
        .with_http_client(http)
        .with_credentials(credentials)
        .build()
        .await
        .expect("command center should build");

    let response = center.router().oneshot(request).await.expect("router");
    world.http_status = Some(response.status().as_u16());
    world.set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    world.body = serde_json::from_slice(&body).ok();
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request")
}

#[given(expr = "login secrets {string} and {string}")]
fn login_secrets(world: &mut CommandCenterWorld, username: String, password: String) {
    world.credentials = Some((username, password));
}

#[given("no login secrets")]
fn no_login_secrets(world: &mut CommandCenterWorld) {
    world.credentials = None;
}

#[when(expr = "logging in as {string} with password {string}")]
async fn logging_in(world: &mut CommandCenterWorld, username: String, password: String) {
    let body = serde_json::json!({ "username": username, "password": password }).to_string();
    send(world, post_json("/api/auth/login", body)).await;
}

#[when(expr = "a login request with body {string} is sent")]
async fn login_with_body(world: &mut CommandCenterWorld, body: String) {
    send(world, post_json("/api/auth/login", body)).await;
}

#[when(expr = "the dashboard receives GET {string}")]
async fn dashboard_get(world: &mut CommandCenterWorld, uri: String) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(world, request).await;
}

#[when(expr = "the dashboard receives POST {string} with body {string}")]
async fn dashboard_post(world: &mut CommandCenterWorld, uri: String, body: String) {
    send(world, post_json(&uri, body)).await;
}

#[then(expr = "the response status should be {int}")]
fn response_status(world: &mut CommandCenterWorld, status: u16) {
    assert_eq!(world.http_status, Some(status));
}

#[then(expr = "the response error should be {string}")]
fn response_error(world: &mut CommandCenterWorld, error: String) {
    let body = world.body.as_ref().expect("no JSON body");
    assert_eq!(body["error"], error);
}

/// `field` is a top-level key, or a JSON pointer when it starts with `/`
#[then(expr = "the response field {string} should be {string}")]
fn response_field(world: &mut CommandCenterWorld, field: String, value: String) {
    let body = world.body.as_ref().expect("no JSON body");
    let node = if field.starts_with('/') {
        body.pointer(&field).unwrap_or(&serde_json::Value::Null)
    } else {
        &body[&field]
    };
    let actual = match node {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    assert_eq!(actual, value);
}

#[then(expr = "a session cookie for {string} should be set")]
fn session_cookie_set(world: &mut CommandCenterWorld, username: String) {
    let cookie = world.set_cookie.as_ref().expect("no cookie set");
    let token = cookie
        .strip_prefix(&format!("{}=", SESSION_COOKIE))
        .and_then(|rest| rest.split(';').next())
        .expect("session cookie");
    let (user, timestamp) = decode_token(token).expect("decodable token");
    assert_eq!(user, username);
    assert!(timestamp > 0);
}

#[then(expr = "the cookie should include {string}")]
fn cookie_includes(world: &mut CommandCenterWorld, attribute: String) {
    let cookie = world.set_cookie.as_ref().expect("no cookie set");
    assert!(
        cookie.split("; ").any(|part| part == attribute),
        "cookie was {}",
        cookie
    );
}

#[then("no cookie should be set")]
fn no_cookie(world: &mut CommandCenterWorld) {
    assert_eq!(world.set_cookie, None);
}
