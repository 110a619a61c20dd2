//! BDD step definitions for the error normalizer feature

use cucumber::{then, when};

use command_center::normalizer::normalize;

use crate::world::CommandCenterWorld;

#[when(expr = "the error payload {string} is normalized")]
fn payload_normalized(world: &mut CommandCenterWorld, payload: String) {
    let value: serde_json::Value = serde_json::from_str(&payload).expect("payload is JSON");
    world.normalized = Some(normalize(&value));
}

#[then(expr = "the message should be {string}")]
fn message_should_be(world: &mut CommandCenterWorld, message: String) {
    let normalized = world.normalized.as_ref().expect("nothing normalized");
    assert_eq!(normalized.message, message);
}

#[then(expr = "the extracted hint should be {string}")]
fn extracted_hint(world: &mut CommandCenterWorld, hint: String) {
    let normalized = world.normalized.as_ref().expect("nothing normalized");
    assert_eq!(normalized.hint.as_deref(), Some(hint.as_str()));
}

#[then("there should be no hint")]
fn no_hint(world: &mut CommandCenterWorld) {
    let normalized = world.normalized.as_ref().expect("nothing normalized");
    assert_eq!(normalized.hint, None);
}
