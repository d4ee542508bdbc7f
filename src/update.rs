// src/update.rs
//
use crate::messages::{Command, Message};
use crate::state::AppState;

/// Apply `msg` to `state` and return the side effects to run.
///
/// Pure: no DOM, network or storage access happens here, which is what lets
/// the reducers run under plain `cargo test`.
pub fn update(state: &mut AppState, msg: Message) -> Vec<Command> {
    let mut commands = Vec::new();

    if crate::reducers::shell::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::agents::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::chat::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::workflow::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::models::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::memory::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::settings::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::system::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::files::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::plugins::update(state, &msg, &mut commands) {
        return commands;
    }
    if crate::reducers::auth::update(state, &msg, &mut commands) {
        return commands;
    }

    log::warn!("unhandled message: {:?}", msg);
    commands
}
