//! Domain reducers. `update.rs` offers each message to them in turn; the
//! first one that returns `true` has consumed it.

pub mod agents;
pub mod auth;
pub mod chat;
pub mod files;
pub mod memory;
pub mod models;
pub mod plugins;
pub mod settings;
pub mod shell;
pub mod system;
pub mod workflow;

use crate::events::AppEvent;
use crate::messages::{Command, Region};
use crate::notifications::{NotificationId, Severity};
use crate::state::AppState;

/// Show a notification and schedule the toast repaint.
///
/// With notifications turned off in settings only errors are shown.
pub(crate) fn notify(state: &mut AppState, cmds: &mut Vec<Command>, message: &str, severity: Severity) {
    if !state.settings.notifications && severity != Severity::Error {
        log::debug!("notification suppressed: {}", message);
        return;
    }
    match severity {
        Severity::Success => state.notifications.success(message),
        Severity::Error => state.notifications.error(message),
        Severity::Warning => state.notifications.warning(message),
        Severity::Info => state.notifications.info(message),
    };
    cmds.push(Command::Publish(AppEvent::Notification {
        message: message.to_string(),
        severity,
    }));
    cmds.push(Command::Render(Region::Notifications));
}

/// Create or advance a progress notification, subject to the same setting
/// as [`notify`]. Returns `None` when nothing is shown.
pub(crate) fn notify_progress(
    state: &mut AppState,
    cmds: &mut Vec<Command>,
    id: Option<NotificationId>,
    message: &str,
    percent: f64,
) -> Option<NotificationId> {
    if !state.settings.notifications {
        log::debug!("progress suppressed: {}", message);
        return None;
    }
    let id = state.notifications.progress(id, message, percent);
    cmds.push(Command::Render(Region::Notifications));
    Some(id)
}

pub(crate) fn notify_error(state: &mut AppState, cmds: &mut Vec<Command>, context: &str, error: &str) {
    log::error!("{}: {}", context, error);
    notify(state, cmds, &format!("{}: {}", context, error), Severity::Error);
}
