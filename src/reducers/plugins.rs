//! Installed plugins: list, activate / deactivate, uninstall. One action at
//! a time; clicks while a call is in flight are ignored.

use crate::constants::success_messages::{PLUGIN_ACTIVATED, PLUGIN_DEACTIVATED, PLUGIN_UNINSTALLED};
use crate::messages::{Command, Message, Region};
use crate::models::PluginStatus;
use crate::notifications::Severity;
use crate::state::AppState;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the plugins reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadPlugins => {
            state.plugins.loading = true;
            cmds.push(Command::FetchPlugins);
            true
        }
        Message::PluginsLoaded(result) => {
            state.plugins.loading = false;
            match result {
                Ok(plugins) => state.plugins.list = plugins.clone(),
                Err(e) => log::warn!("plugins unavailable: {}", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SetPluginActive { id, active } => {
            if begin(state, id) {
                cmds.push(Command::SetPluginActive {
                    id: id.clone(),
                    active: *active,
                });
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::UninstallPlugin(id) => {
            if begin(state, id) {
                cmds.push(Command::UninstallPlugin(id.clone()));
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::PluginChanged { id, result } => {
            state.plugins.busy = None;
            match result {
                Ok(Some(status)) => {
                    if let Some(plugin) = state.plugins.list.iter_mut().find(|p| p.id == *id) {
                        plugin.status = *status;
                    }
                    let text = if *status == PluginStatus::Activated {
                        PLUGIN_ACTIVATED
                    } else {
                        PLUGIN_DEACTIVATED
                    };
                    notify(state, cmds, text, Severity::Success);
                }
                Ok(None) => {
                    state.plugins.list.retain(|p| p.id != *id);
                    notify(state, cmds, PLUGIN_UNINSTALLED, Severity::Success);
                }
                Err(e) => notify_error(state, cmds, "Plugin action failed", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        _ => false,
    }
}

fn begin(state: &mut AppState, id: &str) -> bool {
    if let Some(busy) = &state.plugins.busy {
        log::debug!("plugin {} is busy, ignoring action on {}", busy, id);
        return false;
    }
    state.plugins.busy = Some(id.to_string());
    true
}
