//! Settings: startup load, shallow patches, reset, and the side effects a
//! change implies (theme, autosave timer). Also the bulk export / import of
//! everything kept in local storage.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::constants::error_messages::INVALID_DATA_EXPORT;
use crate::constants::success_messages::{DATA_IMPORTED, SETTINGS_RESET, SETTINGS_SAVED};
use crate::events::AppEvent;
use crate::messages::{Command, Message, Region};
use crate::notifications::Severity;
use crate::settings::AppSettings;
use crate::state::AppState;
use crate::storage::portable;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the settings reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::SettingsLoaded(settings) => {
            load(state, settings, cmds);
            true
        }
        Message::UpdateSettings(patch) => {
            let next = state.settings.merged(patch);
            if next == state.settings {
                log::debug!("settings patch changed nothing");
                return true;
            }
            apply(state, next, cmds);
            notify(state, cmds, SETTINGS_SAVED, Severity::Success);
            true
        }
        Message::ResetSettings => {
            apply(state, AppSettings::default(), cmds);
            notify(state, cmds, SETTINGS_RESET, Severity::Info);
            true
        }
        Message::ExportData => {
            cmds.push(Command::ExportData);
            true
        }
        Message::ImportData(raw) => {
            match serde_json::from_str::<BTreeMap<String, Value>>(raw.trim()) {
                Ok(data) => {
                    let data = portable(data);
                    if data.is_empty() {
                        notify(state, cmds, INVALID_DATA_EXPORT, Severity::Error);
                    } else {
                        cmds.push(Command::ImportData(data));
                    }
                }
                Err(e) => {
                    log::warn!("rejected data import: {}", e);
                    notify(state, cmds, INVALID_DATA_EXPORT, Severity::Error);
                }
            }
            true
        }
        Message::DataImported(result) => {
            match result {
                Ok(imported) => {
                    state.recent_agents = imported.recent_agents.clone();
                    load(state, &imported.settings, cmds);
                    cmds.push(Command::Publish(AppEvent::SettingsChanged(imported.settings.clone())));
                    cmds.push(Command::Render(Region::Content));
                    notify(state, cmds, DATA_IMPORTED, Severity::Success);
                }
                Err(e) => notify_error(state, cmds, "Import failed", e),
            }
            true
        }
        _ => false,
    }
}

/// Adopt settings read from storage without writing them back.
fn load(state: &mut AppState, settings: &AppSettings, cmds: &mut Vec<Command>) {
    state.settings = settings.clone();
    cmds.push(Command::ApplyTheme(settings.theme));
    cmds.push(Command::ScheduleAutosave(autosave_interval(settings)));
    cmds.push(Command::Render(Region::Shell));
}

fn autosave_interval(settings: &AppSettings) -> Option<u32> {
    (settings.auto_save && settings.auto_save_interval > 0).then_some(settings.auto_save_interval)
}

fn apply(state: &mut AppState, next: AppSettings, cmds: &mut Vec<Command>) {
    let previous = std::mem::replace(&mut state.settings, next.clone());

    cmds.push(Command::PersistSettings(next.clone()));
    cmds.push(Command::Publish(AppEvent::SettingsChanged(next.clone())));
    if previous.theme != next.theme {
        cmds.push(Command::ApplyTheme(next.theme));
        cmds.push(Command::Publish(AppEvent::ThemeChanged(next.theme)));
    }
    if autosave_interval(&previous) != autosave_interval(&next) {
        cmds.push(Command::ScheduleAutosave(autosave_interval(&next)));
    }
    cmds.push(Command::Render(Region::Shell));
    cmds.push(Command::Render(Region::Content));
}
