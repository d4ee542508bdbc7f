//! App shell: navigation, sidebar, search, focus and connectivity,
//! keyboard shortcuts and the notification clock.

use crate::constants::error_messages::{CONNECTION_LOST, OFFLINE};
use crate::constants::success_messages::CONNECTION_RESTORED;
use crate::events::AppEvent;
use crate::messages::{Command, KeyPress, Message, Region};
use crate::notifications::Severity;
use crate::state::{AppState, View};

use super::notify;

/// Returns `true` when the message was handled by the shell reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::Navigate(view) => {
            navigate(state, *view, cmds);
            true
        }
        Message::ToggleSidebar => {
            state.sidebar_open = !state.sidebar_open;
            cmds.push(Command::Render(Region::Shell));
            true
        }
        Message::OpenSidebar | Message::CloseSidebar => {
            let open = matches!(msg, Message::OpenSidebar);
            if state.sidebar_open != open {
                state.sidebar_open = open;
                cmds.push(Command::Render(Region::Shell));
            }
            true
        }
        Message::SetSearchQuery(query) => {
            if state.search_query != *query {
                state.search_query = query.clone();
                cmds.push(Command::Publish(AppEvent::SearchChanged {
                    query: query.clone(),
                }));
                // Search filters the agent list, so make sure it is visible.
                if !matches!(state.current_view, View::Agents | View::Dashboard) && !query.trim().is_empty() {
                    navigate(state, View::Agents, cmds);
                } else {
                    cmds.push(Command::Render(Region::Content));
                }
            }
            true
        }
        Message::WindowFocusChanged(focused) => {
            let regained = *focused && !state.window_focused;
            state.window_focused = *focused;
            if regained && !state.offline {
                cmds.push(Command::SendMessage(Message::LoadAgents));
                cmds.push(Command::FetchModelStatus);
            }
            true
        }
        Message::ConnectivityChanged { online } => {
            state.offline = !online;
            cmds.push(Command::SetOfflineMode(!online));
            if *online {
                notify(state, cmds, CONNECTION_RESTORED, Severity::Success);
                cmds.push(Command::CheckBackend);
                cmds.push(Command::SendMessage(Message::LoadAgents));
            } else {
                notify(state, cmds, CONNECTION_LOST, Severity::Warning);
            }
            cmds.push(Command::Render(Region::Shell));
            true
        }
        Message::BackendHealth { healthy } => {
            let was_offline = state.offline;
            state.offline = !healthy;
            if !healthy && !was_offline {
                notify(state, cmds, OFFLINE, Severity::Warning);
            }
            cmds.push(Command::Render(Region::Shell));
            true
        }
        Message::KeyPressed(key) => {
            handle_shortcut(state, key, cmds);
            true
        }
        Message::Tick(now) => {
            let expired = state.notifications.tick(*now);
            if !expired.is_empty() {
                cmds.push(Command::Render(Region::Notifications));
            }
            true
        }
        Message::Notify { message, severity } => {
            notify(state, cmds, message, *severity);
            true
        }
        Message::DismissNotification(id) => {
            if state.notifications.dismiss(*id) {
                cmds.push(Command::Render(Region::Notifications));
            }
            true
        }
        Message::LoadSystemStatus => {
            cmds.push(Command::FetchSystemStatus);
            true
        }
        Message::SystemStatusLoaded(result) => {
            match result {
                Ok(status) => state.system_status = Some(status.clone()),
                Err(e) => log::warn!("system status unavailable: {}", e),
            }
            if state.current_view == View::Dashboard {
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        _ => false,
    }
}

/// Switch views and kick off whatever data the target view needs.
pub(crate) fn navigate(state: &mut AppState, view: View, cmds: &mut Vec<Command>) {
    state.current_view = view;
    match view {
        View::Dashboard => {
            if !state.agents.loaded {
                cmds.push(Command::SendMessage(Message::LoadAgents));
            }
            cmds.push(Command::FetchSystemStatus);
            super::system::load(state, cmds);
        }
        View::Agents => {
            if !state.agents.loaded {
                cmds.push(Command::SendMessage(Message::LoadAgents));
            }
        }
        View::Workflows => cmds.push(Command::SendMessage(Message::LoadWorkflows)),
        View::Models => cmds.push(Command::SendMessage(Message::LoadModels)),
        View::Settings => {
            cmds.push(Command::SendMessage(Message::LoadFiles));
            cmds.push(Command::SendMessage(Message::LoadPlugins));
        }
        View::Chat => {}
    }
    cmds.push(Command::Publish(AppEvent::Navigated(view)));
    cmds.push(Command::Render(Region::Shell));
    cmds.push(Command::Render(Region::Content));
}

fn handle_shortcut(state: &mut AppState, key: &KeyPress, cmds: &mut Vec<Command>) {
    if (key.ctrl || key.meta) && key.key.eq_ignore_ascii_case("k") {
        cmds.push(Command::FocusSearch);
        return;
    }

    if key.key == "Escape" {
        if let Some(builder) = state.builder_mut() {
            builder.graph.cancel_connection();
        }
        if state.sidebar_open {
            state.sidebar_open = false;
            cmds.push(Command::Render(Region::Shell));
        }
        return;
    }

    if key.ctrl || key.meta || key.in_form_field {
        return;
    }
    let mut chars = key.key.chars();
    if let (Some(digit), None) = (chars.next(), chars.next()) {
        if let Some(view) = View::from_shortcut(digit) {
            navigate(state, view, cmds);
        }
    }
}
