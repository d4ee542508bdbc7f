//! Memory manager: per-agent memory items, add / delete and search.

use crate::constants::success_messages::MEMORY_ADDED;
use crate::messages::{Command, Message, Region};
use crate::notifications::Severity;
use crate::state::AppState;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the memory reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadMemory(agent_id) => {
            if state.memory.agent_id.as_deref() != Some(agent_id.as_str()) {
                state.memory.items.clear();
                state.memory.search_results = None;
            }
            state.memory.agent_id = Some(agent_id.clone());
            state.memory.loading = true;
            cmds.push(Command::FetchMemory(agent_id.clone()));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::MemoryLoaded { agent_id, result } => {
            if state.memory.agent_id.as_deref() != Some(agent_id.as_str()) {
                return true;
            }
            state.memory.loading = false;
            match result {
                Ok(items) => state.memory.items = items.clone(),
                Err(e) => notify_error(state, cmds, "Failed to load memory", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::AddMemory { agent_id, content } => {
            if content.trim().is_empty() {
                return true;
            }
            cmds.push(Command::AddMemory {
                agent_id: agent_id.clone(),
                content: content.trim().to_string(),
            });
            true
        }
        Message::MemoryAdded(result) => {
            match result {
                Ok(item) => {
                    if state.memory.agent_id.as_deref() == Some(item.agent_id.as_str()) {
                        state.memory.items.push(item.clone());
                    }
                    notify(state, cmds, MEMORY_ADDED, Severity::Success);
                }
                Err(e) => notify_error(state, cmds, "Failed to add memory", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::DeleteMemory(id) => {
            cmds.push(Command::DeleteMemory(id.clone()));
            true
        }
        Message::MemoryDeleted(id) => {
            state.memory.items.retain(|m| m.id.as_deref() != Some(id.as_str()));
            if let Some(results) = state.memory.search_results.as_mut() {
                results.retain(|m| m.id.as_deref() != Some(id.as_str()));
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SearchMemory(query) => {
            if query.trim().is_empty() {
                state.memory.search_results = None;
                cmds.push(Command::Render(Region::Content));
            } else if state.memory.agent_id.is_some() {
                cmds.push(Command::SearchMemory(query.trim().to_string()));
            }
            true
        }
        Message::MemorySearchResults(result) => {
            match result {
                Ok(items) => state.memory.search_results = Some(items.clone()),
                Err(e) => notify_error(state, cmds, "Memory search failed", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ClearMemorySearch => {
            state.memory.search_results = None;
            cmds.push(Command::Render(Region::Content));
            true
        }
        _ => false,
    }
}
