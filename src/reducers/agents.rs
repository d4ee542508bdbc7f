//! Agent manager: the id-keyed cache, CRUD round trips, status toggles,
//! filters and config import / export.

use crate::constants::error_messages::INVALID_AGENT_CONFIG;
use crate::constants::success_messages::{
    AGENT_ACTIVATED, AGENT_CREATED, AGENT_DEACTIVATED, AGENT_DELETED, AGENT_UPDATED,
};
use crate::events::AppEvent;
use crate::messages::{Command, Message, Region};
use crate::models::{AgentConfigExport, AgentCreate, AgentStatus};
use crate::notifications::Severity;
use crate::state::AppState;
use crate::storage::push_recent;
use crate::utils::slugify;
use crate::validation;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the agents reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadAgents => {
            state.agents.load_seq += 1;
            state.agents.loading = true;
            cmds.push(Command::FetchAgents {
                seq: state.agents.load_seq,
            });
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::AgentsLoaded { seq, result } => {
            if *seq != state.agents.load_seq {
                log::debug!(
                    "dropping stale agent list (seq {}, current {})",
                    seq,
                    state.agents.load_seq
                );
                return true;
            }
            state.agents.loading = false;
            match result {
                Ok(agents) => {
                    state.agents.replace_all(agents.clone());
                    state.agents.loaded = true;
                    cmds.push(Command::Publish(AppEvent::AgentsLoaded {
                        count: agents.len(),
                    }));
                }
                Err(e) => {
                    // First load failing leaves an empty, usable list.
                    if !state.agents.loaded {
                        state.agents.replace_all(Vec::new());
                        state.agents.loaded = true;
                    }
                    notify_error(state, cmds, "Failed to load agents", e);
                }
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::CreateAgent(create) => {
            match check_create(create) {
                Ok(()) => cmds.push(Command::CreateAgent(create.clone())),
                Err(e) => notify(state, cmds, &e, Severity::Error),
            }
            true
        }
        Message::AgentCreated(agent) => {
            state.agents.upsert(agent.clone());
            state.recent_agents = push_recent(std::mem::take(&mut state.recent_agents), &agent.id);
            cmds.push(Command::RecordRecentAgent(agent.id.clone()));
            notify(state, cmds, AGENT_CREATED, Severity::Success);
            cmds.push(Command::Publish(AppEvent::AgentCreated(agent.clone())));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::UpdateAgent { id, patch } => {
            let checked = patch
                .name
                .as_deref()
                .map_or(Ok(()), validation::agent_name)
                .and_then(|_| {
                    patch
                        .description
                        .as_deref()
                        .map_or(Ok(()), validation::agent_description)
                });
            match checked {
                Ok(()) => cmds.push(Command::UpdateAgent {
                    id: id.clone(),
                    patch: patch.clone(),
                }),
                Err(e) => notify(state, cmds, &e, Severity::Error),
            }
            true
        }
        Message::AgentUpdated(agent) => {
            state.agents.upsert(agent.clone());
            if let Some(chat) = state.chat_for(&agent.id) {
                chat.agent = Some(agent.clone());
            }
            notify(state, cmds, AGENT_UPDATED, Severity::Success);
            cmds.push(Command::Publish(AppEvent::AgentUpdated(agent.clone())));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::DeleteAgent(id) => {
            cmds.push(Command::DeleteAgent(id.clone()));
            true
        }
        Message::AgentDeleted(id) => {
            state.agents.remove(id);
            state.recent_agents.retain(|r| r != id);
            if state.chat_for(id).is_some() {
                state.chat = None;
                cmds.push(Command::CloseChatSocket);
                cmds.push(Command::Publish(AppEvent::ChatClosed {
                    agent_id: id.clone(),
                }));
            }
            notify(state, cmds, AGENT_DELETED, Severity::Success);
            cmds.push(Command::Publish(AppEvent::AgentDeleted {
                agent_id: id.clone(),
            }));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SetAgentActive { id, active } => {
            cmds.push(Command::SetAgentActive {
                id: id.clone(),
                active: *active,
            });
            true
        }
        Message::AgentStatusChanged { id, status } => {
            if let Some(agent) = state.agents.get_mut(id) {
                agent.status = *status;
            }
            let text = if *status == AgentStatus::Active {
                AGENT_ACTIVATED
            } else {
                AGENT_DEACTIVATED
            };
            notify(state, cmds, text, Severity::Success);
            cmds.push(Command::Publish(AppEvent::AgentStatusChanged {
                agent_id: id.clone(),
                status: *status,
            }));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SetStatusFilter(filter) => {
            state.agents.status_filter = *filter;
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SetCapabilityFilter(filter) => {
            state.agents.capability_filter = *filter;
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ExportAgentConfig(id) => {
            let Some(agent) = state.agents.get(id) else {
                log::warn!("export requested for unknown agent {}", id);
                return true;
            };
            let export = AgentConfigExport {
                name: agent.name.clone(),
                description: agent.description.clone(),
                model: agent.model.clone(),
                capabilities: agent.capabilities.clone(),
                avatar: agent.avatar.clone(),
                exported_at: chrono::Utc::now().to_rfc3339(),
            };
            match serde_json::to_string_pretty(&export) {
                Ok(contents) => cmds.push(Command::DownloadJson {
                    filename: format!("{}-config.json", slugify(&export.name)),
                    contents,
                }),
                Err(e) => notify_error(state, cmds, "Failed to export agent", &e.to_string()),
            }
            true
        }
        Message::ImportAgentConfig(json) => {
            match serde_json::from_str::<AgentConfigExport>(json) {
                Ok(export) => {
                    let create = export.into_create();
                    match check_create(&create) {
                        Ok(()) => cmds.push(Command::CreateAgent(create)),
                        Err(e) => notify(state, cmds, &e, Severity::Error),
                    }
                }
                Err(e) => {
                    log::warn!("rejected agent config: {}", e);
                    notify(state, cmds, INVALID_AGENT_CONFIG, Severity::Error);
                }
            }
            true
        }
        Message::AgentRequestFailed(error) => {
            log::error!("{}", error);
            notify(state, cmds, error, Severity::Error);
            true
        }
        _ => false,
    }
}

fn check_create(create: &AgentCreate) -> validation::FieldResult {
    validation::agent_name(&create.name)?;
    validation::agent_description(&create.description)?;
    validation::required(&create.model, "Model")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Agent, Capability};
    use crate::update::update;

    fn agent(id: &str, name: &str) -> Agent {
        Agent {
            name: name.to_string(),
            model: "llama2".into(),
            status: AgentStatus::Active,
            ..Agent::unknown(id)
        }
    }

    fn fetch_seq(cmds: &[Command]) -> u64 {
        cmds.iter()
            .find_map(|c| match c {
                Command::FetchAgents { seq } => Some(*seq),
                _ => None,
            })
            .expect("FetchAgents command")
    }

    #[test]
    fn stale_load_responses_are_dropped() {
        let mut state = AppState::new();
        let first = fetch_seq(&update(&mut state, Message::LoadAgents));
        let second = fetch_seq(&update(&mut state, Message::LoadAgents));
        assert!(second > first);

        update(
            &mut state,
            Message::AgentsLoaded {
                seq: second,
                result: Ok(vec![agent("new", "Newer")]),
            },
        );
        update(
            &mut state,
            Message::AgentsLoaded {
                seq: first,
                result: Ok(vec![agent("old", "Older")]),
            },
        );
        assert_eq!(state.agents.len(), 1);
        assert!(state.agents.get("new").is_some());
        assert!(!state.agents.loading);
    }

    #[test]
    fn failed_initial_load_degrades_to_empty_list() {
        let mut state = AppState::new();
        let seq = fetch_seq(&update(&mut state, Message::LoadAgents));
        update(
            &mut state,
            Message::AgentsLoaded {
                seq,
                result: Err("Network error".into()),
            },
        );
        assert!(state.agents.loaded);
        assert!(state.agents.is_empty());
        assert_eq!(state.notifications.active()[0].severity, Severity::Error);
    }

    #[test]
    fn invalid_agent_is_not_submitted() {
        let mut state = AppState::new();
        let cmds = update(
            &mut state,
            Message::CreateAgent(AgentCreate {
                name: "x".into(),
                description: String::new(),
                model: "llama2".into(),
                capabilities: vec![],
                avatar: None,
            }),
        );
        assert!(!cmds.iter().any(|c| matches!(c, Command::CreateAgent(_))));
        assert_eq!(state.notifications.active().len(), 1);
    }

    #[test]
    fn created_agent_becomes_most_recent() {
        let mut state = AppState::new();
        state.recent_agents = vec!["old".into()];
        let cmds = update(&mut state, Message::AgentCreated(agent("new", "Scout")));
        assert_eq!(state.recent_agents, vec!["new".to_string(), "old".to_string()]);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, Command::RecordRecentAgent(id) if id == "new")));
        assert!(state.agents.get("new").is_some());
    }

    #[test]
    fn status_change_updates_cache_and_publishes() {
        let mut state = AppState::new();
        state.agents.upsert(agent("a1", "Alpha"));
        let cmds = update(
            &mut state,
            Message::AgentStatusChanged {
                id: "a1".into(),
                status: AgentStatus::Inactive,
            },
        );
        assert_eq!(state.agents.get("a1").unwrap().status, AgentStatus::Inactive);
        assert!(cmds.iter().any(|c| matches!(
            c,
            Command::Publish(AppEvent::AgentStatusChanged { status: AgentStatus::Inactive, .. })
        )));
        assert_eq!(state.notifications.active()[0].message, AGENT_DEACTIVATED);
    }

    #[test]
    fn deleting_the_chatted_agent_closes_the_chat() {
        let mut state = AppState::new();
        state.agents.upsert(agent("a1", "Alpha"));
        state.chat = Some(crate::state::ChatSession::new("a1", None));
        let cmds = update(&mut state, Message::AgentDeleted("a1".into()));
        assert!(state.chat.is_none());
        assert!(state.agents.is_empty());
        assert!(cmds.iter().any(|c| matches!(c, Command::CloseChatSocket)));
    }

    #[test]
    fn export_then_import_creates_agent() {
        let mut state = AppState::new();
        let mut a = agent("a1", "Research Bot");
        a.capabilities = vec![Capability::WebResearch];
        state.agents.upsert(a);

        let cmds = update(&mut state, Message::ExportAgentConfig("a1".into()));
        let (filename, contents) = cmds
            .iter()
            .find_map(|c| match c {
                Command::DownloadJson { filename, contents } => Some((filename.clone(), contents.clone())),
                _ => None,
            })
            .expect("download");
        assert_eq!(filename, "research-bot-config.json");

        let cmds = update(&mut state, Message::ImportAgentConfig(contents));
        let created = cmds
            .iter()
            .find_map(|c| match c {
                Command::CreateAgent(create) => Some(create.clone()),
                _ => None,
            })
            .expect("create");
        assert_eq!(created.name, "Research Bot");
        assert_eq!(created.capabilities, vec![Capability::WebResearch]);
    }

    #[test]
    fn garbage_import_is_rejected() {
        let mut state = AppState::new();
        let cmds = update(&mut state, Message::ImportAgentConfig("{nope".into()));
        assert!(!cmds.iter().any(|c| matches!(c, Command::CreateAgent(_))));
        assert_eq!(state.notifications.active()[0].message, INVALID_AGENT_CONFIG);
    }
}
