//! Side effects requested by the reducers.
//!
//! Network calls run in `spawn_local` futures and report back by
//! dispatching a message; storage and DOM effects run synchronously.

use serde_json::{json, Value};
use wasm_bindgen_futures::spawn_local;

use crate::app::AppHandle;
use crate::constants::{storage_keys, EXPORT_FILENAME};
use crate::error::ClientError;
use crate::messages::{Command, ImportedData, Message};
use crate::models::{AgentStatus, MemoryItem, PluginStatus, Workflow};
use crate::network::{ChatSocket, ConnectionState};
use crate::notifications::Severity;
use crate::storage::portable;

/// Log the detailed error and keep the user-facing text.
fn failure(context: &str, e: ClientError) -> String {
    log::error!("{}: {}", context, e);
    e.user_message().to_string()
}

fn report(app: &AppHandle, context: &str, e: ClientError) {
    let text = failure(context, e);
    app.dispatch(Message::Notify {
        message: format!("{}: {}", context, text),
        severity: Severity::Error,
    });
}

pub fn execute(app: &AppHandle, cmd: Command) {
    match cmd {
        Command::SendMessage(msg) => app.dispatch(msg),
        Command::Publish(event) => app.services().events.publish(&event),
        Command::Render(region) => crate::views::render(app, &region),

        // ---------------- Agents ----------------
        Command::FetchAgents { seq } => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .list_agents()
                    .await
                    .map_err(|e| failure("fetching agents", e));
                app.dispatch(Message::AgentsLoaded { seq, result });
            });
        }
        Command::CreateAgent(payload) => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().create_agent(&payload).await {
                    Ok(agent) => app.dispatch(Message::AgentCreated(agent)),
                    Err(e) => app.dispatch(Message::AgentRequestFailed(format!(
                        "Failed to create agent: {}",
                        failure("create agent", e)
                    ))),
                }
            });
        }
        Command::UpdateAgent { id, patch } => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().update_agent(&id, &patch).await {
                    Ok(agent) => app.dispatch(Message::AgentUpdated(agent)),
                    Err(e) => app.dispatch(Message::AgentRequestFailed(format!(
                        "Failed to update agent: {}",
                        failure("update agent", e)
                    ))),
                }
            });
        }
        Command::DeleteAgent(id) => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().delete_agent(&id).await {
                    Ok(()) => app.dispatch(Message::AgentDeleted(id)),
                    Err(e) => app.dispatch(Message::AgentRequestFailed(format!(
                        "Failed to delete agent: {}",
                        failure("delete agent", e)
                    ))),
                }
            });
        }
        Command::SetAgentActive { id, active } => {
            let app = app.clone();
            spawn_local(async move {
                let api = app.api();
                let result = if active {
                    api.activate_agent(&id).await
                } else {
                    api.deactivate_agent(&id).await
                };
                match result {
                    Ok(_) => app.dispatch(Message::AgentStatusChanged {
                        id,
                        status: if active {
                            AgentStatus::Active
                        } else {
                            AgentStatus::Inactive
                        },
                    }),
                    Err(e) => app.dispatch(Message::AgentRequestFailed(format!(
                        "Failed to change agent status: {}",
                        failure("toggle agent", e)
                    ))),
                }
            });
        }

        // ---------------- Chat ----------------
        Command::FetchChatAgent(agent_id) => {
            let app = app.clone();
            spawn_local(async move {
                let agent = match app.api().get_agent(&agent_id).await {
                    Ok(agent) => Some(agent),
                    Err(e) => {
                        log::warn!("agent {} unavailable: {}", agent_id, e);
                        None
                    }
                };
                app.dispatch(Message::ChatAgentLoaded { agent_id, agent });
            });
        }
        Command::FetchChatHistory(agent_id) => {
            // Read before the request: sends made while it is in flight
            // must not come back as stored history.
            let local = app.storage().chat_history(&agent_id);
            let app = app.clone();
            spawn_local(async move {
                let remote = match app.api().chat_history(&agent_id).await {
                    Ok(history) => Some(history),
                    Err(e) => {
                        log::warn!("remote history for {} unavailable: {}", agent_id, e);
                        None
                    }
                };
                app.dispatch(Message::ChatHistoryLoaded {
                    agent_id,
                    remote,
                    local,
                });
            });
        }
        Command::ConnectChatSocket(agent_id) => connect_socket(app, agent_id),
        Command::SendChatFrame { agent_id, frame } => {
            let sent = app.with_socket(|socket| match socket {
                Some(socket) if socket.agent_id() == agent_id => socket.send(&frame),
                _ => Err(ClientError::WebSocket("no socket for this chat".into())),
            });
            if let Err(e) = sent {
                log::warn!("socket send failed: {}", e);
                app.dispatch(Message::ChatSocketState {
                    agent_id,
                    state: ConnectionState::Failed,
                });
            }
        }
        Command::SendChatHttp { agent_id, content } => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .send_chat(&agent_id, &content)
                    .await
                    .map_err(|e| failure("sending chat message", e));
                app.dispatch(Message::ChatHttpReply { agent_id, result });
            });
        }
        Command::CloseChatSocket => app.replace_socket(None),
        Command::PersistChatHistory { agent_id, messages } => {
            if let Err(e) = app.storage().save_chat_history(&agent_id, &messages) {
                log::warn!("could not persist chat history: {}", e);
            }
        }
        Command::ClearStoredChatHistory(agent_id) => {
            if let Err(e) = app.storage().clear_chat_history(&agent_id) {
                log::warn!("could not clear chat history: {}", e);
            }
        }
        Command::RecordRecentAgent(agent_id) => {
            if let Err(e) = app.storage().add_recent_agent(&agent_id) {
                log::warn!("could not record recent agent: {}", e);
            }
        }

        // ---------------- Workflows ----------------
        Command::FetchWorkflows => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .list_workflows()
                    .await
                    .map_err(|e| failure("fetching workflows", e));
                app.dispatch(Message::WorkflowsLoaded(result));
            });
        }
        Command::FetchWorkflow(id) => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .get_workflow(&id)
                    .await
                    .map_err(|e| failure("fetching workflow", e));
                app.dispatch(Message::WorkflowLoaded(result));
            });
        }
        Command::CreateWorkflow(workflow) => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().create_workflow(&workflow).await {
                    Ok(saved) => app.dispatch(Message::WorkflowSaved(saved)),
                    Err(e) => app.dispatch(Message::WorkflowSaveFailed(failure("create workflow", e))),
                }
            });
        }
        Command::UpdateWorkflow { id, workflow } => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().update_workflow(&id, &workflow).await {
                    Ok(saved) => app.dispatch(Message::WorkflowSaved(saved)),
                    Err(e) => app.dispatch(Message::WorkflowSaveFailed(failure("update workflow", e))),
                }
            });
        }
        Command::DeleteWorkflow(id) => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().delete_workflow(&id).await {
                    Ok(()) => app.dispatch(Message::WorkflowDeleted(id)),
                    Err(e) => report(&app, "Failed to delete workflow", e),
                }
            });
        }
        Command::ExecuteWorkflow { id, input } => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .execute_workflow(&id, &input)
                    .await
                    .map(|execution| serde_json::to_value(execution).unwrap_or(Value::Null))
                    .map_err(|e| failure("executing workflow", e));
                app.dispatch(Message::WorkflowExecuted { id, result });
            });
        }
        Command::PersistWorkflowDraft(draft) => {
            match app.storage().set(storage_keys::WORKFLOW_DRAFT, &draft) {
                Ok(()) => log::debug!("workflow draft saved"),
                Err(e) => log::warn!("could not save workflow draft: {}", e),
            }
        }
        Command::RestoreWorkflowDraft => {
            if let Some(draft) = app.storage().get::<Workflow>(storage_keys::WORKFLOW_DRAFT) {
                app.dispatch(Message::WorkflowDraftRestored(draft));
            }
        }
        Command::ClearWorkflowDraft => {
            if let Err(e) = app.storage().remove(storage_keys::WORKFLOW_DRAFT) {
                log::debug!("could not clear workflow draft: {}", e);
            }
        }

        // ---------------- Models ----------------
        Command::FetchModels => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .list_models()
                    .await
                    .map_err(|e| failure("fetching models", e));
                app.dispatch(Message::ModelsLoaded(result));
            });
        }
        Command::FetchModelStatus => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .model_status()
                    .await
                    .map_err(|e| failure("fetching model status", e));
                app.dispatch(Message::ModelStatusLoaded(result));
            });
        }
        Command::TestConnection { provider, config } => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .test_connection(provider.as_str(), &config)
                    .await
                    .map(|body| connection_ok(&body))
                    .map_err(|e| failure("testing connection", e));
                app.dispatch(Message::ConnectionTested { provider, result });
            });
        }
        Command::SwitchModel { provider, name } => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .switch_model(provider.as_str(), &name)
                    .await
                    .map(|_| ())
                    .map_err(|e| failure("switching model", e));
                app.dispatch(Message::ModelSwitched { name, result });
            });
        }

        // ---------------- Memory ----------------
        Command::FetchMemory(agent_id) => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .list_memory(&agent_id)
                    .await
                    .map_err(|e| failure("fetching memory", e));
                app.dispatch(Message::MemoryLoaded { agent_id, result });
            });
        }
        Command::AddMemory { agent_id, content } => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .add_memory(&agent_id, &json!({ "content": content }))
                    .await
                    .map(|body| {
                        serde_json::from_value::<MemoryItem>(body).unwrap_or_else(|_| MemoryItem {
                            id: None,
                            agent_id,
                            content,
                            metadata: Value::Null,
                            timestamp: Some(chrono::Utc::now().to_rfc3339()),
                        })
                    })
                    .map_err(|e| failure("adding memory", e));
                app.dispatch(Message::MemoryAdded(result));
            });
        }
        Command::DeleteMemory(id) => {
            let app = app.clone();
            spawn_local(async move {
                match app.api().delete_memory(&id).await {
                    Ok(()) => app.dispatch(Message::MemoryDeleted(id)),
                    Err(e) => report(&app, "Failed to delete memory", e),
                }
            });
        }
        Command::SearchMemory(query) => {
            let Some(agent_id) = app.with_state(|s| s.memory.agent_id.clone()) else {
                return;
            };
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .search_memory(&agent_id, &query)
                    .await
                    .map_err(|e| failure("searching memory", e));
                app.dispatch(Message::MemorySearchResults(result));
            });
        }

        // ---------------- Settings / shell ----------------
        Command::PersistSettings(settings) => {
            if let Err(e) = app.storage().set_app_settings(&settings) {
                log::warn!("could not persist settings: {}", e);
            }
        }
        Command::ApplyTheme(theme) => {
            crate::views::apply_theme(theme);
            if let Err(e) = app.storage().set_theme(theme) {
                log::debug!("could not persist theme: {}", e);
            }
        }
        Command::ScheduleAutosave(interval) => app.schedule_autosave(interval),
        Command::FocusSearch => crate::dom_utils::focus(crate::views::shell::SEARCH_INPUT_ID),
        Command::DownloadJson { filename, contents } => {
            if let Err(e) = crate::dom_utils::download_json(&filename, &contents) {
                log::error!("download of {} failed: {}", filename, e);
            }
        }
        Command::CheckBackend => {
            let app = app.clone();
            spawn_local(async move {
                let healthy = app.api().check_connection().await;
                app.dispatch(Message::BackendHealth { healthy });
            });
        }
        Command::SetOfflineMode(offline) => app.api().set_offline(offline),
        Command::ExportData => {
            let exported = app
                .storage()
                .export_data()
                .and_then(|data| Ok(serde_json::to_string_pretty(&portable(data))?))
                .and_then(|contents| crate::dom_utils::download_json(EXPORT_FILENAME, &contents));
            if let Err(e) = exported {
                report(app, "Export failed", e);
            }
        }
        Command::ImportData(data) => {
            let storage = app.storage();
            let result = storage
                .import_data(&data)
                .map(|()| ImportedData {
                    settings: storage.app_settings(),
                    recent_agents: storage.recent_agents(),
                })
                .map_err(|e| failure("importing data", e));
            app.dispatch(Message::DataImported(result));
        }

        // ---------------- System ----------------
        Command::FetchSystemStatus => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .system_status()
                    .await
                    .map_err(|e| failure("fetching system status", e));
                app.dispatch(Message::SystemStatusLoaded(result));
            });
        }
        Command::FetchSystemMetrics => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .system_metrics()
                    .await
                    .map_err(|e| failure("fetching system metrics", e));
                app.dispatch(Message::SystemMetricsLoaded(result));
            });
        }
        Command::FetchSystemLogs => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .system_logs()
                    .await
                    .map_err(|e| failure("fetching system logs", e));
                app.dispatch(Message::SystemLogsLoaded(result));
            });
        }

        // ---------------- Files / plugins ----------------
        Command::FetchFiles => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .list_files()
                    .await
                    .map_err(|e| failure("fetching files", e));
                app.dispatch(Message::FilesLoaded(result));
            });
        }
        Command::OpenFileDownload(path) => {
            let url = app.api().file_download_url(&path);
            if let Err(e) = crate::dom_utils::open_in_new_tab(&url) {
                report(app, "Download failed", e);
            }
        }
        Command::DeleteFile(path) => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .delete_file(&path)
                    .await
                    .map(|()| path)
                    .map_err(|e| failure("delete file", e));
                app.dispatch(Message::FileDeleted(result));
            });
        }
        Command::FetchPlugins => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .list_plugins()
                    .await
                    .map_err(|e| failure("fetching plugins", e));
                app.dispatch(Message::PluginsLoaded(result));
            });
        }
        Command::SetPluginActive { id, active } => {
            let app = app.clone();
            spawn_local(async move {
                let api = app.api();
                let result = if active {
                    api.activate_plugin(&id).await
                } else {
                    api.deactivate_plugin(&id).await
                };
                let status = if active {
                    PluginStatus::Activated
                } else {
                    PluginStatus::Deactivated
                };
                let result = result
                    .map(|_| Some(status))
                    .map_err(|e| failure("toggle plugin", e));
                app.dispatch(Message::PluginChanged { id, result });
            });
        }
        Command::UninstallPlugin(id) => {
            let app = app.clone();
            spawn_local(async move {
                let result = app
                    .api()
                    .uninstall_plugin(&id)
                    .await
                    .map(|_| None)
                    .map_err(|e| failure("uninstall plugin", e));
                app.dispatch(Message::PluginChanged { id, result });
            });
        }

        // ---------------- Account ----------------
        Command::VerifySession => {
            let app = app.clone();
            spawn_local(async move {
                let api = app.api();
                let result = match api.verify().await {
                    Ok(user) => Ok(Some(user)),
                    Err(ClientError::Unauthorized) => {
                        // The client already dropped the token.
                        if let Err(e) = app.storage().remove_user_data() {
                            log::debug!("could not clear cached user: {}", e);
                        }
                        Err(failure("verifying session", ClientError::Unauthorized))
                    }
                    Err(e) => {
                        log::warn!("session check failed, using cached user: {}", e);
                        Ok(api.cached_user())
                    }
                };
                app.dispatch(Message::SessionVerified(result));
            });
        }
        Command::Login { username, password } => {
            let app = app.clone();
            spawn_local(async move {
                let api = app.api();
                let result = match api.login(&username, &password).await {
                    Ok(Some(user)) => Ok(user),
                    Ok(None) => api.verify().await,
                    Err(e) => Err(e),
                };
                let result = result.map_err(|e| failure("login", e));
                app.dispatch(Message::LoginFinished(result));
            });
        }
        Command::Logout => {
            let app = app.clone();
            spawn_local(async move {
                if let Err(e) = app.api().logout().await {
                    log::warn!("logout call failed: {}", e);
                }
                app.dispatch(Message::LoggedOut);
            });
        }
    }
}

/// The test endpoint answers `{"connected": bool}` or `{"success": bool}`;
/// any other 2xx body counts as connected.
fn connection_ok(body: &Value) -> bool {
    body.get("connected")
        .or_else(|| body.get("success"))
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn connect_socket(app: &AppHandle, agent_id: String) {
    if app.api().is_offline() {
        app.dispatch(Message::ChatSocketState {
            agent_id,
            state: ConnectionState::Failed,
        });
        return;
    }

    let url = app.api().chat_ws_url(&agent_id);
    let on_frame = {
        let app = app.clone();
        let agent_id = agent_id.clone();
        move |frame| {
            app.dispatch(Message::ChatFrameReceived {
                agent_id: agent_id.clone(),
                frame,
            })
        }
    };
    let on_state = {
        let app = app.clone();
        let agent_id = agent_id.clone();
        move |state| {
            app.dispatch(Message::ChatSocketState {
                agent_id: agent_id.clone(),
                state,
            })
        }
    };

    match ChatSocket::connect(&agent_id, &url, on_frame, on_state) {
        Ok(socket) => app.replace_socket(Some(socket)),
        Err(e) => {
            log::warn!("chat socket unavailable, using HTTP: {}", e);
            app.replace_socket(None);
            app.dispatch(Message::ChatSocketState {
                agent_id,
                state: ConnectionState::Failed,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_body_shapes() {
        assert!(connection_ok(&json!({ "connected": true })));
        assert!(!connection_ok(&json!({ "connected": false })));
        assert!(!connection_ok(&json!({ "success": false })));
        assert!(connection_ok(&json!({ "status": "ok" })));
        assert!(connection_ok(&Value::Null));
    }
}
