//! Translation of delegated DOM events into [`Message`]s.
//!
//! Markup carries `data-action` / `data-id` / `data-value` on clickable
//! elements, `data-form` on forms, `data-input` on live text fields and
//! `data-setting` / `data-filter` on selects and checkboxes. The listeners
//! in `views::mount` only read those attributes; everything below is plain
//! string matching and runs under `cargo test`.

use serde_json::{json, Map, Value};

use crate::canvas::graph::NodeKind;
use crate::models::{AgentCreate, AgentStatus, AgentUpdate, Capability, LogLevel, Provider};
use crate::messages::Message;
use crate::settings::Theme;
use crate::state::{MonitorTab, View};
use crate::validation::{self, FormData, ModelConfigInput};

/// Confirmation text for destructive actions.
pub fn confirmation(action: &str) -> Option<&'static str> {
    match action {
        "delete-agent" => Some("Are you sure you want to delete this agent?"),
        "delete-workflow" => Some("Are you sure you want to delete this workflow?"),
        "delete-memory" => Some("Delete this memory item?"),
        "clear-chat" => Some("Clear the chat history for this agent?"),
        "reset-settings" => Some("Reset all settings to their defaults?"),
        "delete-file" => Some("Delete this file?"),
        "uninstall-plugin" => Some("Uninstall this plugin?"),
        "clear-logs" => Some("Clear the log view?"),
        _ => None,
    }
}

pub fn click_message(action: &str, id: Option<&str>, value: Option<&str>) -> Option<Message> {
    let owned = || id.map(str::to_string);
    let msg = match action {
        "navigate" => Message::Navigate(View::parse(value?)?),
        "toggle-sidebar" => Message::ToggleSidebar,
        "close-sidebar" => Message::CloseSidebar,

        "refresh-agents" => Message::LoadAgents,
        "open-chat" => Message::OpenChat(owned()?),
        "activate-agent" => Message::SetAgentActive { id: owned()?, active: true },
        "deactivate-agent" => Message::SetAgentActive { id: owned()?, active: false },
        "delete-agent" => Message::DeleteAgent(owned()?),
        "export-agent" => Message::ExportAgentConfig(owned()?),
        "show-memory" => Message::LoadMemory(owned()?),
        "delete-memory" => Message::DeleteMemory(owned()?),
        "clear-memory-search" => Message::ClearMemorySearch,

        "clear-chat" => Message::ClearChatHistory,
        "close-chat" => Message::CloseChat,

        "new-workflow" => Message::OpenWorkflowBuilder(None),
        "edit-workflow" => Message::OpenWorkflowBuilder(Some(owned()?)),
        "delete-workflow" => Message::DeleteWorkflow(owned()?),
        "execute-workflow" => Message::ExecuteWorkflow(owned()?),
        "close-builder" => Message::CloseWorkflowBuilder,
        "save-workflow" => Message::SaveWorkflow,
        "add-node" => Message::AddNode(NodeKind::parse(value?)?),
        "select-node" => Message::SelectNode(owned()?),
        "remove-node" => Message::RemoveNode(owned()?),

        "refresh-models" => Message::LoadModels,
        "switch-model" => Message::SwitchModel {
            provider: Provider::parse(value?)?,
            name: owned()?,
        },

        "reset-settings" => Message::ResetSettings,
        "refresh-status" => Message::LoadSystemStatus,
        "export-data" => Message::ExportData,
        "logout" => Message::Logout,

        "refresh-monitor" => Message::LoadMonitor,
        "monitor-tab" => Message::SetMonitorTab(MonitorTab::parse(value?)?),
        "clear-logs" => Message::ClearSystemLogs,

        "refresh-files" => Message::LoadFiles,
        "download-file" => Message::DownloadFile(owned()?),
        "delete-file" => Message::DeleteFile(owned()?),

        "refresh-plugins" => Message::LoadPlugins,
        "activate-plugin" => Message::SetPluginActive { id: owned()?, active: true },
        "deactivate-plugin" => Message::SetPluginActive { id: owned()?, active: false },
        "uninstall-plugin" => Message::UninstallPlugin(owned()?),
        _ => return None,
    };
    Some(msg)
}

fn field<'a>(values: &'a FormData, key: &str) -> &'a str {
    values.get(key).map(|v| v.trim()).unwrap_or("")
}

fn capabilities(values: &FormData) -> Vec<Capability> {
    field(values, "capabilities")
        .split(',')
        .filter_map(|c| Capability::parse(c.trim()))
        .collect()
}

/// Message for a submitted `data-form`. `Err` carries a validation message
/// to show instead.
pub fn submit_message(form: &str, id: Option<&str>, values: &FormData) -> Result<Option<Message>, String> {
    let msg = match form {
        "create-agent" => Message::CreateAgent(AgentCreate {
            name: field(values, "name").to_string(),
            description: field(values, "description").to_string(),
            model: field(values, "model").to_string(),
            capabilities: capabilities(values),
            avatar: Some(field(values, "avatar"))
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }),
        "edit-agent" => {
            let Some(id) = id else { return Ok(None) };
            Message::UpdateAgent {
                id: id.to_string(),
                patch: AgentUpdate {
                    name: Some(field(values, "name").to_string()),
                    description: Some(field(values, "description").to_string()),
                    model: Some(field(values, "model").to_string()).filter(|m| !m.is_empty()),
                    capabilities: Some(capabilities(values)),
                    ..Default::default()
                },
            }
        }
        "import-agent" => {
            let raw = field(values, "config");
            if raw.is_empty() {
                return Err("Paste an exported agent configuration first".to_string());
            }
            Message::ImportAgentConfig(raw.to_string())
        }
        "chat" => {
            let text = field(values, "message");
            if text.is_empty() {
                return Ok(None);
            }
            Message::SendChatMessage(text.to_string())
        }
        "node-properties" => {
            let Some(node_id) = id else { return Ok(None) };
            Message::SubmitNodeProperties {
                node_id: node_id.to_string(),
                values: values.clone(),
            }
        }
        "test-connection" => {
            let (provider, config) = model_config(values)?;
            Message::TestConnection { provider, config }
        }
        "add-memory" => {
            let Some(agent_id) = id else { return Ok(None) };
            let content = field(values, "content");
            if content.is_empty() {
                return Ok(None);
            }
            Message::AddMemory {
                agent_id: agent_id.to_string(),
                content: content.to_string(),
            }
        }
        "search-memory" => {
            let query = field(values, "query");
            if query.is_empty() {
                Message::ClearMemorySearch
            } else {
                Message::SearchMemory(query.to_string())
            }
        }
        "login" => {
            let username = field(values, "username");
            // Passwords are taken verbatim.
            let password = values.get("password").map(String::as_str).unwrap_or("");
            validation::required(username, "Username")?;
            validation::min_length(username, 3, "Username")?;
            validation::required(password, "Password")?;
            Message::Login {
                username: username.to_string(),
                password: password.to_string(),
            }
        }
        "import-data" => {
            let raw = field(values, "data");
            if raw.is_empty() {
                return Err("Paste exported data first".to_string());
            }
            Message::ImportData(raw.to_string())
        }
        _ => return Ok(None),
    };
    Ok(Some(msg))
}

/// Parse and validate the connection test form into the provider and the
/// body posted to `/models/test-connection`.
fn model_config(values: &FormData) -> Result<(Provider, Value), String> {
    let temperature = match field(values, "temperature") {
        "" => None,
        raw => Some(
            raw.parse::<f64>()
                .map_err(|_| "Temperature must be a number".to_string())?,
        ),
    };
    let input = ModelConfigInput {
        model_type: field(values, "type").to_string(),
        model_name: field(values, "name").to_string(),
        temperature,
    };
    validation::model_config(Some(&input))?;
    let provider = Provider::parse(&input.model_type)
        .ok_or_else(|| format!("Unknown model type {}", input.model_type))?;

    let mut config = Map::new();
    config.insert("type".into(), json!(input.model_type));
    config.insert("name".into(), json!(input.model_name));
    let url = field(values, "url");
    if !url.is_empty() {
        validation::url(url, "Server URL")?;
        config.insert("url".into(), json!(url));
    }
    if let Some(t) = temperature {
        config.insert("temperature".into(), json!(t));
    }
    Ok((provider, Value::Object(config)))
}

/// Forms cleared after a successful submit.
pub fn resets_after_submit(form: &str) -> bool {
    matches!(
        form,
        "create-agent" | "import-agent" | "chat" | "add-memory" | "login" | "import-data"
    )
}

/// Live text input (`data-input`).
pub fn input_message(kind: &str, value: &str) -> Option<Message> {
    match kind {
        "search" => Some(Message::SetSearchQuery(value.to_string())),
        "workflow-name" => Some(Message::SetWorkflowName(value.to_string())),
        _ => None,
    }
}

/// Select / checkbox filters (`data-filter`). An empty value clears it.
pub fn filter_message(kind: &str, value: &str) -> Option<Message> {
    match kind {
        "status" => Some(Message::SetStatusFilter(AgentStatus::parse(value))),
        "capability" => Some(Message::SetCapabilityFilter(Capability::parse(value))),
        "log-level" => Some(Message::SetLogLevelFilter(LogLevel::parse(value))),
        _ => None,
    }
}

/// Settings patch for a changed `data-setting` control. Checkboxes report
/// `"true"` / `"false"`; the autosave interval is entered in seconds.
pub fn setting_patch(key: &str, value: &str) -> Option<Value> {
    let value = match key {
        "theme" => json!(Theme::parse(value)?.as_str()),
        "language" => json!(value),
        "fontSize" => match value {
            "small" | "medium" | "large" => json!(value),
            _ => return None,
        },
        "autoSave" | "notifications" | "soundEffects" | "reduceMotion" => {
            json!(value.parse::<bool>().ok()?)
        }
        "autoSaveInterval" => {
            let seconds = value.trim().parse::<u32>().ok().filter(|s| *s > 0)?;
            json!(seconds.saturating_mul(1000))
        }
        _ => return None,
    };
    let mut patch = Map::new();
    patch.insert(key.to_string(), value);
    Some(Value::Object(patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn click_actions_need_their_attributes() {
        assert!(matches!(
            click_message("navigate", None, Some("models")),
            Some(Message::Navigate(View::Models))
        ));
        assert!(click_message("navigate", None, Some("nowhere")).is_none());
        assert!(click_message("open-chat", None, None).is_none());
        assert!(matches!(
            click_message("deactivate-agent", Some("a1"), None),
            Some(Message::SetAgentActive { active: false, .. })
        ));
        assert!(matches!(
            click_message("add-node", None, Some("condition")),
            Some(Message::AddNode(NodeKind::Condition))
        ));
        assert!(click_message("unknown", Some("x"), None).is_none());
    }

    #[test]
    fn destructive_actions_ask_first() {
        assert!(confirmation("delete-agent").is_some());
        assert!(confirmation("open-chat").is_none());
    }

    #[test]
    fn create_agent_form_collects_capabilities() {
        let values = form(&[
            ("name", " Researcher "),
            ("model", "llama2"),
            ("capabilities", "web_research,summarization,bogus"),
        ]);
        let Ok(Some(Message::CreateAgent(create))) = submit_message("create-agent", None, &values) else {
            panic!("expected CreateAgent");
        };
        assert_eq!(create.name, "Researcher");
        assert_eq!(
            create.capabilities,
            vec![Capability::WebResearch, Capability::Summarization]
        );
        assert_eq!(create.avatar, None);
    }

    #[test]
    fn blank_chat_submit_is_ignored() {
        assert!(matches!(submit_message("chat", None, &form(&[("message", "  ")])), Ok(None)));
    }

    #[test]
    fn connection_form_is_validated() {
        let bad = form(&[("type", "ollama"), ("name", "llama2"), ("temperature", "3")]);
        assert!(submit_message("test-connection", None, &bad).is_err());

        let good = form(&[
            ("type", "ollama"),
            ("name", "llama2"),
            ("url", "http://localhost:11434"),
            ("temperature", "0.7"),
        ]);
        let Ok(Some(Message::TestConnection { provider, config })) =
            submit_message("test-connection", None, &good)
        else {
            panic!("expected TestConnection");
        };
        assert_eq!(provider, Provider::Ollama);
        assert_eq!(config["url"], "http://localhost:11434");
        assert_eq!(config["temperature"], 0.7);
    }

    #[test]
    fn empty_memory_search_clears_results() {
        assert!(matches!(
            submit_message("search-memory", None, &form(&[("query", "")])),
            Ok(Some(Message::ClearMemorySearch))
        ));
    }

    #[test]
    fn login_form_checks_fields_before_sending() {
        assert_eq!(
            submit_message("login", None, &form(&[("username", ""), ("password", "x")])).err(),
            Some("Username is required".to_string())
        );
        assert!(submit_message("login", None, &form(&[("username", "al"), ("password", "secret")])).is_err());
        assert_eq!(
            submit_message("login", None, &form(&[("username", "ada")])).err(),
            Some("Password is required".to_string())
        );
        let Ok(Some(Message::Login { username, password })) =
            submit_message("login", None, &form(&[("username", " ada "), ("password", " pass ")]))
        else {
            panic!("expected Login");
        };
        assert_eq!(username, "ada");
        assert_eq!(password, " pass ");
    }

    #[test]
    fn data_import_needs_content() {
        assert!(submit_message("import-data", None, &form(&[("data", " ")])).is_err());
        assert!(matches!(
            submit_message("import-data", None, &form(&[("data", "{}")])),
            Ok(Some(Message::ImportData(raw))) if raw == "{}"
        ));
    }

    #[test]
    fn file_and_plugin_actions_carry_their_target() {
        assert!(matches!(
            click_message("download-file", Some("docs/a.txt"), None),
            Some(Message::DownloadFile(path)) if path == "docs/a.txt"
        ));
        assert!(click_message("delete-file", None, None).is_none());
        assert!(confirmation("delete-file").is_some());
        assert!(matches!(
            click_message("deactivate-plugin", Some("p1"), None),
            Some(Message::SetPluginActive { active: false, .. })
        ));
        assert!(confirmation("uninstall-plugin").is_some());
        assert!(matches!(
            click_message("monitor-tab", None, Some("logs")),
            Some(Message::SetMonitorTab(MonitorTab::Logs))
        ));
    }

    #[test]
    fn settings_patches_use_stored_units() {
        assert_eq!(setting_patch("autoSaveInterval", "45"), Some(json!({ "autoSaveInterval": 45000 })));
        assert_eq!(setting_patch("autoSaveInterval", "0"), None);
        assert_eq!(setting_patch("theme", "light"), Some(json!({ "theme": "light" })));
        assert_eq!(setting_patch("theme", "neon"), None);
        assert_eq!(setting_patch("reduceMotion", "true"), Some(json!({ "reduceMotion": true })));
    }

    #[test]
    fn empty_filter_value_clears_filter() {
        assert!(matches!(filter_message("status", ""), Some(Message::SetStatusFilter(None))));
        assert!(matches!(
            filter_message("capability", "translation"),
            Some(Message::SetCapabilityFilter(Some(Capability::Translation)))
        ));
        assert!(matches!(filter_message("log-level", ""), Some(Message::SetLogLevelFilter(None))));
        assert!(matches!(
            filter_message("log-level", "WARNING"),
            Some(Message::SetLogLevelFilter(Some(LogLevel::Warning)))
        ));
    }
}
