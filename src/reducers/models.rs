//! Model manager: available models, per-provider connection status,
//! connection tests and model switching.

use crate::constants::success_messages::MODEL_SWITCHED;
use crate::messages::{Command, Message, Region};
use crate::notifications::Severity;
use crate::state::AppState;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the models reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadModels => {
            state.models.loading = true;
            cmds.push(Command::FetchModels);
            cmds.push(Command::FetchModelStatus);
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ModelsLoaded(result) => {
            state.models.loading = false;
            match result {
                Ok(models) => {
                    state.models.active_model = models.iter().find(|m| m.active).map(|m| m.name.clone());
                    state.models.list = models.clone();
                }
                Err(e) => notify_error(state, cmds, "Failed to load models", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ModelStatusLoaded(result) => {
            match result {
                Ok(status) => state.models.status = status.clone(),
                // The status panel simply shows everything as disconnected.
                Err(e) => log::warn!("model status unavailable: {}", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::TestConnection { provider, config } => {
            if state.models.testing.is_some() {
                log::debug!("connection test already running");
                return true;
            }
            state.models.testing = Some(*provider);
            cmds.push(Command::TestConnection {
                provider: *provider,
                config: config.clone(),
            });
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ConnectionTested { provider, result } => {
            state.models.testing = None;
            let connected = matches!(result, Ok(true));
            state.models.status.set(*provider, connected);
            match result {
                Ok(true) => notify(
                    state,
                    cmds,
                    &format!("{} connection successful", provider.label()),
                    Severity::Success,
                ),
                Ok(false) => notify(
                    state,
                    cmds,
                    &format!("{} connection failed", provider.label()),
                    Severity::Warning,
                ),
                Err(e) => notify_error(
                    state,
                    cmds,
                    &format!("{} connection failed", provider.label()),
                    e,
                ),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SwitchModel { provider, name } => {
            if name.trim().is_empty() {
                notify(state, cmds, "Model name is required", Severity::Error);
                return true;
            }
            cmds.push(Command::SwitchModel {
                provider: *provider,
                name: name.trim().to_string(),
            });
            true
        }
        Message::ModelSwitched { name, result } => {
            match result {
                Ok(()) => {
                    for model in state.models.list.iter_mut() {
                        model.active = model.name == *name;
                    }
                    state.models.active_model = Some(name.clone());
                    notify(state, cmds, MODEL_SWITCHED, Severity::Success);
                }
                Err(e) => notify_error(state, cmds, "Failed to switch model", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelInfo, Provider};
    use crate::update::update;
    use serde_json::json;

    fn model(name: &str, active: bool) -> ModelInfo {
        ModelInfo {
            name: name.into(),
            provider: Some("ollama".into()),
            size: None,
            active,
        }
    }

    #[test]
    fn loaded_models_track_the_active_one() {
        let mut state = AppState::new();
        update(&mut state, Message::LoadModels);
        assert!(state.models.loading);
        update(
            &mut state,
            Message::ModelsLoaded(Ok(vec![model("llama2", false), model("mistral", true)])),
        );
        assert!(!state.models.loading);
        assert_eq!(state.models.active_model.as_deref(), Some("mistral"));
    }

    #[test]
    fn connection_test_sets_provider_status() {
        let mut state = AppState::new();
        update(
            &mut state,
            Message::TestConnection {
                provider: Provider::Ollama,
                config: json!({"url": "http://localhost:11434"}),
            },
        );
        assert_eq!(state.models.testing, Some(Provider::Ollama));
        update(
            &mut state,
            Message::ConnectionTested {
                provider: Provider::Ollama,
                result: Ok(true),
            },
        );
        assert!(state.models.status.is_connected(Provider::Ollama));
        assert!(state.models.testing.is_none());
        assert_eq!(
            state.notifications.active()[0].message,
            "Ollama connection successful"
        );

        update(
            &mut state,
            Message::ConnectionTested {
                provider: Provider::Ollama,
                result: Err("timeout".into()),
            },
        );
        assert!(!state.models.status.is_connected(Provider::Ollama));
    }

    #[test]
    fn switching_marks_single_active_model() {
        let mut state = AppState::new();
        state.models.list = vec![model("llama2", true), model("mistral", false)];
        update(
            &mut state,
            Message::ModelSwitched {
                name: "mistral".into(),
                result: Ok(()),
            },
        );
        let active: Vec<&str> = state
            .models
            .list
            .iter()
            .filter(|m| m.active)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(active, vec!["mistral"]);
    }

    #[test]
    fn blank_model_name_is_not_sent() {
        let mut state = AppState::new();
        let cmds = update(
            &mut state,
            Message::SwitchModel {
                provider: Provider::Openai,
                name: "  ".into(),
            },
        );
        assert!(!cmds.iter().any(|c| matches!(c, Command::SwitchModel { .. })));
    }
}
