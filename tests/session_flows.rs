//! End-to-end flows through `update` with local storage wired in.
//!
//! Storage commands are applied against an in-memory store the way the
//! browser executor applies them against `localStorage`; network commands
//! are handed back to the test, which answers with the message the API
//! client would have dispatched.
//!
//! Run with: cargo test --test session_flows

use std::rc::Rc;

use serde_json::json;

use agentk_frontend::canvas::NodeKind;
use agentk_frontend::constants::storage_keys;
use agentk_frontend::messages::{Command, ImportedData, Message};
use agentk_frontend::models::{ChatMessage, ChatResponse, ChatRole, Workflow};
use agentk_frontend::network::{ChatFrame, ConnectionState};
use agentk_frontend::notifications::ManualClock;
use agentk_frontend::settings::Theme;
use agentk_frontend::state::{AppState, Transport, View};
use agentk_frontend::storage::{MemoryStore, StorageManager};
use agentk_frontend::update::update;

struct Session {
    state: AppState,
    clock: ManualClock,
    storage: StorageManager<MemoryStore>,
}

impl Session {
    fn new() -> Self {
        let clock = ManualClock::new(1_700_000_000_000);
        Self {
            state: AppState::with_clock(Rc::new(clock.clone())),
            clock,
            storage: StorageManager::new(MemoryStore::new()),
        }
    }

    /// Run `msg` to completion and return the commands that would leave the
    /// process (HTTP, socket, DOM).
    fn send(&mut self, msg: Message) -> Vec<Command> {
        let mut outgoing = Vec::new();
        let mut queue = vec![msg];
        while let Some(msg) = queue.pop() {
            for cmd in update(&mut self.state, msg) {
                match cmd {
                    Command::SendMessage(next) => queue.push(next),
                    Command::PersistChatHistory { agent_id, messages } => {
                        self.storage
                            .save_chat_history(&agent_id, &messages)
                            .expect("save history");
                    }
                    Command::ClearStoredChatHistory(agent_id) => {
                        self.storage.clear_chat_history(&agent_id).expect("clear history");
                    }
                    Command::RecordRecentAgent(agent_id) => {
                        self.storage.add_recent_agent(&agent_id).expect("recent agent");
                    }
                    Command::PersistWorkflowDraft(draft) => {
                        self.storage
                            .set(storage_keys::WORKFLOW_DRAFT, &draft)
                            .expect("save draft");
                    }
                    Command::ClearWorkflowDraft => {
                        self.storage.remove(storage_keys::WORKFLOW_DRAFT).expect("drop draft");
                    }
                    Command::RestoreWorkflowDraft => {
                        if let Some(draft) = self.storage.get::<Workflow>(storage_keys::WORKFLOW_DRAFT) {
                            queue.push(Message::WorkflowDraftRestored(draft));
                        }
                    }
                    Command::PersistSettings(settings) => {
                        self.storage.set_app_settings(&settings).expect("save settings");
                    }
                    Command::ImportData(data) => {
                        self.storage.import_data(&data).expect("import data");
                        queue.push(Message::DataImported(Ok(ImportedData {
                            settings: self.storage.app_settings(),
                            recent_agents: self.storage.recent_agents(),
                        })));
                    }
                    Command::Render(_) | Command::Publish(_) => {}
                    other => outgoing.push(other),
                }
            }
        }
        outgoing
    }

    fn add_node(&mut self, kind: NodeKind) -> String {
        self.clock.advance(5);
        self.send(Message::AddNode(kind));
        self.state
            .workflows
            .builder
            .as_ref()
            .and_then(|b| b.graph.selected_id().map(str::to_string))
            .expect("new node is selected")
    }

    fn connect(&mut self, from: &str, to: &str) {
        self.send(Message::OutputHandleDown(from.to_string()));
        self.send(Message::InputHandleUp(to.to_string()));
        self.send(Message::CanvasPointerUp);
    }
}

fn reply(text: &str) -> ChatResponse {
    ChatResponse {
        message: text.to_string(),
        agent_id: None,
        timestamp: None,
    }
}

#[test]
fn chat_survives_socket_loss_and_keeps_local_history() {
    let mut session = Session::new();
    session
        .storage
        .save_chat_history(
            "a1",
            &[
                ChatMessage::new(ChatRole::User, "hi"),
                ChatMessage::new(ChatRole::Agent, "hello"),
            ],
        )
        .expect("seed history");

    let out = session.send(Message::OpenChat("a1".into()));
    assert!(out.iter().any(|c| matches!(c, Command::FetchChatHistory(id) if id == "a1")));
    assert!(out.iter().any(|c| matches!(c, Command::ConnectChatSocket(id) if id == "a1")));
    assert_eq!(session.state.current_view, View::Chat);
    assert_eq!(session.storage.recent_agents(), vec!["a1".to_string()]);

    // The history endpoint is down; local messages are shown.
    let local = session.storage.chat_history("a1");
    session.send(Message::ChatHistoryLoaded {
        agent_id: "a1".into(),
        remote: None,
        local,
    });
    session.send(Message::ChatSocketState {
        agent_id: "a1".into(),
        state: ConnectionState::Open,
    });

    let out = session.send(Message::SendChatMessage("  status?  ".into()));
    assert!(out.iter().any(|c| matches!(
        c,
        Command::SendChatFrame { frame: ChatFrame::Message { content }, .. } if content == "status?"
    )));
    let pending = session.state.chat.as_ref().and_then(|c| c.pending.clone());
    assert_eq!(pending.map(|p| p.via), Some(Transport::Socket));

    // A second message while waiting goes nowhere.
    assert!(session.send(Message::SendChatMessage("again".into())).is_empty());

    let out = session.send(Message::ChatSocketState {
        agent_id: "a1".into(),
        state: ConnectionState::Closed,
    });
    assert!(out.iter().any(|c| matches!(
        c,
        Command::SendChatHttp { agent_id, content } if agent_id == "a1" && content == "status?"
    )));

    session.send(Message::ChatHttpReply {
        agent_id: "a1".into(),
        result: Ok(reply("All systems nominal")),
    });

    let stored = session.storage.chat_history("a1");
    let contents: Vec<&str> = stored.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hi", "hello", "status?", "All systems nominal"]);
    assert!(session.state.chat.as_ref().map_or(false, |c| !c.is_waiting()));

    session.send(Message::ClearChatHistory);
    assert!(session.storage.chat_history("a1").is_empty());
}

#[test]
fn early_messages_keep_stored_history() {
    let mut session = Session::new();
    session
        .storage
        .save_chat_history(
            "a1",
            &[
                ChatMessage::new(ChatRole::User, "old-q"),
                ChatMessage::new(ChatRole::Agent, "old-a"),
            ],
        )
        .expect("seed history");

    session.send(Message::OpenChat("a1".into()));
    session.send(Message::SendChatMessage("early".into()));
    session.send(Message::ChatHttpReply {
        agent_id: "a1".into(),
        result: Ok(reply("reply")),
    });

    // The history request resolves after the exchange.
    let local = session.storage.chat_history("a1");
    session.send(Message::ChatHistoryLoaded {
        agent_id: "a1".into(),
        remote: None,
        local,
    });

    let expected = vec!["old-q", "old-a", "early", "reply"];
    let chat = session.state.chat.as_ref().expect("chat open");
    let shown: Vec<&str> = chat.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(shown, expected);
    let stored = session.storage.chat_history("a1");
    let stored: Vec<&str> = stored.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(stored, expected);
}

#[test]
fn late_replies_for_a_closed_chat_are_dropped() {
    let mut session = Session::new();
    session.send(Message::OpenChat("a1".into()));
    session.send(Message::SendChatMessage("hello?".into()));
    session.send(Message::OpenChat("a2".into()));

    session.send(Message::ChatHttpReply {
        agent_id: "a1".into(),
        result: Ok(reply("too late")),
    });

    let chat = session.state.chat.as_ref().expect("chat open");
    assert_eq!(chat.agent_id, "a2");
    assert!(chat.messages.is_empty());
    assert_eq!(session.storage.recent_agents(), vec!["a2".to_string(), "a1".to_string()]);
}

#[test]
fn autosaved_draft_is_restored_then_cleared_by_save() {
    let mut session = Session::new();
    session.send(Message::OpenWorkflowBuilder(None));
    session.send(Message::SetWorkflowName("Nightly report".into()));
    let start = session.add_node(NodeKind::Start);
    let agent = session.add_node(NodeKind::Agent);
    session.connect(&start, &agent);

    session.send(Message::AutosaveTick);
    let draft: Workflow = session
        .storage
        .get(storage_keys::WORKFLOW_DRAFT)
        .expect("draft stored");
    assert_eq!(draft.name, "Nightly report");
    assert_eq!(draft.nodes.len(), 2);
    assert_eq!(draft.connections.len(), 1);

    // Leave and come back: the blank builder picks the draft up.
    session.send(Message::CloseWorkflowBuilder);
    session.send(Message::OpenWorkflowBuilder(None));
    let builder = session.state.workflows.builder.as_ref().expect("builder open");
    assert_eq!(builder.workflow.name, "Nightly report");
    assert_eq!(builder.graph.node_count(), 2);
    assert!(builder.graph.has_connection(&start, &agent));
    assert!(builder.dirty);

    let out = session.send(Message::SaveWorkflow);
    let created = out
        .iter()
        .find_map(|c| match c {
            Command::CreateWorkflow(w) => Some(w.clone()),
            _ => None,
        })
        .expect("create request");
    // Start and end markers are layout only.
    assert_eq!(created.steps.len(), 1);

    session.send(Message::WorkflowSaved(Workflow {
        id: Some("wf-9".into()),
        ..created
    }));
    assert!(session
        .storage
        .get::<Workflow>(storage_keys::WORKFLOW_DRAFT)
        .is_none());
    assert!(session
        .state
        .workflows
        .list
        .iter()
        .any(|w| w.id.as_deref() == Some("wf-9")));

    // Saved workflows update in place from now on.
    let out = session.send(Message::SaveWorkflow);
    assert!(out
        .iter()
        .any(|c| matches!(c, Command::UpdateWorkflow { id, .. } if id == "wf-9")));
}

#[test]
fn autosave_respects_the_setting() {
    let mut session = Session::new();
    session.send(Message::UpdateSettings(json!({ "autoSave": false })));
    session.send(Message::OpenWorkflowBuilder(None));
    session.add_node(NodeKind::Agent);
    session.send(Message::AutosaveTick);
    assert!(session
        .storage
        .get::<Workflow>(storage_keys::WORKFLOW_DRAFT)
        .is_none());
}

#[test]
fn settings_changes_are_persisted_and_applied() {
    let mut session = Session::new();
    let out = session.send(Message::UpdateSettings(json!({
        "theme": "light",
        "autoSaveInterval": 45000
    })));
    assert!(out.iter().any(|c| matches!(c, Command::ApplyTheme(Theme::Light))));
    assert!(out
        .iter()
        .any(|c| matches!(c, Command::ScheduleAutosave(Some(45000)))));

    let stored = session.storage.app_settings();
    assert_eq!(stored.theme, Theme::Light);
    assert_eq!(stored.auto_save_interval, 45_000);

    session.send(Message::ResetSettings);
    assert_eq!(session.storage.app_settings().theme, Theme::Dark);
}

#[test]
fn exported_data_moves_to_another_browser_without_the_session() {
    let mut source = Session::new();
    source.send(Message::UpdateSettings(json!({ "theme": "light" })));
    source.send(Message::OpenChat("a1".into()));
    source.storage.set_auth_token("secret").expect("token");
    let exported = source.storage.export_data().expect("export");
    let raw = serde_json::to_string(&exported).expect("serialize");

    let mut target = Session::new();
    target.send(Message::ImportData(raw));

    assert_eq!(target.state.settings.theme, Theme::Light);
    assert_eq!(target.state.recent_agents, vec!["a1".to_string()]);
    assert_eq!(target.storage.app_settings().theme, Theme::Light);
    assert_eq!(target.storage.auth_token(), None);
}

#[test]
fn keyboard_shortcuts_drive_navigation() {
    use agentk_frontend::messages::KeyPress;

    let mut session = Session::new();
    session.send(Message::KeyPressed(KeyPress::plain("3")));
    assert_eq!(session.state.current_view, View::Chat);

    // Digits typed into a form field are text, not shortcuts.
    session.send(Message::KeyPressed(KeyPress {
        in_form_field: true,
        ..KeyPress::plain("1")
    }));
    assert_eq!(session.state.current_view, View::Chat);

    let out = session.send(Message::KeyPressed(KeyPress {
        ctrl: true,
        ..KeyPress::plain("k")
    }));
    assert!(out.iter().any(|c| matches!(c, Command::FocusSearch)));
}
