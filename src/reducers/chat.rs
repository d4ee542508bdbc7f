//! Chat manager: one open session at a time, socket first with a one-shot
//! HTTP fallback, history merged from the API and local storage.

use crate::constants::success_messages::CHAT_CLEARED;
use crate::constants::CHAT_ERROR_REPLY;
use crate::events::AppEvent;
use crate::messages::{Command, Message, Region};
use crate::models::{Agent, ChatMessage, ChatRole};
use crate::network::{ChatFrame, ConnectionState};
use crate::notifications::Severity;
use crate::state::{merge_history, AppState, ChatSession, PendingReply, Transport, View};
use crate::storage::push_recent;

use super::{notify, notify_error, shell};

/// Returns `true` when the message was handled by the chat reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::OpenChat(agent_id) => {
            open_chat(state, agent_id, cmds);
            true
        }
        Message::ChatAgentLoaded { agent_id, agent } => {
            if let Some(chat) = state.chat_for(agent_id) {
                chat.agent = Some(agent.clone().unwrap_or_else(|| Agent::unknown(agent_id)));
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::ChatHistoryLoaded {
            agent_id,
            remote,
            local,
        } => {
            if let Some(chat) = state.chat_for(agent_id) {
                // Anything sent before the history arrived stays at the end.
                let sent_meanwhile = std::mem::take(&mut chat.messages);
                chat.messages = merge_history(remote.clone(), local.clone());
                chat.messages.extend(sent_meanwhile);
                chat.history_loaded = true;
                cmds.push(Command::PersistChatHistory {
                    agent_id: agent_id.clone(),
                    messages: chat.messages.clone(),
                });
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::ChatSocketState {
            agent_id,
            state: socket,
        } => {
            if let Some(chat) = state.chat_for(agent_id) {
                chat.socket = *socket;
                let lost = matches!(socket, ConnectionState::Closed | ConnectionState::Failed);
                if lost {
                    if let Some(pending) = chat.pending.as_mut().filter(|p| p.via == Transport::Socket) {
                        log::info!("chat socket lost, resending over HTTP");
                        pending.via = Transport::Http;
                        cmds.push(Command::SendChatHttp {
                            agent_id: agent_id.clone(),
                            content: pending.content.clone(),
                        });
                    }
                }
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::SendChatMessage(text) => {
            send_message(state, text, cmds);
            true
        }
        Message::ChatFrameReceived { agent_id, frame } => {
            let Some(chat) = state.chat_for(agent_id) else {
                return true;
            };
            match frame {
                ChatFrame::Response { message } => {
                    chat.pending = None;
                    append(chat, ChatMessage::new(ChatRole::Agent, message.as_str()), cmds);
                }
                ChatFrame::Error { message } => {
                    chat.pending = None;
                    append(chat, ChatMessage::new(ChatRole::System, message.as_str()), cmds);
                    notify_error(state, cmds, "Chat error", message);
                }
                ChatFrame::Message { .. } => {
                    log::debug!("ignoring echoed user frame");
                    return true;
                }
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ChatHttpReply { agent_id, result } => {
            let Some(chat) = state.chat_for(agent_id) else {
                return true;
            };
            chat.pending = None;
            match result {
                Ok(reply) => {
                    append(chat, ChatMessage::new(ChatRole::Agent, reply.message.as_str()), cmds);
                }
                Err(e) => {
                    append(chat, ChatMessage::new(ChatRole::Agent, CHAT_ERROR_REPLY), cmds);
                    notify_error(state, cmds, "Failed to send message", e);
                }
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ClearChatHistory => {
            let Some(chat) = state.chat.as_mut() else {
                return true;
            };
            chat.messages.clear();
            cmds.push(Command::ClearStoredChatHistory(chat.agent_id.clone()));
            notify(state, cmds, CHAT_CLEARED, Severity::Info);
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::CloseChat => {
            if let Some(chat) = state.chat.take() {
                cmds.push(Command::CloseChatSocket);
                cmds.push(Command::Publish(AppEvent::ChatClosed {
                    agent_id: chat.agent_id,
                }));
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        _ => false,
    }
}

fn open_chat(state: &mut AppState, agent_id: &str, cmds: &mut Vec<Command>) {
    if state.chat_for(agent_id).is_none() {
        if let Some(previous) = state.chat.take() {
            cmds.push(Command::CloseChatSocket);
            cmds.push(Command::Publish(AppEvent::ChatClosed {
                agent_id: previous.agent_id,
            }));
        }

        let agent = state.agents.get(agent_id).cloned();
        if agent.is_none() {
            cmds.push(Command::FetchChatAgent(agent_id.to_string()));
        }
        state.chat = Some(ChatSession::new(agent_id, agent));
        state.recent_agents = push_recent(std::mem::take(&mut state.recent_agents), agent_id);

        cmds.push(Command::FetchChatHistory(agent_id.to_string()));
        cmds.push(Command::ConnectChatSocket(agent_id.to_string()));
        cmds.push(Command::RecordRecentAgent(agent_id.to_string()));
        cmds.push(Command::Publish(AppEvent::ChatOpened {
            agent_id: agent_id.to_string(),
        }));
    }
    shell::navigate(state, View::Chat, cmds);
}

fn send_message(state: &mut AppState, text: &str, cmds: &mut Vec<Command>) {
    let content = text.trim();
    if content.is_empty() {
        return;
    }
    let Some(chat) = state.chat.as_mut() else {
        log::warn!("message typed with no chat open");
        return;
    };
    if chat.is_waiting() {
        log::debug!("reply pending, ignoring new message");
        return;
    }

    let via = if chat.socket == ConnectionState::Open {
        cmds.push(Command::SendChatFrame {
            agent_id: chat.agent_id.clone(),
            frame: ChatFrame::user(content),
        });
        Transport::Socket
    } else {
        cmds.push(Command::SendChatHttp {
            agent_id: chat.agent_id.clone(),
            content: content.to_string(),
        });
        Transport::Http
    };
    chat.pending = Some(PendingReply {
        content: content.to_string(),
        via,
    });
    append(chat, ChatMessage::new(ChatRole::User, content), cmds);
    cmds.push(Command::Render(Region::Content));
}

/// Append to the open session, persist locally and announce it.
///
/// Until the history has loaded the session only holds what was sent since
/// opening, so storage is left alone and written once the merge is done.
fn append(chat: &mut ChatSession, message: ChatMessage, cmds: &mut Vec<Command>) {
    chat.messages.push(message.clone());
    if chat.history_loaded {
        cmds.push(Command::PersistChatHistory {
            agent_id: chat.agent_id.clone(),
            messages: chat.messages.clone(),
        });
    }
    cmds.push(Command::Publish(AppEvent::ChatMessage {
        agent_id: chat.agent_id.clone(),
        message,
    }));
}
