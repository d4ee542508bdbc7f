//! Chat window for the open agent.

use crate::dom_utils;
use crate::models::{ChatMessage, ChatRole};
use crate::network::ConnectionState;
use crate::state::{AppState, ChatSession, Transport};
use crate::utils::{escape_html, relative_time_rfc3339};

pub const MESSAGES_ID: &str = "chat-messages";

fn role_class(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Agent => "agent",
        ChatRole::System => "system",
    }
}

fn message_html(message: &ChatMessage, now_ms: u64) -> String {
    // Line breaks are kept; everything else is plain text.
    let body = escape_html(&message.content).replace('\n', "<br>");
    format!(
        r#"<div class="chat-message message-{role}"><div class="message-content">{body}</div><time class="message-time">{time}</time></div>"#,
        role = role_class(message.role),
        body = body,
        time = escape_html(&relative_time_rfc3339(&message.timestamp, now_ms)),
    )
}

fn transport_label(chat: &ChatSession) -> &'static str {
    match chat.socket {
        ConnectionState::Open => "Live",
        ConnectionState::Connecting => "Connecting...",
        ConnectionState::Closed | ConnectionState::Failed => "HTTP",
    }
}

fn no_chat_html(state: &AppState) -> String {
    let agents: String = state
        .agents
        .all()
        .iter()
        .map(|a| {
            format!(
                r#"<li><button type="button" class="btn" data-action="open-chat" data-id="{}">{} {}</button></li>"#,
                escape_html(&a.id),
                escape_html(&a.avatar),
                escape_html(&a.name)
            )
        })
        .collect();
    format!(
        r#"<section class="chat-empty"><h2>Start a conversation</h2><p class="muted">Pick an agent to chat with.</p><ul class="agent-picker">{}</ul></section>"#,
        agents
    )
}

pub fn html(state: &AppState) -> String {
    let Some(chat) = state.chat.as_ref() else {
        return no_chat_html(state);
    };
    let now = state.now_ms();
    let (name, avatar, description) = match &chat.agent {
        Some(agent) => (agent.name.as_str(), agent.avatar.as_str(), agent.description.as_str()),
        None => ("Loading...", "", ""),
    };
    let messages: String = if !chat.history_loaded && chat.messages.is_empty() {
        r#"<p class="loading">Loading history...</p>"#.to_string()
    } else if chat.messages.is_empty() {
        format!(
            r#"<p class="muted chat-welcome">Say hello to {}.</p>"#,
            escape_html(name)
        )
    } else {
        chat.messages.iter().map(|m| message_html(m, now)).collect()
    };
    let typing = match &chat.pending {
        Some(pending) => format!(
            r#"<div class="typing-indicator" data-transport="{}"><span></span><span></span><span></span></div>"#,
            if pending.via == Transport::Socket { "socket" } else { "http" }
        ),
        None => String::new(),
    };
    let disabled = if chat.is_waiting() { " disabled" } else { "" };

    format!(
        r#"<section class="chat-view">
<header class="chat-header">
<span class="agent-avatar">{avatar}</span>
<div><h2>{name}</h2><p class="muted">{description}</p></div>
<span class="chat-transport transport-{socket}">{transport}</span>
<button type="button" class="btn btn-small" data-action="clear-chat">Clear</button>
<button type="button" class="btn btn-small" data-action="close-chat">Close</button>
</header>
<div class="chat-messages" id="{messages_id}">{messages}{typing}</div>
<form class="chat-input" data-form="chat">
<textarea name="message" rows="2" placeholder="Type a message... (Enter to send, Shift+Enter for a new line)" data-submit-on-enter{disabled}></textarea>
<button type="submit" class="btn btn-primary"{disabled}>Send</button>
</form>
</section>"#,
        avatar = escape_html(avatar),
        name = escape_html(name),
        description = escape_html(description),
        socket = chat.socket.to_string().to_lowercase(),
        transport = transport_label(chat),
        messages_id = MESSAGES_ID,
        messages = messages,
        typing = typing,
        disabled = disabled,
    )
}

/// Keep the newest message in view.
pub fn scroll_to_bottom() {
    if let Some(list) = dom_utils::by_id(MESSAGES_ID) {
        list.set_scroll_top(list.scroll_height());
    }
}
