//! Typed in-process event bus.
//!
//! Managers announce domain changes (agent created, chat opened, settings
//! changed, ...) as [`AppEvent`]s; interested services subscribe by
//! [`EventKind`]. Handlers are kept as `Rc<RefCell<dyn FnMut>>` and cloned
//! out of the registry before they run, so a handler may subscribe,
//! unsubscribe or publish while it is being invoked.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::models::{Agent, AgentStatus, ChatMessage, Workflow};
use crate::notifications::Severity;
use crate::settings::{AppSettings, Theme};
use crate::state::View;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    AgentsLoaded { count: usize },
    AgentCreated(Agent),
    AgentUpdated(Agent),
    AgentDeleted { agent_id: String },
    AgentStatusChanged { agent_id: String, status: AgentStatus },
    ChatOpened { agent_id: String },
    ChatClosed { agent_id: String },
    ChatMessage { agent_id: String, message: ChatMessage },
    WorkflowSaved(Workflow),
    WorkflowExecuted { workflow_id: String },
    SettingsChanged(AppSettings),
    ThemeChanged(Theme),
    Navigated(View),
    SearchChanged { query: String },
    Notification { message: String, severity: Severity },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AgentsLoaded,
    AgentCreated,
    AgentUpdated,
    AgentDeleted,
    AgentStatusChanged,
    ChatOpened,
    ChatClosed,
    ChatMessage,
    WorkflowSaved,
    WorkflowExecuted,
    SettingsChanged,
    ThemeChanged,
    Navigated,
    SearchChanged,
    Notification,
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::AgentsLoaded { .. } => EventKind::AgentsLoaded,
            AppEvent::AgentCreated(_) => EventKind::AgentCreated,
            AppEvent::AgentUpdated(_) => EventKind::AgentUpdated,
            AppEvent::AgentDeleted { .. } => EventKind::AgentDeleted,
            AppEvent::AgentStatusChanged { .. } => EventKind::AgentStatusChanged,
            AppEvent::ChatOpened { .. } => EventKind::ChatOpened,
            AppEvent::ChatClosed { .. } => EventKind::ChatClosed,
            AppEvent::ChatMessage { .. } => EventKind::ChatMessage,
            AppEvent::WorkflowSaved(_) => EventKind::WorkflowSaved,
            AppEvent::WorkflowExecuted { .. } => EventKind::WorkflowExecuted,
            AppEvent::SettingsChanged(_) => EventKind::SettingsChanged,
            AppEvent::ThemeChanged(_) => EventKind::ThemeChanged,
            AppEvent::Navigated(_) => EventKind::Navigated,
            AppEvent::SearchChanged { .. } => EventKind::SearchChanged,
            AppEvent::Notification { .. } => EventKind::Notification,
        }
    }
}

pub type EventHandler = Rc<RefCell<dyn FnMut(&AppEvent)>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<EventKind, Vec<(SubscriptionId, EventHandler)>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, handler: impl FnMut(&AppEvent) + 'static) -> SubscriptionId {
        let handler: EventHandler = Rc::new(RefCell::new(handler));
        self.subscribe_handler(kind, handler)
    }

    pub fn subscribe_handler(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, handler));
        log::trace!("subscribed {:?} to {:?}", id, kind);
        id
    }

    /// Returns `false` when the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let mut removed = false;
        handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(sub, _)| *sub != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    pub fn publish(&self, event: &AppEvent) {
        let targets: Vec<EventHandler> = match self.handlers.borrow().get(&event.kind()) {
            Some(list) => list.iter().map(|(_, h)| h.clone()).collect(),
            None => return,
        };
        for handler in targets {
            match handler.try_borrow_mut() {
                Ok(mut f) => f(event),
                // Only happens if a handler publishes its own event kind.
                Err(_) => log::warn!("skipping re-entrant handler for {:?}", event.kind()),
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.borrow().get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_only_matching_kind() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bus.subscribe(EventKind::ChatOpened, move |_| h.set(h.get() + 1));

        bus.publish(&AppEvent::ChatOpened { agent_id: "a".into() });
        bus.publish(&AppEvent::ChatClosed { agent_id: "a".into() });
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribe_removes_single_handler() {
        let bus = EventBus::new();
        let first = bus.subscribe(EventKind::SearchChanged, |_| {});
        bus.subscribe(EventKind::SearchChanged, |_| {});
        assert_eq!(bus.subscriber_count(EventKind::SearchChanged), 2);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.subscriber_count(EventKind::SearchChanged), 1);
    }

    #[test]
    fn handler_may_subscribe_while_running() {
        let bus = Rc::new(EventBus::new());
        let inner_bus = bus.clone();
        bus.subscribe(EventKind::AgentsLoaded, move |_| {
            inner_bus.subscribe(EventKind::AgentsLoaded, |_| {});
        });
        bus.publish(&AppEvent::AgentsLoaded { count: 0 });
        assert_eq!(bus.subscriber_count(EventKind::AgentsLoaded), 2);
    }

    #[test]
    fn handler_receives_payload() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(EventKind::AgentDeleted, move |event| {
            if let AppEvent::AgentDeleted { agent_id } = event {
                sink.borrow_mut().push(agent_id.clone());
            }
        });
        bus.publish(&AppEvent::AgentDeleted { agent_id: "x1".into() });
        assert_eq!(*seen.borrow(), vec!["x1".to_string()]);
    }
}
