// src/state.rs
//
// Application state. Owned by `app::App` behind a RefCell and only ever
// mutated by the reducers; views read it to render.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::canvas::graph::WorkflowGraph;
use crate::constants::DEFAULT_WORKFLOW_NAME;
use crate::constants::MONITOR_LOG_ROWS;
use crate::models::{
    Agent, AgentStats, AgentStatus, Capability, ChatMessage, FileEntry, LogEntry, LogLevel,
    MemoryItem, ModelInfo, ModelStatus, Plugin, Provider, SystemMetrics, SystemStatus, User,
    Workflow,
};
use crate::network::ConnectionState;
use crate::notifications::{Clock, NotificationId, NotificationService, SystemClock};
use crate::settings::AppSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    Agents,
    Chat,
    Workflows,
    Models,
    Settings,
}

impl View {
    /// Navigation order; also the order of the 1-6 keyboard shortcuts.
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Agents,
        View::Chat,
        View::Workflows,
        View::Models,
        View::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Agents => "agents",
            View::Chat => "chat",
            View::Workflows => "workflows",
            View::Models => "models",
            View::Settings => "settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Agents => "Agents",
            View::Chat => "Chat",
            View::Workflows => "Workflows",
            View::Models => "Models",
            View::Settings => "Settings",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        View::ALL.into_iter().find(|v| v.as_str() == value)
    }

    /// `1` -> Dashboard ... `6` -> Settings.
    pub fn from_shortcut(digit: char) -> Option<Self> {
        let index = digit.to_digit(10)? as usize;
        index.checked_sub(1).and_then(|i| View::ALL.get(i).copied())
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AgentCache {
    by_id: BTreeMap<String, Agent>,
    pub loading: bool,
    /// Incremented on every load; responses carrying an older value are
    /// stale and dropped.
    pub load_seq: u64,
    pub loaded: bool,
    pub status_filter: Option<AgentStatus>,
    pub capability_filter: Option<Capability>,
}

impl AgentCache {
    pub fn replace_all(&mut self, agents: Vec<Agent>) {
        self.by_id = agents.into_iter().map(|a| (a.id.clone(), a)).collect();
    }

    pub fn upsert(&mut self, agent: Agent) {
        self.by_id.insert(agent.id.clone(), agent);
    }

    pub fn remove(&mut self, id: &str) -> Option<Agent> {
        self.by_id.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.by_id.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All agents, sorted by name.
    pub fn all(&self) -> Vec<&Agent> {
        let mut agents: Vec<&Agent> = self.by_id.values().collect();
        agents.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        agents
    }

    /// Case-insensitive match on name, description, model or capability.
    pub fn search(&self, query: &str) -> Vec<&Agent> {
        let needle = query.trim().to_lowercase();
        self.all()
            .into_iter()
            .filter(|a| needle.is_empty() || agent_matches(a, &needle))
            .collect()
    }

    /// Search combined with the active status / capability filters.
    pub fn visible(&self, query: &str) -> Vec<&Agent> {
        self.search(query)
            .into_iter()
            .filter(|a| self.status_filter.map_or(true, |s| a.status == s))
            .filter(|a| {
                self.capability_filter
                    .map_or(true, |c| a.capabilities.contains(&c))
            })
            .collect()
    }

    pub fn stats(&self) -> AgentStats {
        let mut stats = AgentStats {
            total: self.by_id.len(),
            ..Default::default()
        };
        for agent in self.by_id.values() {
            match agent.status {
                AgentStatus::Active => stats.active += 1,
                AgentStatus::Inactive => stats.inactive += 1,
                AgentStatus::Busy => stats.busy += 1,
                AgentStatus::Error => stats.error += 1,
            }
        }
        stats
    }
}

fn agent_matches(agent: &Agent, needle: &str) -> bool {
    agent.name.to_lowercase().contains(needle)
        || agent.description.to_lowercase().contains(needle)
        || agent.model.to_lowercase().contains(needle)
        || agent
            .capabilities
            .iter()
            .any(|c| c.as_str().contains(needle) || c.label().to_lowercase().contains(needle))
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Socket,
    Http,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub content: String,
    pub via: Transport,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub agent_id: String,
    /// `None` until the agent has been resolved.
    pub agent: Option<Agent>,
    pub messages: Vec<ChatMessage>,
    pub history_loaded: bool,
    pub socket: ConnectionState,
    pub pending: Option<PendingReply>,
}

impl ChatSession {
    pub fn new(agent_id: &str, agent: Option<Agent>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent,
            messages: Vec::new(),
            history_loaded: false,
            socket: ConnectionState::Connecting,
            pending: None,
        }
    }

    pub fn agent_name(&self) -> &str {
        self.agent.as_ref().map_or("", |a| a.name.as_str())
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }
}

/// Pick the history to show: whichever of remote and local is longer, with
/// remote winning ties. A failed remote fetch (`None`) yields local.
pub fn merge_history(remote: Option<Vec<ChatMessage>>, local: Vec<ChatMessage>) -> Vec<ChatMessage> {
    match remote {
        Some(remote) if remote.len() >= local.len() => remote,
        _ => local,
    }
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct WorkflowBuilder {
    /// Metadata (id, name, description, config); nodes and connections live
    /// in `graph` until saved.
    pub workflow: Workflow,
    pub graph: WorkflowGraph,
    pub saving: bool,
    pub dirty: bool,
    pub loading: bool,
}

impl WorkflowBuilder {
    pub fn empty() -> Self {
        Self {
            workflow: Workflow {
                name: DEFAULT_WORKFLOW_NAME.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn from_workflow(workflow: Workflow) -> Self {
        Self {
            graph: WorkflowGraph::from_workflow(&workflow),
            workflow,
            ..Default::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.workflow.id.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub list: Vec<Workflow>,
    pub loading: bool,
    pub builder: Option<WorkflowBuilder>,
    /// Workflow being executed and its progress notification, if one is shown.
    pub executing: Option<(String, Option<NotificationId>)>,
}

impl WorkflowState {
    pub fn upsert(&mut self, workflow: Workflow) {
        match self
            .list
            .iter_mut()
            .find(|w| w.id.is_some() && w.id == workflow.id)
        {
            Some(existing) => *existing = workflow,
            None => self.list.push(workflow),
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.list.retain(|w| w.id.as_deref() != Some(id));
    }
}

// ---------------------------------------------------------------------------
// Models / memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ModelState {
    pub list: Vec<ModelInfo>,
    pub status: ModelStatus,
    pub loading: bool,
    pub testing: Option<Provider>,
    pub active_model: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub agent_id: Option<String>,
    pub items: Vec<MemoryItem>,
    pub search_results: Option<Vec<MemoryItem>>,
    pub loading: bool,
}

// ---------------------------------------------------------------------------
// System monitor, files, plugins, account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorTab {
    #[default]
    Resources,
    Logs,
}

impl MonitorTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorTab::Resources => "resources",
            MonitorTab::Logs => "logs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [MonitorTab::Resources, MonitorTab::Logs]
            .into_iter()
            .find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    pub tab: MonitorTab,
    pub metrics: Option<SystemMetrics>,
    pub logs: Vec<LogEntry>,
    /// Only show entries at this level when set.
    pub level_filter: Option<LogLevel>,
    pub loading: bool,
}

impl MonitorState {
    /// Newest entries matching the level filter, at most one screenful.
    pub fn visible_logs(&self) -> Vec<&LogEntry> {
        let matching: Vec<&LogEntry> = self
            .logs
            .iter()
            .filter(|entry| self.level_filter.map_or(true, |level| entry.level == level))
            .collect();
        let skip = matching.len().saturating_sub(MONITOR_LOG_ROWS);
        matching.into_iter().skip(skip).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileState {
    pub list: Vec<FileEntry>,
    pub loading: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PluginState {
    pub list: Vec<Plugin>,
    pub loading: bool,
    /// Plugin with an activate / deactivate / uninstall call in flight.
    pub busy: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<User>,
    /// A stored token is being checked against `/auth/verify`.
    pub verifying: bool,
    pub signing_in: bool,
}

impl AuthState {
    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub clock: Rc<dyn Clock>,

    // Shell
    pub current_view: View,
    pub sidebar_open: bool,
    pub search_query: String,
    pub window_focused: bool,
    pub offline: bool,

    pub notifications: NotificationService,
    pub settings: AppSettings,

    pub agents: AgentCache,
    pub recent_agents: Vec<String>,
    pub chat: Option<ChatSession>,
    pub workflows: WorkflowState,
    pub models: ModelState,
    pub memory: MemoryState,
    pub system_status: Option<SystemStatus>,
    pub monitor: MonitorState,
    pub files: FileState,
    pub plugins: PluginState,
    pub auth: AuthState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            notifications: NotificationService::new(clock.clone()),
            clock,
            current_view: View::default(),
            sidebar_open: true,
            search_query: String::new(),
            window_focused: true,
            offline: false,
            settings: AppSettings::default(),
            agents: AgentCache::default(),
            recent_agents: Vec::new(),
            chat: None,
            workflows: WorkflowState::default(),
            models: ModelState::default(),
            memory: MemoryState::default(),
            system_status: None,
            monitor: MonitorState::default(),
            files: FileState::default(),
            plugins: PluginState::default(),
            auth: AuthState::default(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn builder_mut(&mut self) -> Option<&mut WorkflowBuilder> {
        self.workflows.builder.as_mut()
    }

    /// The open chat session, only if it belongs to `agent_id`.
    pub fn chat_for(&mut self, agent_id: &str) -> Option<&mut ChatSession> {
        self.chat.as_mut().filter(|c| c.agent_id == agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    fn agent(id: &str, name: &str, status: AgentStatus, caps: &[Capability]) -> Agent {
        Agent {
            status,
            capabilities: caps.to_vec(),
            model: "llama2".into(),
            ..Agent::unknown(id)
        }
        .renamed(name)
    }

    impl Agent {
        fn renamed(mut self, name: &str) -> Self {
            self.name = name.to_string();
            self.description = format!("{} description", name);
            self
        }
    }

    fn cache() -> AgentCache {
        let mut cache = AgentCache::default();
        cache.replace_all(vec![
            agent("1", "Researcher", AgentStatus::Active, &[Capability::WebResearch]),
            agent("2", "coder", AgentStatus::Inactive, &[Capability::CodeGeneration]),
            agent("3", "Writer", AgentStatus::Busy, &[Capability::ContentWriting]),
        ]);
        cache
    }

    #[test]
    fn view_shortcuts() {
        assert_eq!(View::from_shortcut('1'), Some(View::Dashboard));
        assert_eq!(View::from_shortcut('6'), Some(View::Settings));
        assert_eq!(View::from_shortcut('0'), None);
        assert_eq!(View::from_shortcut('7'), None);
        assert_eq!(View::from_shortcut('x'), None);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let cache = cache();
        let names = |q: &str| -> Vec<String> {
            cache.search(q).iter().map(|a| a.name.clone()).collect()
        };
        assert_eq!(names("RESEARCH"), vec!["Researcher"]);
        assert_eq!(names("code generation"), vec!["coder"]);
        assert_eq!(names("llama"), vec!["coder", "Researcher", "Writer"]);
        assert_eq!(names(""), vec!["coder", "Researcher", "Writer"]);
    }

    #[test]
    fn filters_combine_with_search() {
        let mut cache = cache();
        cache.status_filter = Some(AgentStatus::Active);
        assert_eq!(cache.visible("").len(), 1);
        cache.status_filter = None;
        cache.capability_filter = Some(Capability::ContentWriting);
        assert_eq!(cache.visible("").len(), 1);
        assert!(cache.visible("coder").is_empty());
    }

    #[test]
    fn stats_count_by_status() {
        let stats = cache().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.busy, 1);
        assert_eq!(stats.error, 0);
    }

    #[test]
    fn merge_prefers_larger_history() {
        let one = vec![ChatMessage::new(ChatRole::User, "a")];
        let two = vec![
            ChatMessage::new(ChatRole::User, "a"),
            ChatMessage::new(ChatRole::Agent, "b"),
        ];
        assert_eq!(merge_history(Some(two.clone()), one.clone()), two);
        assert_eq!(merge_history(Some(one.clone()), two.clone()), two);
        assert_eq!(merge_history(None, one.clone()), one);
        assert!(merge_history(None, Vec::new()).is_empty());
    }

    #[test]
    fn workflow_upsert_matches_on_id() {
        let mut state = WorkflowState::default();
        state.upsert(Workflow {
            id: Some("w1".into()),
            name: "One".into(),
            ..Default::default()
        });
        state.upsert(Workflow {
            id: Some("w1".into()),
            name: "Renamed".into(),
            ..Default::default()
        });
        assert_eq!(state.list.len(), 1);
        assert_eq!(state.list[0].name, "Renamed");
        state.remove("w1");
        assert!(state.list.is_empty());
    }

    #[test]
    fn monitor_shows_newest_matching_logs() {
        let entry = |level: LogLevel, n: usize| LogEntry {
            timestamp: String::new(),
            level,
            message: format!("m{}", n),
        };
        let mut monitor = MonitorState::default();
        monitor.logs = (0..MONITOR_LOG_ROWS + 5).map(|n| entry(LogLevel::Info, n)).collect();
        monitor.logs.push(entry(LogLevel::Error, 999));

        let visible = monitor.visible_logs();
        assert_eq!(visible.len(), MONITOR_LOG_ROWS);
        assert_eq!(visible.last().map(|e| e.message.as_str()), Some("m999"));

        monitor.level_filter = Some(LogLevel::Error);
        let visible = monitor.visible_logs();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "m999");
    }
}
