// src/messages.rs
//
// Everything that can happen in the UI (`Message`) and every side effect the
// reducers can ask for (`Command`).
//
use serde_json::Value;

use crate::canvas::graph::NodeKind;
use crate::events::AppEvent;
use std::collections::BTreeMap;

use crate::models::{
    Agent, AgentCreate, AgentStatus, AgentUpdate, Capability, ChatMessage, ChatResponse, FileEntry,
    LogEntry, LogLevel, MemoryItem, ModelInfo, ModelStatus, Plugin, PluginStatus, Provider,
    SystemMetrics, SystemStatus, User, Workflow,
};
use crate::network::{ChatFrame, ConnectionState};
use crate::notifications::{NotificationId, Severity};
use crate::state::{MonitorTab, View};
use crate::validation::FormData;

/// Keyboard input as seen by the shell's global listener.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    /// The event target is an input, select or textarea.
    pub in_form_field: bool,
}

impl KeyPress {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            meta: false,
            in_form_field: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    // Shell
    Navigate(View),
    ToggleSidebar,
    OpenSidebar,
    CloseSidebar,
    SetSearchQuery(String),
    WindowFocusChanged(bool),
    ConnectivityChanged { online: bool },
    BackendHealth { healthy: bool },     // Result of the startup health check
    KeyPressed(KeyPress),
    Tick(u64),                           // Notification clock, ms since epoch
    Notify { message: String, severity: Severity },
    DismissNotification(NotificationId),

    // Agents
    LoadAgents,
    AgentsLoaded {
        seq: u64,
        result: Result<Vec<Agent>, String>,
    },
    CreateAgent(AgentCreate),
    AgentCreated(Agent),
    UpdateAgent { id: String, patch: AgentUpdate },
    AgentUpdated(Agent),
    DeleteAgent(String),
    AgentDeleted(String),
    SetAgentActive { id: String, active: bool },
    AgentStatusChanged { id: String, status: AgentStatus },
    SetStatusFilter(Option<AgentStatus>),
    SetCapabilityFilter(Option<Capability>),
    ExportAgentConfig(String),
    ImportAgentConfig(String),           // Raw JSON from a file picker
    AgentRequestFailed(String),

    // Chat
    OpenChat(String),
    ChatAgentLoaded {
        agent_id: String,
        agent: Option<Agent>,
    },
    ChatHistoryLoaded {
        agent_id: String,
        remote: Option<Vec<ChatMessage>>,
        local: Vec<ChatMessage>,
    },
    ChatSocketState {
        agent_id: String,
        state: ConnectionState,
    },
    SendChatMessage(String),
    ChatFrameReceived {
        agent_id: String,
        frame: ChatFrame,
    },
    ChatHttpReply {
        agent_id: String,
        result: Result<ChatResponse, String>,
    },
    ClearChatHistory,
    CloseChat,

    // Workflows
    LoadWorkflows,
    WorkflowsLoaded(Result<Vec<Workflow>, String>),
    OpenWorkflowBuilder(Option<String>), // None opens a blank workflow
    WorkflowLoaded(Result<Workflow, String>),
    WorkflowDraftRestored(Workflow),
    CloseWorkflowBuilder,
    SetWorkflowName(String),
    AddNode(NodeKind),
    SelectNode(String),
    NodePointerDown { node_id: String, x: f64, y: f64 },
    CanvasPointerMove { x: f64, y: f64 },
    CanvasPointerUp,
    CanvasPointerLeave,
    OutputHandleDown(String),
    InputHandleUp(String),
    SubmitNodeProperties { node_id: String, values: FormData },
    RemoveNode(String),
    NodeMeasured { node_id: String, width: f64, height: f64 },
    SaveWorkflow,
    WorkflowSaved(Workflow),
    WorkflowSaveFailed(String),
    DeleteWorkflow(String),
    WorkflowDeleted(String),
    ExecuteWorkflow(String),
    WorkflowExecuted {
        id: String,
        result: Result<Value, String>,
    },

    // Models
    LoadModels,
    ModelsLoaded(Result<Vec<ModelInfo>, String>),
    ModelStatusLoaded(Result<ModelStatus, String>),
    TestConnection { provider: Provider, config: Value },
    ConnectionTested {
        provider: Provider,
        result: Result<bool, String>,
    },
    SwitchModel { provider: Provider, name: String },
    ModelSwitched {
        name: String,
        result: Result<(), String>,
    },

    // Memory
    LoadMemory(String),
    MemoryLoaded {
        agent_id: String,
        result: Result<Vec<MemoryItem>, String>,
    },
    AddMemory { agent_id: String, content: String },
    MemoryAdded(Result<MemoryItem, String>),
    DeleteMemory(String),
    MemoryDeleted(String),
    SearchMemory(String),
    MemorySearchResults(Result<Vec<MemoryItem>, String>),
    ClearMemorySearch,

    // Settings
    SettingsLoaded(crate::settings::AppSettings),
    UpdateSettings(Value),               // Shallow patch, camelCase keys
    ResetSettings,
    AutosaveTick,
    ExportData,
    ImportData(String),                  // Raw JSON pasted into the import form
    DataImported(Result<ImportedData, String>),

    // System
    LoadSystemStatus,
    SystemStatusLoaded(Result<SystemStatus, String>),
    LoadMonitor,
    SystemMetricsLoaded(Result<SystemMetrics, String>),
    SystemLogsLoaded(Result<Vec<LogEntry>, String>),
    SetMonitorTab(MonitorTab),
    SetLogLevelFilter(Option<LogLevel>),
    ClearSystemLogs,

    // Files
    LoadFiles,
    FilesLoaded(Result<Vec<FileEntry>, String>),
    DownloadFile(String),                // Path relative to the upload root
    DeleteFile(String),
    FileDeleted(Result<String, String>),

    // Plugins
    LoadPlugins,
    PluginsLoaded(Result<Vec<Plugin>, String>),
    SetPluginActive { id: String, active: bool },
    UninstallPlugin(String),
    PluginChanged {
        id: String,
        /// New status, `None` once uninstalled.
        result: Result<Option<PluginStatus>, String>,
    },

    // Account
    VerifySession,
    /// `Ok(None)`: the check could not be made and no user is cached.
    /// `Err`: the server rejected the stored token.
    SessionVerified(Result<Option<User>, String>),
    Login { username: String, password: String },
    LoginFinished(Result<User, String>),
    Logout,
    LoggedOut,
}

/// What an import changed that the running app has to pick up again.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedData {
    pub settings: crate::settings::AppSettings,
    pub recent_agents: Vec<String>,
}

/// Which part of the page needs repainting after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Shell,
    Content,
    Notifications,
    /// Move one node and the listed connection lines without rebuilding
    /// the canvas.
    CanvasDrag {
        node_id: String,
        connections: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub enum Command {
    /// Feed another message back through `update`
    SendMessage(Message),

    /// Announce a domain change on the event bus
    Publish(AppEvent),

    /// Repaint part of the page
    Render(Region),

    // Agents
    FetchAgents { seq: u64 },
    CreateAgent(AgentCreate),
    UpdateAgent { id: String, patch: AgentUpdate },
    DeleteAgent(String),
    SetAgentActive { id: String, active: bool },

    // Chat
    FetchChatAgent(String),
    FetchChatHistory(String),
    ConnectChatSocket(String),
    SendChatFrame { agent_id: String, frame: ChatFrame },
    SendChatHttp { agent_id: String, content: String },
    CloseChatSocket,
    PersistChatHistory { agent_id: String, messages: Vec<ChatMessage> },
    ClearStoredChatHistory(String),
    RecordRecentAgent(String),

    // Workflows
    FetchWorkflows,
    FetchWorkflow(String),
    CreateWorkflow(Workflow),
    UpdateWorkflow { id: String, workflow: Workflow },
    DeleteWorkflow(String),
    ExecuteWorkflow { id: String, input: Value },
    PersistWorkflowDraft(Workflow),
    RestoreWorkflowDraft,
    ClearWorkflowDraft,

    // Models
    FetchModels,
    FetchModelStatus,
    TestConnection { provider: Provider, config: Value },
    SwitchModel { provider: Provider, name: String },

    // Memory
    FetchMemory(String),
    AddMemory { agent_id: String, content: String },
    DeleteMemory(String),
    SearchMemory(String),

    // Settings / shell
    PersistSettings(crate::settings::AppSettings),
    ApplyTheme(crate::settings::Theme),
    ScheduleAutosave(Option<u32>),       // None stops the timer
    FocusSearch,
    DownloadJson { filename: String, contents: String },
    CheckBackend,
    SetOfflineMode(bool),
    ExportData,
    ImportData(BTreeMap<String, Value>),

    // System
    FetchSystemStatus,
    FetchSystemMetrics,
    FetchSystemLogs,

    // Files / plugins
    FetchFiles,
    OpenFileDownload(String),
    DeleteFile(String),
    FetchPlugins,
    SetPluginActive { id: String, active: bool },
    UninstallPlugin(String),

    // Account
    VerifySession,
    Login { username: String, password: String },
    Logout,
}
