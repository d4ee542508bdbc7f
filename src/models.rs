// src/models.rs
//
// Wire records exchanged with the AgentK REST API plus the small client-only
// records (chat messages, stats) built on top of them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_AVATAR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    WebResearch,
    CodeGeneration,
    DataAnalysis,
    ContentWriting,
    ImageGeneration,
    FileProcessing,
    Summarization,
    Translation,
    Debugging,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::WebResearch,
        Capability::CodeGeneration,
        Capability::DataAnalysis,
        Capability::ContentWriting,
        Capability::ImageGeneration,
        Capability::FileProcessing,
        Capability::Summarization,
        Capability::Translation,
        Capability::Debugging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::WebResearch => "web_research",
            Capability::CodeGeneration => "code_generation",
            Capability::DataAnalysis => "data_analysis",
            Capability::ContentWriting => "content_writing",
            Capability::ImageGeneration => "image_generation",
            Capability::FileProcessing => "file_processing",
            Capability::Summarization => "summarization",
            Capability::Translation => "translation",
            Capability::Debugging => "debugging",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Capability::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Human label, e.g. `web_research` -> `Web Research`.
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(crate::utils::capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[serde(alias = "online")]
    Active,
    #[default]
    #[serde(alias = "offline")]
    Inactive,
    Busy,
    Error,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Active,
        AgentStatus::Inactive,
        AgentStatus::Busy,
        AgentStatus::Error,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        AgentStatus::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Agent {
    /// Placeholder shown when a chat is opened for an agent the API cannot
    /// return.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: crate::constants::UNKNOWN_AGENT_NAME.to_string(),
            description: crate::constants::UNKNOWN_AGENT_DESCRIPTION.to_string(),
            model: String::new(),
            capabilities: Vec::new(),
            status: AgentStatus::Inactive,
            avatar: default_avatar(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub model: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl AgentUpdate {
    /// Apply the present fields of this patch onto a cached agent.
    pub fn apply_to(&self, agent: &mut Agent) {
        if let Some(name) = &self.name {
            agent.name = name.clone();
        }
        if let Some(description) = &self.description {
            agent.description = description.clone();
        }
        if let Some(model) = &self.model {
            agent.model = model.clone();
        }
        if let Some(capabilities) = &self.capabilities {
            agent.capabilities = capabilities.clone();
        }
        if let Some(status) = self.status {
            agent.status = status;
        }
        if let Some(avatar) = &self.avatar {
            agent.avatar = avatar.clone();
        }
    }
}

/// Exported agent configuration (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigExport {
    pub name: String,
    pub description: String,
    pub model: String,
    pub capabilities: Vec<Capability>,
    pub avatar: String,
    pub exported_at: String,
}

impl AgentConfigExport {
    pub fn into_create(self) -> AgentCreate {
        AgentCreate {
            name: self.name,
            description: self.description,
            model: self.model,
            capabilities: self.capabilities,
            avatar: Some(self.avatar),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub busy: usize,
    pub error: usize,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "assistant")]
    Agent,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub outputs: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Running,
    Completed,
    Failed,
}

/// Serialized canvas node as stored on a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConnectionRecord {
    pub id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub nodes: Vec<WorkflowNodeRecord>,
    #[serde(default)]
    pub connections: Vec<WorkflowConnectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Models / memory / system
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Lmstudio,
    Ollama,
    Openai,
    Custom,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Lmstudio,
        Provider::Ollama,
        Provider::Openai,
        Provider::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Lmstudio => "lmstudio",
            Provider::Ollama => "ollama",
            Provider::Openai => "openai",
            Provider::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Provider::ALL.into_iter().find(|p| p.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::Lmstudio => "LM Studio",
            Provider::Ollama => "Ollama",
            Provider::Openai => "OpenAI",
            Provider::Custom => "Custom",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Provider::Lmstudio => "🤖",
            Provider::Ollama => "🦙",
            Provider::Openai => "🔌",
            Provider::Custom => "⚙️",
        }
    }
}

/// Connection flag per provider as reported by `/models/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub lmstudio: bool,
    #[serde(default)]
    pub ollama: bool,
    #[serde(default)]
    pub openai: bool,
    #[serde(default)]
    pub custom: bool,
}

impl ModelStatus {
    pub fn is_connected(&self, provider: Provider) -> bool {
        match provider {
            Provider::Lmstudio => self.lmstudio,
            Provider::Ollama => self.ollama,
            Provider::Openai => self.openai,
            Provider::Custom => self.custom,
        }
    }

    pub fn set(&mut self, provider: Provider, connected: bool) {
        match provider {
            Provider::Lmstudio => self.lmstudio = connected,
            Provider::Ollama => self.ollama = connected,
            Provider::Openai => self.openai = connected,
            Provider::Custom => self.custom = connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConnectionConfig {
    #[serde(rename = "type")]
    pub provider: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    #[serde(default)]
    pub id: Option<String>,
    pub agent_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub active_agents: Option<u32>,
}

// ---------------- System monitor ----------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuMetrics {
    pub percent: f64,
    pub percent_per_core: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryMetrics {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkMetrics {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// `/system/metrics` snapshot. Sections the backend leaves out read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemMetrics {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub network: NetworkMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Debug, LogLevel::Info, LogLevel::Warning, LogLevel::Error];

    /// Case-insensitive; `warn` and `critical` are folded into their
    /// neighbours.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warning" | "warn" => Some(LogLevel::Warning),
            "error" | "critical" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        LogLevel::parse(&value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
}

// ---------------- Files / plugins ----------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the upload root; what delete and download take.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    /// Seconds since the epoch.
    #[serde(default)]
    pub modified: Option<f64>,
}

impl FileEntry {
    pub fn path(&self) -> &str {
        if self.path.is_empty() {
            &self.name
        } else {
            &self.path
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Installed,
    Activated,
    #[default]
    Deactivated,
    Error,
}

impl PluginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginStatus::Installed => "installed",
            PluginStatus::Activated => "activated",
            PluginStatus::Deactivated => "deactivated",
            PluginStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub status: PluginStatus,
}

impl Plugin {
    pub fn is_active(&self) -> bool {
        self.status == PluginStatus::Activated
    }
}

// ---------------- Auth ----------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Login response. Older servers answer `{token, user}`, newer ones the
/// OAuth-style `{access_token, token_type}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_online_offline_aliases() {
        let s: AgentStatus = serde_json::from_str("\"online\"").unwrap();
        assert_eq!(s, AgentStatus::Active);
        let s: AgentStatus = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(s, AgentStatus::Inactive);
        assert_eq!(serde_json::to_string(&AgentStatus::Busy).unwrap(), "\"busy\"");
    }

    #[test]
    fn agent_defaults_missing_fields() {
        let agent: Agent = serde_json::from_str(r#"{"id":"a1","name":"Scout"}"#).unwrap();
        assert_eq!(agent.avatar, DEFAULT_AVATAR);
        assert_eq!(agent.status, AgentStatus::Inactive);
        assert!(agent.capabilities.is_empty());
    }

    #[test]
    fn capability_label_is_title_cased() {
        assert_eq!(Capability::WebResearch.label(), "Web Research");
        assert_eq!(Capability::Debugging.label(), "Debugging");
    }

    #[test]
    fn update_patch_only_touches_present_fields() {
        let mut agent: Agent =
            serde_json::from_str(r#"{"id":"a1","name":"Scout","model":"llama2"}"#).unwrap();
        let patch = AgentUpdate {
            description: Some("Finds things".into()),
            ..Default::default()
        };
        patch.apply_to(&mut agent);
        assert_eq!(agent.name, "Scout");
        assert_eq!(agent.model, "llama2");
        assert_eq!(agent.description, "Finds things");
    }

    #[test]
    fn workflow_without_id_omits_field() {
        let wf = Workflow {
            name: "Flow".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&wf).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn metrics_tolerate_missing_sections() {
        let metrics: SystemMetrics =
            serde_json::from_str(r#"{"cpu":{"percent":12.5},"memory":{"percent":40,"used":1024}}"#).unwrap();
        assert_eq!(metrics.cpu.percent, 12.5);
        assert_eq!(metrics.memory.used, 1024);
        assert_eq!(metrics.disk, DiskMetrics::default());
    }

    #[test]
    fn log_levels_are_case_insensitive() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"timestamp":"2024-01-01T00:00:00","level":"WARNING","message":"slow"}"#).unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        let entry: LogEntry = serde_json::from_str(r#"{"level":"TRACE","message":"x"}"#).unwrap();
        assert_eq!(entry.level, LogLevel::Info);
    }

    #[test]
    fn login_accepts_both_token_shapes() {
        let legacy: AuthToken =
            serde_json::from_str(r#"{"token":"t1","user":{"username":"ada","full_name":"Ada L"}}"#).unwrap();
        assert_eq!(legacy.access_token, "t1");
        assert_eq!(legacy.user.map(|u| u.display_name().to_string()).as_deref(), Some("Ada L"));
        let oauth: AuthToken = serde_json::from_str(r#"{"access_token":"t2","token_type":"bearer"}"#).unwrap();
        assert_eq!(oauth.access_token, "t2");
        assert!(oauth.user.is_none());
    }

    #[test]
    fn file_path_falls_back_to_name() {
        let file: FileEntry = serde_json::from_str(r#"{"name":"notes.md","size":10}"#).unwrap();
        assert_eq!(file.path(), "notes.md");
    }
}
