// Application identity
pub const APP_NAME: &str = "AgentK";
pub const APP_VERSION: &str = "1.0.0";

// Fallback used when neither the build-time API_BASE_URL nor the page origin
// is available (native unit tests, very early start-up).
pub const FALLBACK_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_MODEL: &str = "llama2";

/// Every key written by the storage layer is prefixed with this namespace.
pub const STORAGE_NAMESPACE: &str = "agentk.";

pub mod storage_keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const USER_DATA: &str = "user_data";
    pub const APP_SETTINGS: &str = "app_settings";
    pub const THEME: &str = "theme";
    pub const LANGUAGE: &str = "language";
    pub const RECENT_AGENTS: &str = "recent_agents";
    pub const CHAT_HISTORY: &str = "chat_history";
    pub const WORKFLOW_DRAFT: &str = "workflow_draft";

    /// Keys that builds before namespacing wrote without the prefix.
    pub const LEGACY: [&str; 7] = [
        AUTH_TOKEN,
        USER_DATA,
        APP_SETTINGS,
        THEME,
        LANGUAGE,
        RECENT_AGENTS,
        CHAT_HISTORY,
    ];
}

pub const RECENT_AGENTS_LIMIT: usize = 10;

/// Values of `AppSettings::default()`.
pub mod settings_defaults {
    pub const LANGUAGE: &str = "en";
    pub const AUTO_SAVE: bool = true;
    pub const AUTO_SAVE_INTERVAL_MS: u32 = 30_000;
    pub const NOTIFICATIONS: bool = true;
    pub const SOUND_EFFECTS: bool = true;
    pub const REDUCE_MOTION: bool = false;
}

// Notification timings (milliseconds)
pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 5000;
pub const PROGRESS_COMPLETE_LINGER_MS: u64 = 1000;
pub const NOTIFICATION_EXIT_ANIMATION_MS: u32 = 300;
pub const NOTIFICATION_TICK_MS: u32 = 250;

// Retry helper defaults
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u32 = 1000;

// Chat
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";
pub const UNKNOWN_AGENT_NAME: &str = "Unknown Agent";
pub const UNKNOWN_AGENT_DESCRIPTION: &str = "Agent not found";
pub const CHAT_HISTORY_REMOTE_LIMIT: u32 = 50;
pub const SESSION_PREVIEW_CHARS: usize = 50;
pub const DEFAULT_AVATAR: &str = "🤖";

// System monitor
pub const SYSTEM_LOGS_LIMIT: u32 = 100;
pub const MONITOR_LOG_ROWS: usize = 50;

// Data export
pub const EXPORT_FILENAME: &str = "agentk-data.json";

// Workflow canvas defaults
pub const DEFAULT_WORKFLOW_NAME: &str = "New Workflow";
pub const DEFAULT_NODE_X: f64 = 100.0;
pub const DEFAULT_NODE_Y: f64 = 100.0;
pub const DEFAULT_NODE_WIDTH: f64 = 180.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 72.0;

// Avatar palette, indexed by the first byte of the agent id.
pub const AVATAR_COLORS: [&str; 5] = ["#4f46e5", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6"];

pub mod error_messages {
    pub const NETWORK_ERROR: &str = "Network error. Please check your connection.";
    pub const SERVER_ERROR: &str = "Server error. Please try again later.";
    pub const UNAUTHORIZED: &str = "Unauthorized. Please log in again.";
    pub const FORBIDDEN: &str = "Access forbidden.";
    pub const NOT_FOUND: &str = "Resource not found.";
    pub const VALIDATION_ERROR: &str = "Validation failed. Please check your input.";
    pub const OFFLINE: &str = "Running in offline mode. Some features may be limited.";
    pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";
    pub const CONNECTION_LOST: &str = "Connection lost. Running in offline mode.";
    pub const INVALID_AGENT_CONFIG: &str = "Invalid agent configuration file.";
    pub const INVALID_DATA_EXPORT: &str = "Invalid data export. Expected a JSON object.";
    pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
}

pub mod success_messages {
    pub const AGENT_CREATED: &str = "Agent created successfully.";
    pub const AGENT_UPDATED: &str = "Agent updated successfully.";
    pub const AGENT_DELETED: &str = "Agent deleted successfully.";
    pub const AGENT_ACTIVATED: &str = "Agent activated successfully.";
    pub const AGENT_DEACTIVATED: &str = "Agent deactivated successfully.";
    pub const WORKFLOW_SAVED: &str = "Workflow saved successfully.";
    pub const WORKFLOW_DELETED: &str = "Workflow deleted successfully.";
    pub const WORKFLOW_EXECUTED: &str = "Workflow execution started.";
    pub const SETTINGS_SAVED: &str = "Settings saved successfully.";
    pub const MEMORY_ADDED: &str = "Memory added.";
    pub const MODEL_SWITCHED: &str = "Model switched.";
    pub const CONNECTION_RESTORED: &str = "Connection restored";
    pub const SETTINGS_RESET: &str = "Settings reset to defaults.";
    pub const CHAT_CLEARED: &str = "Chat history cleared.";
    pub const LOGGED_OUT: &str = "Signed out.";
    pub const FILE_DELETED: &str = "File deleted.";
    pub const PLUGIN_ACTIVATED: &str = "Plugin activated.";
    pub const PLUGIN_DEACTIVATED: &str = "Plugin deactivated.";
    pub const PLUGIN_UNINSTALLED: &str = "Plugin uninstalled.";
    pub const DATA_IMPORTED: &str = "Data imported.";
}
