use std::cell::Cell;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::config::ApiConfig;
use crate::constants::{
    CHAT_HISTORY_REMOTE_LIMIT, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS, SYSTEM_LOGS_LIMIT,
};
use crate::error::{ClientError, Result};
use crate::models::{
    Agent, AgentCreate, AgentUpdate, AuthToken, ChatMessage, ChatRequest, ChatResponse, FileEntry,
    LogEntry, MemoryItem, ModelInfo, ModelStatus, Plugin, SystemMetrics, SystemStatus, User,
    Workflow, WorkflowExecution,
};
use crate::storage::SharedStorage;
use crate::utils::backoff_delay;

/// Path builders for every REST route the dashboard talks to.
pub mod endpoints {
    pub const HEALTH: &str = "/health";

    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const VERIFY: &str = "/auth/verify";

    pub const AGENTS: &str = "/agents";
    pub fn agent(id: &str) -> String {
        format!("/agents/{}", id)
    }
    pub fn agent_activate(id: &str) -> String {
        format!("/agents/{}/activate", id)
    }
    pub fn agent_deactivate(id: &str) -> String {
        format!("/agents/{}/deactivate", id)
    }

    pub fn chat(agent_id: &str) -> String {
        format!("/chat/{}", agent_id)
    }
    pub fn chat_history(agent_id: &str) -> String {
        format!("/chat/{}/history", agent_id)
    }
    pub fn chat_ws(agent_id: &str) -> String {
        format!("/chat/ws/{}", agent_id)
    }

    pub const WORKFLOWS: &str = "/workflows";
    pub fn workflow(id: &str) -> String {
        format!("/workflows/{}", id)
    }
    pub fn workflow_execute(id: &str) -> String {
        format!("/workflows/{}/execute", id)
    }

    pub const MODELS: &str = "/models";
    pub const MODEL_STATUS: &str = "/models/status";
    pub const TEST_CONNECTION: &str = "/models/test-connection";
    pub const SWITCH_MODEL: &str = "/models/switch";

    pub fn memory(agent_id: &str) -> String {
        format!("/memory/{}", agent_id)
    }
    pub fn memory_search(agent_id: &str) -> String {
        format!("/memory/{}/search", agent_id)
    }
    pub fn memory_item(id: &str) -> String {
        format!("/memory/{}", id)
    }

    pub const SYSTEM_STATUS: &str = "/system/status";
    pub const SYSTEM_METRICS: &str = "/system/metrics";
    pub const SYSTEM_LOGS: &str = "/system/logs";

    pub const FILES: &str = "/files";
    pub fn file_download(path: &str) -> String {
        format!("/files/download/{}", path)
    }
    pub fn file_delete(path: &str) -> String {
        format!("/files/{}", path)
    }

    pub const PLUGINS: &str = "/plugins";
    pub fn plugin_action(id: &str, action: &str) -> String {
        format!("/plugins/{}/{}", id, action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// REST client for the AgentK API.
///
/// Attaches the stored bearer token to every request and clears it again on
/// a 401. While `offline` is set, every call except the health check fails
/// immediately with [`ClientError::Offline`].
pub struct ApiClient {
    config: ApiConfig,
    storage: SharedStorage,
    offline: Cell<bool>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, storage: SharedStorage) -> Self {
        Self {
            config,
            storage,
            offline: Cell::new(false),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        self.offline.get()
    }

    pub fn set_offline(&self, offline: bool) {
        if self.offline.replace(offline) != offline {
            log::info!("api client offline mode: {}", offline);
        }
    }

    // ---------------- Transport ----------------

    /// Send a request and return the raw response body.
    pub async fn request(&self, method: Method, path: &str, body: Option<String>) -> Result<String> {
        if self.is_offline() && path != endpoints::HEALTH {
            return Err(ClientError::Offline);
        }
        self.fetch_text(method, &self.config.url(path), body).await
    }

    async fn fetch_text(&self, method: Method, url: &str, body: Option<String>) -> Result<String> {
        use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

        let opts = RequestInit::new();
        opts.set_method(method.as_str());
        opts.set_mode(RequestMode::Cors);

        let headers = Headers::new()?;
        if let Some(token) = self.storage.auth_token() {
            headers.append("Authorization", &format!("Bearer {}", token))?;
        }
        if let Some(data) = &body {
            opts.set_body(&wasm_bindgen::JsValue::from_str(data));
            headers.append("Content-Type", "application/json")?;
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(url, &opts)?;
        let window = web_sys::window().ok_or_else(|| ClientError::Js("no global window".into()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| ClientError::Network(format!("{:?}", e)))?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            let status = resp.status();
            log::warn!("{} {} -> {}", method.as_str(), url, status);
            if status == 401 {
                if let Err(e) = self.storage.remove_auth_token() {
                    log::debug!("could not clear auth token: {}", e);
                }
            }
            return Err(ClientError::from_status(status, resp.status_text()));
        }

        let text = JsFuture::from(resp.text()?).await?;
        Ok(text.as_string().unwrap_or_default())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.request(Method::Get, path, None).await?;
        decode(&text)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let text = self
            .request(Method::Post, path, Some(serde_json::to_string(body)?))
            .await?;
        decode(&text)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let text = self
            .request(Method::Put, path, Some(serde_json::to_string(body)?))
            .await?;
        decode(&text)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::Delete, path, None).await?;
        Ok(())
    }

    // ---------------- Health ----------------

    pub async fn health(&self) -> Result<Value> {
        self.get(endpoints::HEALTH).await
    }

    /// Health check with backoff. Success clears offline mode, exhaustion
    /// sets it.
    pub async fn check_connection(&self) -> bool {
        let result = retry(
            || self.health(),
            DEFAULT_RETRIES,
            DEFAULT_RETRY_DELAY_MS,
        )
        .await;
        let healthy = matches!(
            &result,
            Ok(body) if body.get("status").and_then(Value::as_str).map_or(true, |s| s == "healthy" || s == "ok")
        );
        if let Err(e) = &result {
            log::warn!("backend connection failed: {}", e);
        }
        self.set_offline(!healthy);
        healthy
    }

    // ---------------- Agents ----------------

    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.get(endpoints::AGENTS).await
    }

    pub async fn get_agent(&self, id: &str) -> Result<Agent> {
        self.get(&endpoints::agent(id)).await
    }

    pub async fn create_agent(&self, payload: &AgentCreate) -> Result<Agent> {
        self.post(endpoints::AGENTS, payload).await
    }

    pub async fn update_agent(&self, id: &str, patch: &AgentUpdate) -> Result<Agent> {
        self.put(&endpoints::agent(id), patch).await
    }

    pub async fn delete_agent(&self, id: &str) -> Result<()> {
        self.delete(&endpoints::agent(id)).await
    }

    pub async fn activate_agent(&self, id: &str) -> Result<Value> {
        self.post(&endpoints::agent_activate(id), &Value::Null).await
    }

    pub async fn deactivate_agent(&self, id: &str) -> Result<Value> {
        self.post(&endpoints::agent_deactivate(id), &Value::Null).await
    }

    // ---------------- Chat ----------------

    pub async fn send_chat(&self, agent_id: &str, message: &str) -> Result<ChatResponse> {
        let body = ChatRequest {
            message: message.to_string(),
            context: None,
        };
        self.post(&endpoints::chat(agent_id), &body).await
    }

    pub async fn chat_history(&self, agent_id: &str) -> Result<Vec<ChatMessage>> {
        let path = with_query(
            &endpoints::chat_history(agent_id),
            &[("limit", &CHAT_HISTORY_REMOTE_LIMIT.to_string())],
        );
        self.get(&path).await
    }

    pub fn chat_ws_url(&self, agent_id: &str) -> String {
        self.config.ws_url(&endpoints::chat_ws(agent_id))
    }

    // ---------------- Workflows ----------------

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.get(endpoints::WORKFLOWS).await
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Workflow> {
        self.get(&endpoints::workflow(id)).await
    }

    pub async fn create_workflow(&self, workflow: &Workflow) -> Result<Workflow> {
        self.post(endpoints::WORKFLOWS, workflow).await
    }

    pub async fn update_workflow(&self, id: &str, workflow: &Workflow) -> Result<Workflow> {
        self.put(&endpoints::workflow(id), workflow).await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<()> {
        self.delete(&endpoints::workflow(id)).await
    }

    pub async fn execute_workflow(&self, id: &str, inputs: &Value) -> Result<WorkflowExecution> {
        self.post(&endpoints::workflow_execute(id), inputs).await
    }

    // ---------------- Models ----------------

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.get(endpoints::MODELS).await
    }

    pub async fn model_status(&self) -> Result<ModelStatus> {
        self.get(endpoints::MODEL_STATUS).await
    }

    pub async fn test_connection(&self, provider: &str, config: &Value) -> Result<Value> {
        let path = with_query(endpoints::TEST_CONNECTION, &[("model_type", provider)]);
        self.post(&path, config).await
    }

    pub async fn switch_model(&self, provider: &str, model_name: &str) -> Result<Value> {
        let path = with_query(
            endpoints::SWITCH_MODEL,
            &[("model_type", provider), ("model_name", model_name)],
        );
        self.post(&path, &Value::Null).await
    }

    // ---------------- Memory ----------------

    pub async fn list_memory(&self, agent_id: &str) -> Result<Vec<MemoryItem>> {
        self.get(&endpoints::memory(agent_id)).await
    }

    pub async fn add_memory(&self, agent_id: &str, data: &Value) -> Result<Value> {
        self.post(&endpoints::memory(agent_id), data).await
    }

    pub async fn delete_memory(&self, memory_id: &str) -> Result<()> {
        self.delete(&endpoints::memory_item(memory_id)).await
    }

    pub async fn search_memory(&self, agent_id: &str, query: &str) -> Result<Vec<MemoryItem>> {
        let path = with_query(&endpoints::memory_search(agent_id), &[("query", query)]);
        self.post(&path, &Value::Null).await
    }

    // ---------------- System ----------------

    pub async fn system_status(&self) -> Result<SystemStatus> {
        self.get(endpoints::SYSTEM_STATUS).await
    }

    pub async fn system_metrics(&self) -> Result<SystemMetrics> {
        self.get(endpoints::SYSTEM_METRICS).await
    }

    pub async fn system_logs(&self) -> Result<Vec<LogEntry>> {
        let path = with_query(endpoints::SYSTEM_LOGS, &[("limit", &SYSTEM_LOGS_LIMIT.to_string())]);
        let body: Value = self.get(&path).await?;
        listing(body, "logs")
    }

    // ---------------- Files ----------------

    pub async fn list_files(&self) -> Result<Vec<FileEntry>> {
        let body: Value = self.get(endpoints::FILES).await?;
        listing(body, "files")
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.delete(&endpoints::file_delete(path)).await
    }

    pub fn file_download_url(&self, path: &str) -> String {
        self.config.url(&endpoints::file_download(path))
    }

    // ---------------- Plugins ----------------

    pub async fn list_plugins(&self) -> Result<Vec<Plugin>> {
        let body: Value = self.get(endpoints::PLUGINS).await?;
        listing(body, "plugins")
    }

    pub async fn uninstall_plugin(&self, id: &str) -> Result<Value> {
        self.post(&endpoints::plugin_action(id, "uninstall"), &Value::Null).await
    }

    pub async fn activate_plugin(&self, id: &str) -> Result<Value> {
        self.post(&endpoints::plugin_action(id, "activate"), &Value::Null).await
    }

    pub async fn deactivate_plugin(&self, id: &str) -> Result<Value> {
        self.post(&endpoints::plugin_action(id, "deactivate"), &Value::Null).await
    }

    // ---------------- Auth ----------------

    /// Exchange credentials for a token and persist it. Returns the user
    /// record when the server sends one along.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>> {
        let body = serde_json::json!({ "username": username, "password": password });
        let token: AuthToken = self.post(endpoints::LOGIN, &body).await?;
        if token.access_token.is_empty() {
            return Err(ClientError::Validation("No token received".into()));
        }
        self.storage.set_auth_token(&token.access_token)?;
        if let Some(user) = &token.user {
            self.storage.set_user_data(&serde_json::to_value(user)?)?;
        }
        Ok(token.user)
    }

    pub async fn logout(&self) -> Result<()> {
        let result: Result<Value> = self.post(endpoints::LOGOUT, &Value::Null).await;
        // The local session ends even if the server call fails.
        self.storage.remove_auth_token()?;
        self.storage.remove_user_data()?;
        result.map(|_| ())
    }

    /// Check the stored token; the returned user record is cached locally.
    pub async fn verify(&self) -> Result<User> {
        let user: User = self.get(endpoints::VERIFY).await?;
        self.storage.set_user_data(&serde_json::to_value(&user)?)?;
        Ok(user)
    }

    /// The user record cached by the last successful login or verify.
    pub fn cached_user(&self) -> Option<User> {
        self.storage
            .user_data()
            .and_then(|data| serde_json::from_value(data).ok())
    }
}

/// Decode a JSON body; an empty body decodes as `null`.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    Ok(serde_json::from_str(text)?)
}

/// List endpoints answer either a bare array or `{ "<key>": [...] }`.
fn listing<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>> {
    let items = match body {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    };
    if items.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(items)?)
}

fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                k,
                String::from(js_sys::encode_uri_component(v))
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

/// Run `op` until it succeeds, at most `retries` extra times, waiting
/// `delay_ms`, then twice that, and so on, between attempts.
pub async fn retry<T, F, Fut>(op: F, retries: u32, delay_ms: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_sleep(op, retries, delay_ms, |ms| {
        gloo_timers::future::TimeoutFuture::new(ms)
    })
    .await
}

/// [`retry`] with an injectable sleep.
pub async fn retry_with_sleep<T, F, Fut, S, SFut>(
    mut op: F,
    retries: u32,
    delay_ms: u32,
    mut sleep: S,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: FnMut(u32) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= retries => return Err(e),
            Err(e) => {
                let wait = backoff_delay(delay_ms, attempt);
                log::debug!("attempt {} failed ({}), retrying in {}ms", attempt + 1, e, wait);
                sleep(wait).await;
                attempt += 1;
            }
        }
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn retry_backs_off_then_succeeds() {
        let calls = Rc::new(Cell::new(0u32));
        let waits = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        let w = waits.clone();
        let result = retry_with_sleep(
            move || {
                let c = c.clone();
                async move {
                    c.set(c.get() + 1);
                    if c.get() < 3 {
                        Err(ClientError::Network("down".into()))
                    } else {
                        Ok(c.get())
                    }
                }
            },
            3,
            1000,
            move |ms| {
                w.borrow_mut().push(ms);
                async {}
            },
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(*waits.borrow(), vec![1000, 2000]);
    }

    #[wasm_bindgen_test]
    async fn retry_gives_up_after_limit() {
        let calls = Rc::new(Cell::new(0u32));
        let c = calls.clone();
        let result: Result<()> = retry_with_sleep(
            move || {
                let c = c.clone();
                async move {
                    c.set(c.get() + 1);
                    Err(ClientError::Network("down".into()))
                }
            },
            3,
            1,
            |_| async {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 4);
    }
}
