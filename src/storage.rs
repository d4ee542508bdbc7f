//! Namespaced JSON persistence over `localStorage` / `sessionStorage`.
//!
//! [`StorageManager`] is generic over a [`KeyValueStore`] so that the same
//! code runs against the browser backend in production and against
//! [`MemoryStore`] in native unit tests. Writes are last-write-wins; there is
//! no coordination between tabs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::constants::{storage_keys, RECENT_AGENTS_LIMIT, STORAGE_NAMESPACE};
use crate::error::{ClientError, Result};
use crate::models::ChatMessage;
use crate::settings::{AppSettings, Theme};

/// Raw string key/value backend.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }
    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Local,
    Session,
}

/// `web_sys::Storage` backend.
pub struct BrowserStorage {
    inner: web_sys::Storage,
}

impl BrowserStorage {
    pub fn open(area: StorageArea) -> Result<Self> {
        let window = web_sys::window().ok_or(ClientError::StorageUnavailable)?;
        let storage = match area {
            StorageArea::Local => window.local_storage()?,
            StorageArea::Session => window.session_storage()?,
        };
        storage
            .map(|inner| Self { inner })
            .ok_or(ClientError::StorageUnavailable)
    }

    pub fn local() -> Result<Self> {
        Self::open(StorageArea::Local)
    }

    pub fn session() -> Result<Self> {
        Self::open(StorageArea::Session)
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get_item(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| ClientError::Storage(format!("{:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        Ok(self.inner.remove_item(key)?)
    }

    fn clear(&self) -> Result<()> {
        Ok(self.inner.clear()?)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let len = self.inner.length()?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.inner.key(i)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// In-memory backend. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.items.borrow_mut().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.borrow().keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub type DynStore = Box<dyn KeyValueStore>;

/// Storage shared by the running app.
pub type SharedStorage = Rc<StorageManager<DynStore>>;

pub struct StorageManager<S: KeyValueStore> {
    store: S,
    available: bool,
}

const CHECK_KEY: &str = "agentk.__check__";

impl<S: KeyValueStore> StorageManager<S> {
    /// Wrap `store`, probing it with a write/remove round trip.
    pub fn new(store: S) -> Self {
        let available = store
            .set_item(CHECK_KEY, CHECK_KEY)
            .and_then(|_| store.remove_item(CHECK_KEY))
            .is_ok();
        if !available {
            log::warn!("storage is not available, running without persistence");
        }
        Self { store, available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", STORAGE_NAMESPACE, key)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(ClientError::StorageUnavailable)
        }
    }

    /// Read and decode `key`. Missing, unreadable or malformed entries read
    /// as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.available {
            return None;
        }
        let raw = match self.store.get_item(&Self::namespaced(key)) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("error reading storage key {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("discarding malformed storage key {}: {}", key, e);
                None
            }
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_available()?;
        let raw = serde_json::to_string(value)?;
        self.store.set_item(&Self::namespaced(key), &raw)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.ensure_available()?;
        self.store.remove_item(&Self::namespaced(key))
    }

    /// Remove every key this manager owns. Foreign keys are left alone.
    pub fn clear(&self) -> Result<()> {
        self.ensure_available()?;
        for key in self.store.keys()? {
            if key.starts_with(STORAGE_NAMESPACE) {
                self.store.remove_item(&key)?;
            }
        }
        Ok(())
    }

    // ---------------- Auth ----------------

    pub fn auth_token(&self) -> Option<String> {
        self.get(storage_keys::AUTH_TOKEN)
    }

    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        self.set(storage_keys::AUTH_TOKEN, token)
    }

    pub fn remove_auth_token(&self) -> Result<()> {
        self.remove(storage_keys::AUTH_TOKEN)
    }

    pub fn user_data(&self) -> Option<Value> {
        self.get(storage_keys::USER_DATA)
    }

    pub fn set_user_data(&self, data: &Value) -> Result<()> {
        self.set(storage_keys::USER_DATA, data)
    }

    pub fn remove_user_data(&self) -> Result<()> {
        self.remove(storage_keys::USER_DATA)
    }

    // ---------------- Settings ----------------

    pub fn app_settings(&self) -> AppSettings {
        self.get::<Value>(storage_keys::APP_SETTINGS)
            .map(|stored| AppSettings::from_stored(&stored))
            .unwrap_or_default()
    }

    pub fn set_app_settings(&self, settings: &AppSettings) -> Result<()> {
        self.set(storage_keys::APP_SETTINGS, settings)
    }

    /// Merge `patch` over the stored settings, persist and return the result.
    pub fn update_app_settings(&self, patch: &Value) -> Result<AppSettings> {
        let merged = self.app_settings().merged(patch);
        self.set_app_settings(&merged)?;
        Ok(merged)
    }

    pub fn theme(&self) -> Theme {
        self.get(storage_keys::THEME).unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.set(storage_keys::THEME, &theme)
    }

    pub fn language(&self) -> String {
        self.get(storage_keys::LANGUAGE)
            .unwrap_or_else(|| crate::constants::settings_defaults::LANGUAGE.to_string())
    }

    pub fn set_language(&self, language: &str) -> Result<()> {
        self.set(storage_keys::LANGUAGE, language)
    }

    // ---------------- Recent agents ----------------

    /// Most recently used first.
    pub fn recent_agents(&self) -> Vec<String> {
        self.get_or(storage_keys::RECENT_AGENTS, Vec::new())
    }

    pub fn add_recent_agent(&self, agent_id: &str) -> Result<()> {
        let updated = push_recent(self.recent_agents(), agent_id);
        self.set(storage_keys::RECENT_AGENTS, &updated)
    }

    pub fn remove_recent_agent(&self, agent_id: &str) -> Result<()> {
        let mut recent = self.recent_agents();
        recent.retain(|id| id != agent_id);
        self.set(storage_keys::RECENT_AGENTS, &recent)
    }

    // ---------------- Chat history ----------------

    fn all_chat_history(&self) -> BTreeMap<String, Vec<ChatMessage>> {
        self.get_or(storage_keys::CHAT_HISTORY, BTreeMap::new())
    }

    pub fn chat_history(&self, agent_id: &str) -> Vec<ChatMessage> {
        self.all_chat_history()
            .remove(agent_id)
            .unwrap_or_default()
    }

    pub fn save_chat_history(&self, agent_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let mut all = self.all_chat_history();
        all.insert(agent_id.to_string(), messages.to_vec());
        self.set(storage_keys::CHAT_HISTORY, &all)
    }

    pub fn clear_chat_history(&self, agent_id: &str) -> Result<()> {
        let mut all = self.all_chat_history();
        if all.remove(agent_id).is_some() {
            self.set(storage_keys::CHAT_HISTORY, &all)?;
        }
        Ok(())
    }

    // ---------------- Bulk ----------------

    /// Every namespaced entry, keyed without the namespace prefix.
    pub fn export_data(&self) -> Result<BTreeMap<String, Value>> {
        self.ensure_available()?;
        let mut out = BTreeMap::new();
        for key in self.store.keys()? {
            let Some(short) = key.strip_prefix(STORAGE_NAMESPACE) else {
                continue;
            };
            if let Some(raw) = self.store.get_item(&key)? {
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                out.insert(short.to_string(), value);
            }
        }
        Ok(out)
    }

    pub fn import_data(&self, data: &BTreeMap<String, Value>) -> Result<()> {
        for (key, value) in data {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Adopt `old_key`, a raw key written outside the namespace by an older
    /// build, as the namespaced `new_key`. The old value is parsed leniently
    /// (a bare token that is not JSON is kept as a string) and passed
    /// through `transform`. A value already stored under `new_key` wins.
    /// Returns `false` when there was nothing to migrate.
    pub fn migrate_key(
        &self,
        old_key: &str,
        new_key: &str,
        transform: impl FnOnce(Value) -> Value,
    ) -> Result<bool> {
        self.ensure_available()?;
        let Some(raw) = self.store.get_item(old_key)? else {
            return Ok(false);
        };
        if self.get::<Value>(new_key).is_none() {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            self.set(new_key, &transform(value))?;
            log::info!("migrated storage key {} -> {}", old_key, new_key);
        } else {
            log::debug!("dropping legacy key {}, {} already set", old_key, new_key);
        }
        self.store.remove_item(old_key)?;
        Ok(true)
    }

    /// Run [`migrate_key`](Self::migrate_key) over every legacy key.
    /// Returns how many were moved.
    pub fn migrate_legacy_keys(&self) -> usize {
        if !self.available {
            return 0;
        }
        storage_keys::LEGACY
            .iter()
            .filter(|key| match self.migrate_key(key, key, |v| v) {
                Ok(moved) => moved,
                Err(e) => {
                    log::warn!("could not migrate storage key {}: {}", key, e);
                    false
                }
            })
            .count()
    }
}

/// Drop credentials from an export or import; a data file never carries a
/// session.
pub fn portable(mut data: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    data.remove(storage_keys::AUTH_TOKEN);
    data.remove(storage_keys::USER_DATA);
    data
}

/// Move `agent_id` to the front, drop duplicates, cap the list length.
pub fn push_recent(mut recent: Vec<String>, agent_id: &str) -> Vec<String> {
    recent.retain(|id| id != agent_id);
    recent.insert(0, agent_id.to_string());
    recent.truncate(RECENT_AGENTS_LIMIT);
    recent
}

/// Local storage when the browser grants it, memory otherwise.
pub fn open_default() -> SharedStorage {
    let store: DynStore = match BrowserStorage::local() {
        Ok(local) => Box::new(local),
        Err(e) => {
            log::warn!("falling back to in-memory storage: {}", e);
            Box::new(MemoryStore::new())
        }
    };
    Rc::new(StorageManager::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use proptest::prelude::*;
    use serde_json::json;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _: &str) -> Result<Option<String>> {
            Err(ClientError::Storage("quota".into()))
        }
        fn set_item(&self, _: &str, _: &str) -> Result<()> {
            Err(ClientError::Storage("quota".into()))
        }
        fn remove_item(&self, _: &str) -> Result<()> {
            Err(ClientError::Storage("quota".into()))
        }
        fn clear(&self) -> Result<()> {
            Ok(())
        }
        fn keys(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn manager() -> (MemoryStore, StorageManager<MemoryStore>) {
        let store = MemoryStore::new();
        (store.clone(), StorageManager::new(store))
    }

    #[test]
    fn keys_are_namespaced() {
        let (raw, storage) = manager();
        storage.set_auth_token("jwt-123").unwrap();
        assert_eq!(
            raw.get_item("agentk.auth_token").unwrap().as_deref(),
            Some("\"jwt-123\"")
        );
        assert_eq!(storage.auth_token().as_deref(), Some("jwt-123"));
        assert!(raw.get_item(CHECK_KEY).unwrap().is_none());
    }

    #[test]
    fn clear_leaves_foreign_keys() {
        let (raw, storage) = manager();
        raw.set_item("other-app", "1").unwrap();
        storage.set_theme(Theme::Light).unwrap();
        storage.clear().unwrap();
        assert_eq!(raw.keys().unwrap(), vec!["other-app".to_string()]);
    }

    #[test]
    fn settings_round_trip_and_merge() {
        let (_, storage) = manager();
        assert_eq!(storage.app_settings(), AppSettings::default());

        let updated = storage
            .update_app_settings(&json!({ "theme": "high-contrast", "reduceMotion": true }))
            .unwrap();
        assert_eq!(updated.theme, Theme::HighContrast);
        assert_eq!(storage.app_settings(), updated);

        let again = storage.update_app_settings(&json!({ "language": "de" })).unwrap();
        assert_eq!(again.theme, Theme::HighContrast);
        assert_eq!(again.language, "de");
    }

    #[test]
    fn malformed_value_reads_as_default() {
        let (raw, storage) = manager();
        raw.set_item("agentk.recent_agents", "{not json").unwrap();
        assert!(storage.recent_agents().is_empty());
    }

    #[test]
    fn chat_history_is_per_agent() {
        let (_, storage) = manager();
        let a = vec![ChatMessage::new(ChatRole::User, "hi")];
        let b = vec![
            ChatMessage::new(ChatRole::User, "yo"),
            ChatMessage::new(ChatRole::Agent, "hello"),
        ];
        storage.save_chat_history("a", &a).unwrap();
        storage.save_chat_history("b", &b).unwrap();
        assert_eq!(storage.chat_history("a"), a);
        assert_eq!(storage.chat_history("b"), b);

        storage.clear_chat_history("a").unwrap();
        assert!(storage.chat_history("a").is_empty());
        assert_eq!(storage.chat_history("b").len(), 2);
        assert!(storage.chat_history("missing").is_empty());
    }

    #[test]
    fn recent_agents_move_to_front() {
        let (_, storage) = manager();
        for id in ["a", "b", "c", "a"] {
            storage.add_recent_agent(id).unwrap();
        }
        assert_eq!(storage.recent_agents(), vec!["a", "c", "b"]);
        storage.remove_recent_agent("c").unwrap();
        assert_eq!(storage.recent_agents(), vec!["a", "b"]);
    }

    #[test]
    fn unavailable_store_reads_defaults_and_rejects_writes() {
        let storage = StorageManager::new(BrokenStore);
        assert!(!storage.is_available());
        assert_eq!(storage.theme(), Theme::Dark);
        assert!(storage.recent_agents().is_empty());
        assert!(matches!(
            storage.set_theme(Theme::Light),
            Err(ClientError::StorageUnavailable)
        ));
        assert!(matches!(
            storage.add_recent_agent("a"),
            Err(ClientError::StorageUnavailable)
        ));
    }

    #[test]
    fn export_then_import_into_fresh_store() {
        let (_, storage) = manager();
        storage.add_recent_agent("a1").unwrap();
        storage.set_theme(Theme::Light).unwrap();

        let exported = storage.export_data().unwrap();
        assert_eq!(exported["recent_agents"], json!(["a1"]));

        let (_, other) = manager();
        other.import_data(&exported).unwrap();
        assert_eq!(other.recent_agents(), vec!["a1"]);
        assert_eq!(other.theme(), Theme::Light);
    }

    #[test]
    fn portable_data_has_no_credentials() {
        let (_, storage) = manager();
        storage.set_auth_token("jwt").unwrap();
        storage.set_user_data(&json!({ "username": "ada" })).unwrap();
        storage.set_language("fr").unwrap();
        let data = portable(storage.export_data().unwrap());
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["language"]);
    }

    #[test]
    fn legacy_keys_move_into_the_namespace() {
        let (raw, storage) = manager();
        // Written by the pre-namespace build: a bare token and a JSON list.
        raw.set_item("auth_token", "jwt-legacy").unwrap();
        raw.set_item("recent_agents", r#"["a2","a1"]"#).unwrap();
        raw.set_item("theme", "\"light\"").unwrap();
        storage.set_theme(Theme::HighContrast).unwrap();

        assert_eq!(storage.migrate_legacy_keys(), 3);
        assert_eq!(storage.auth_token().as_deref(), Some("jwt-legacy"));
        assert_eq!(storage.recent_agents(), vec!["a2", "a1"]);
        // Already namespaced values are kept.
        assert_eq!(storage.theme(), Theme::HighContrast);
        assert!(raw.get_item("auth_token").unwrap().is_none());
        assert!(raw.get_item("theme").unwrap().is_none());

        assert_eq!(storage.migrate_legacy_keys(), 0);
        assert!(!storage.migrate_key("missing", "theme", |v| v).unwrap());
    }

    proptest! {
        #[test]
        fn recent_agents_stay_unique_and_bounded(ids in proptest::collection::vec(0u8..20, 0..60)) {
            let mut recent = Vec::new();
            for id in &ids {
                recent = push_recent(recent, &id.to_string());
            }
            prop_assert!(recent.len() <= RECENT_AGENTS_LIMIT);
            let mut seen = std::collections::HashSet::new();
            for id in &recent {
                prop_assert!(seen.insert(id.clone()));
            }
            if let Some(last) = ids.last() {
                prop_assert_eq!(recent.first().cloned(), Some(last.to_string()));
            }
        }
    }
}
