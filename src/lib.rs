use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{Event, KeyboardEvent};

pub mod app;
pub mod canvas;
pub mod command_executors;
pub mod constants;
pub mod dom_utils;
pub mod error;
pub mod events;
pub mod logging;
pub mod messages;
pub mod models;
pub mod network;
pub mod notifications;
pub mod reducers;
pub mod settings;
pub mod state;
pub mod storage;
pub mod toast;
pub mod update;
pub mod utils;
pub mod validation;
pub mod views;

use app::{AppHandle, Services};
use constants::{storage_keys, APP_NAME, APP_VERSION, NOTIFICATION_TICK_MS};
use events::{AppEvent, EventBus, EventKind};
use messages::{Command, KeyPress, Message};
use network::{ApiClient, ApiConfig, Environment};
use state::{AppState, View};
use storage::SharedStorage;

// Main entry point for the WASM application
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Better panic messages in the console
    console_error_panic_hook::set_once();

    let env = Environment::resolve();
    logging::init(env.log_level());
    log::info!("{} v{} starting", APP_NAME, APP_VERSION);

    let storage = storage::open_default();
    let migrated = storage.migrate_legacy_keys();
    if migrated > 0 {
        log::info!("moved {} stored entries into the {} namespace", migrated, APP_NAME);
    }
    let config = ApiConfig::resolve();
    log::info!("API base URL: {}", config.base_url());
    let api = Rc::new(ApiClient::new(config, storage.clone()));
    let events = Rc::new(EventBus::new());
    subscribe_storage(&events, &storage);

    let mut settings = storage.app_settings();
    if storage.get::<Value>(storage_keys::APP_SETTINGS).is_none() {
        settings.theme = env.default_theme;
    }
    let mut state = AppState::new();
    state.recent_agents = storage.recent_agents();
    let has_session = storage.auth_token().is_some();

    let app = AppHandle::new(
        state,
        Services {
            api,
            storage,
            events,
        },
    );

    views::mount(&app)?;
    app.dispatch(Message::SettingsLoaded(settings));
    app.start_ticker(NOTIFICATION_TICK_MS);
    install_window_listeners(&app)?;

    let online = web_sys::window().map_or(true, |w| w.navigator().on_line());
    if online {
        command_executors::execute(&app, Command::CheckBackend);
    } else {
        app.dispatch(Message::ConnectivityChanged { online: false });
    }
    app.dispatch(Message::Navigate(View::Dashboard));
    if has_session {
        app.dispatch(Message::VerifySession);
    }

    log::info!("{} ready", APP_NAME);
    Ok(())
}

/// Storage bookkeeping that follows domain events rather than any one
/// reducer.
fn subscribe_storage(events: &EventBus, storage: &SharedStorage) {
    let store = storage.clone();
    events.subscribe(EventKind::AgentDeleted, move |event| {
        if let AppEvent::AgentDeleted { agent_id } = event {
            if let Err(e) = store.remove_recent_agent(agent_id) {
                log::warn!("could not drop {} from recent agents: {}", agent_id, e);
            }
            if let Err(e) = store.clear_chat_history(agent_id) {
                log::warn!("could not drop chat history of {}: {}", agent_id, e);
            }
        }
    });

    events.subscribe(EventKind::ThemeChanged, |event| {
        if let AppEvent::ThemeChanged(theme) = event {
            log::debug!("theme changed to {}", theme.as_str());
        }
    });
}

fn install_window_listeners(app: &AppHandle) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))?;

    let key_app = app.clone();
    dom_utils::listen(&window, "keydown", move |e: KeyboardEvent| {
        let key = KeyPress {
            key: e.key(),
            ctrl: e.ctrl_key(),
            meta: e.meta_key(),
            in_form_field: dom_utils::is_form_field(e.target()),
        };
        // Ctrl/Cmd+K would otherwise focus the browser's address bar.
        if (key.ctrl || key.meta) && key.key.eq_ignore_ascii_case("k") {
            e.prevent_default();
        }
        key_app.dispatch(Message::KeyPressed(key));
    })?;

    for (name, online) in [("online", true), ("offline", false)] {
        let app = app.clone();
        dom_utils::listen(&window, name, move |_: Event| {
            log::info!("browser reports {}", name);
            app.dispatch(Message::ConnectivityChanged { online });
        })?;
    }

    for (name, focused) in [("focus", true), ("blur", false)] {
        let app = app.clone();
        dom_utils::listen(&window, name, move |_: Event| {
            app.dispatch(Message::WindowFocusChanged(focused));
        })?;
    }

    Ok(())
}
