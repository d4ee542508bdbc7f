//! The running application: state, injected services and the dispatch loop.
//!
//! There are no globals. `lib.rs` builds one [`AppHandle`] at startup and
//! every DOM listener, timer and future holds a clone of it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gloo_timers::callback::Interval;

use crate::events::EventBus;
use crate::messages::Message;
use crate::network::{ApiClient, ChatSocket};
use crate::state::AppState;
use crate::storage::SharedStorage;
use crate::update::update;

/// Long-lived services shared by the command executors.
pub struct Services {
    pub api: Rc<ApiClient>,
    pub storage: SharedStorage,
    pub events: Rc<EventBus>,
}

pub struct App {
    state: RefCell<AppState>,
    services: Services,
    socket: RefCell<Option<ChatSocket>>,
    autosave: RefCell<Option<Interval>>,
    ticker: RefCell<Option<Interval>>,
    // Messages dispatched while an update was already running.
    queue: RefCell<VecDeque<Message>>,
}

#[derive(Clone)]
pub struct AppHandle(Rc<App>);

impl AppHandle {
    pub fn new(state: AppState, services: Services) -> Self {
        AppHandle(Rc::new(App {
            state: RefCell::new(state),
            services,
            socket: RefCell::new(None),
            autosave: RefCell::new(None),
            ticker: RefCell::new(None),
            queue: RefCell::new(VecDeque::new()),
        }))
    }

    /// Run `msg` through the reducers, then execute the resulting commands.
    ///
    /// The state borrow is released before any command runs, so executors
    /// (and anything they call synchronously) may dispatch again. A dispatch
    /// that arrives while the state is borrowed is queued and drained here.
    pub fn dispatch(&self, msg: Message) {
        let commands = match self.0.state.try_borrow_mut() {
            Ok(mut state) => update(&mut state, msg),
            Err(_) => {
                self.0.queue.borrow_mut().push_back(msg);
                return;
            }
        };
        for cmd in commands {
            crate::command_executors::execute(self, cmd);
        }
        let next = self.0.queue.borrow_mut().pop_front();
        if let Some(next) = next {
            self.dispatch(next);
        }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.0.state.borrow())
    }

    pub fn services(&self) -> &Services {
        &self.0.services
    }

    pub fn api(&self) -> Rc<ApiClient> {
        self.0.services.api.clone()
    }

    pub fn storage(&self) -> SharedStorage {
        self.0.services.storage.clone()
    }

    // ---------------- Chat socket ----------------

    pub fn replace_socket(&self, socket: Option<ChatSocket>) {
        let old = self.0.socket.replace(socket);
        if let Some(old) = old {
            retire(old);
        }
    }

    pub fn with_socket<R>(&self, f: impl FnOnce(Option<&ChatSocket>) -> R) -> R {
        f(self.0.socket.borrow().as_ref())
    }

    // ---------------- Timers ----------------

    /// Start (or stop, with `None`) the workflow draft autosave timer.
    pub fn schedule_autosave(&self, interval_ms: Option<u32>) {
        let timer = interval_ms.map(|ms| {
            let app = self.clone();
            Interval::new(ms, move || app.dispatch(Message::AutosaveTick))
        });
        if let Some(ms) = interval_ms {
            log::debug!("autosave every {} ms", ms);
        }
        // Dropping the previous Interval cancels it.
        *self.0.autosave.borrow_mut() = timer;
    }

    /// Drive notification expiry.
    pub fn start_ticker(&self, every_ms: u32) {
        let app = self.clone();
        let timer = Interval::new(every_ms, move || {
            let now = app.with_state(|s| s.now_ms());
            app.dispatch(Message::Tick(now));
        });
        *self.0.ticker.borrow_mut() = Some(timer);
    }
}

/// Close a socket now but drop it on a later turn: it may be the socket
/// whose callback is currently running.
fn retire(socket: ChatSocket) {
    socket.close();
    wasm_bindgen_futures::spawn_local(async move {
        drop(socket);
    });
}
