//! One WebSocket per open chat.
//!
//! No reconnection: when the socket fails or closes, the chat reducer falls
//! back to one-shot HTTP for subsequent messages.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::messages::ChatFrame;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closed => write!(f, "Closed"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

type FrameCallback = Rc<RefCell<dyn FnMut(ChatFrame)>>;
type StateCallback = Rc<RefCell<dyn FnMut(ConnectionState)>>;

pub struct ChatSocket {
    agent_id: String,
    ws: WebSocket,
    state: Rc<Cell<ConnectionState>>,
    // Kept alive for as long as the socket may fire events.
    _onopen: Closure<dyn FnMut(web_sys::Event)>,
    _onerror: Closure<dyn FnMut(web_sys::Event)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
}

impl ChatSocket {
    /// Open `url` and wire the callbacks. Frames that fail to decode are
    /// logged and dropped.
    pub fn connect(
        agent_id: &str,
        url: &str,
        on_frame: impl FnMut(ChatFrame) + 'static,
        on_state: impl FnMut(ConnectionState) + 'static,
    ) -> Result<Self> {
        let ws = WebSocket::new(url).map_err(|e| ClientError::WebSocket(format!("{:?}", e)))?;
        let state = Rc::new(Cell::new(ConnectionState::Connecting));
        let on_frame: FrameCallback = Rc::new(RefCell::new(on_frame));
        let on_state: StateCallback = Rc::new(RefCell::new(on_state));

        let notify = {
            let state = state.clone();
            let on_state = on_state.clone();
            move |next: ConnectionState| {
                if state.replace(next) != next {
                    if let Ok(mut cb) = on_state.try_borrow_mut() {
                        cb(next);
                    }
                }
            }
        };

        let open_notify = notify.clone();
        let log_id = agent_id.to_string();
        let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
            log::info!("chat socket for {} connected", log_id);
            open_notify(ConnectionState::Open);
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let error_notify = notify.clone();
        let log_id = agent_id.to_string();
        let onerror = Closure::wrap(Box::new(move |e: web_sys::Event| {
            log::error!("chat socket for {} error: {:?}", log_id, e.type_());
            error_notify(ConnectionState::Failed);
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let close_state = state.clone();
        let close_notify = notify;
        let log_id = agent_id.to_string();
        let onclose = Closure::wrap(Box::new(move |evt: CloseEvent| {
            log::info!("chat socket for {} closed (code {})", log_id, evt.code());
            // A socket that never opened stays Failed.
            if close_state.get() != ConnectionState::Failed {
                close_notify(ConnectionState::Closed);
            }
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                log::warn!("received non-text chat frame");
                return;
            };
            match ChatFrame::decode(&text) {
                Ok(frame) => {
                    if let Ok(mut cb) = on_frame.try_borrow_mut() {
                        cb(frame);
                    }
                }
                Err(e) => log::error!("invalid chat frame {}: {}", text, e),
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        Ok(Self {
            agent_id: agent_id.to_string(),
            ws,
            state,
            _onopen: onopen,
            _onerror: onerror,
            _onclose: onclose,
            _onmessage: onmessage,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn send(&self, frame: &ChatFrame) -> Result<()> {
        if !self.is_open() {
            return Err(ClientError::WebSocket(format!(
                "socket is {}",
                self.state()
            )));
        }
        self.ws
            .send_with_str(&frame.encode()?)
            .map_err(|e| ClientError::WebSocket(format!("{:?}", e)))
    }

    pub fn close(&self) {
        self.detach();
        if let Err(e) = self.ws.close() {
            log::debug!("closing chat socket: {:?}", e);
        }
        self.state.set(ConnectionState::Closed);
    }

    fn detach(&self) {
        self.ws.set_onopen(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        self.ws.set_onmessage(None);
    }
}

impl Drop for ChatSocket {
    fn drop(&mut self) {
        // The closures die with us; make sure the socket can no longer call them.
        self.detach();
        if self.state.get() != ConnectionState::Closed {
            let _ = self.ws.close();
        }
    }
}
