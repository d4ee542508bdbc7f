//! Account session: verify a stored token at startup, sign in, sign out.
//!
//! The token itself lives in storage and is managed by the API client; this
//! reducer only tracks who is signed in.

use crate::constants::error_messages::SESSION_EXPIRED;
use crate::constants::success_messages::LOGGED_OUT;
use crate::messages::{Command, Message, Region};
use crate::notifications::Severity;
use crate::state::AppState;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the auth reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::VerifySession => {
            state.auth.verifying = true;
            cmds.push(Command::VerifySession);
            true
        }
        Message::SessionVerified(result) => {
            state.auth.verifying = false;
            match result {
                Ok(Some(user)) => {
                    log::info!("session verified for {}", user.username);
                    state.auth.user = Some(user.clone());
                }
                Ok(None) => log::info!("session could not be checked, continuing signed out"),
                Err(e) => {
                    log::info!("stored session rejected: {}", e);
                    state.auth.user = None;
                    notify(state, cmds, SESSION_EXPIRED, Severity::Warning);
                }
            }
            repaint(cmds);
            true
        }
        Message::Login { username, password } => {
            if state.auth.signing_in {
                log::debug!("login already in progress");
                return true;
            }
            state.auth.signing_in = true;
            cmds.push(Command::Login {
                username: username.clone(),
                password: password.clone(),
            });
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::LoginFinished(result) => {
            state.auth.signing_in = false;
            match result {
                Ok(user) => {
                    let text = format!("Signed in as {}.", user.display_name());
                    state.auth.user = Some(user.clone());
                    notify(state, cmds, &text, Severity::Success);
                }
                Err(e) => notify_error(state, cmds, "Login failed", e),
            }
            repaint(cmds);
            true
        }
        Message::Logout => {
            cmds.push(Command::Logout);
            true
        }
        Message::LoggedOut => {
            state.auth.user = None;
            notify(state, cmds, LOGGED_OUT, Severity::Info);
            repaint(cmds);
            true
        }
        _ => false,
    }
}

fn repaint(cmds: &mut Vec<Command>) {
    cmds.push(Command::Render(Region::Shell));
    cmds.push(Command::Render(Region::Content));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::update::update;

    fn ada() -> User {
        User {
            id: "u1".into(),
            username: "ada".into(),
            email: None,
            full_name: Some("Ada Lovelace".into()),
        }
    }

    #[test]
    fn login_round_trip() {
        let mut state = AppState::new();
        let cmds = update(
            &mut state,
            Message::Login {
                username: "ada".into(),
                password: "secret1".into(),
            },
        );
        assert!(cmds.iter().any(|c| matches!(c, Command::Login { username, .. } if username == "ada")));
        assert!(state.auth.signing_in);

        // Double submit while waiting.
        let again = update(
            &mut state,
            Message::Login {
                username: "ada".into(),
                password: "secret1".into(),
            },
        );
        assert!(again.is_empty());

        update(&mut state, Message::LoginFinished(Ok(ada())));
        assert!(state.auth.signed_in());
        assert!(!state.auth.signing_in);
        assert!(state.notifications.active()[0].message.contains("Ada Lovelace"));

        let cmds = update(&mut state, Message::Logout);
        assert!(matches!(cmds.as_slice(), [Command::Logout]));
        update(&mut state, Message::LoggedOut);
        assert!(!state.auth.signed_in());
    }

    #[test]
    fn failed_login_reports_error() {
        let mut state = AppState::new();
        update(
            &mut state,
            Message::Login {
                username: "ada".into(),
                password: "wrong-pw".into(),
            },
        );
        update(&mut state, Message::LoginFinished(Err("Unauthorized. Please log in again.".into())));
        assert!(!state.auth.signed_in());
        assert!(!state.auth.signing_in);
        assert_eq!(state.notifications.active()[0].severity, Severity::Error);
    }

    #[test]
    fn rejected_session_warns() {
        let mut state = AppState::new();
        let cmds = update(&mut state, Message::VerifySession);
        assert!(cmds.iter().any(|c| matches!(c, Command::VerifySession)));
        assert!(state.auth.verifying);

        update(&mut state, Message::SessionVerified(Err("Unauthorized".into())));
        assert!(!state.auth.verifying);
        assert!(!state.auth.signed_in());
        assert_eq!(state.notifications.active()[0].message, SESSION_EXPIRED);
    }

    #[test]
    fn verified_session_signs_in_quietly() {
        let mut state = AppState::new();
        update(&mut state, Message::VerifySession);
        update(&mut state, Message::SessionVerified(Ok(Some(ada()))));
        assert_eq!(state.auth.user.as_ref().map(|u| u.username.as_str()), Some("ada"));
        assert!(state.notifications.active().is_empty());
    }

    #[test]
    fn unreachable_backend_is_not_an_expired_session() {
        let mut state = AppState::new();
        update(&mut state, Message::VerifySession);
        update(&mut state, Message::SessionVerified(Ok(None)));
        assert!(!state.auth.verifying);
        assert!(!state.auth.signed_in());
        assert!(state.notifications.active().is_empty());
    }
}
