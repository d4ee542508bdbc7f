//! Uploaded files: list, delete and download.

use crate::constants::success_messages::FILE_DELETED;
use crate::messages::{Command, Message, Region};
use crate::notifications::Severity;
use crate::state::AppState;

use super::{notify, notify_error};

/// Returns `true` when the message was handled by the files reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadFiles => {
            state.files.loading = true;
            cmds.push(Command::FetchFiles);
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::FilesLoaded(result) => {
            state.files.loading = false;
            match result {
                Ok(files) => state.files.list = files.clone(),
                Err(e) => notify_error(state, cmds, "Failed to load files", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::DownloadFile(path) => {
            cmds.push(Command::OpenFileDownload(path.clone()));
            true
        }
        Message::DeleteFile(path) => {
            cmds.push(Command::DeleteFile(path.clone()));
            true
        }
        Message::FileDeleted(result) => {
            match result {
                Ok(path) => {
                    state.files.list.retain(|f| f.path() != path);
                    notify(state, cmds, FILE_DELETED, Severity::Success);
                }
                Err(e) => notify_error(state, cmds, "Failed to delete file", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileEntry;
    use crate::update::update;

    fn file(name: &str, path: &str) -> FileEntry {
        FileEntry {
            name: name.into(),
            path: path.into(),
            size: 2048,
            modified: None,
        }
    }

    #[test]
    fn delete_removes_by_path() {
        let mut state = AppState::new();
        update(&mut state, Message::LoadFiles);
        assert!(state.files.loading);
        update(
            &mut state,
            Message::FilesLoaded(Ok(vec![file("a.txt", "docs/a.txt"), file("b.txt", "b.txt")])),
        );
        assert!(!state.files.loading);

        let cmds = update(&mut state, Message::DeleteFile("docs/a.txt".into()));
        assert!(cmds.iter().any(|c| matches!(c, Command::DeleteFile(p) if p == "docs/a.txt")));
        update(&mut state, Message::FileDeleted(Ok("docs/a.txt".into())));
        assert_eq!(state.files.list.len(), 1);
        assert_eq!(state.files.list[0].name, "b.txt");
        assert_eq!(state.notifications.active()[0].severity, Severity::Success);
    }

    #[test]
    fn failed_delete_keeps_the_file() {
        let mut state = AppState::new();
        update(&mut state, Message::FilesLoaded(Ok(vec![file("a.txt", "a.txt")])));
        update(&mut state, Message::FileDeleted(Err("Resource not found.".into())));
        assert_eq!(state.files.list.len(), 1);
        assert_eq!(state.notifications.active()[0].severity, Severity::Error);
    }

    #[test]
    fn download_is_handed_to_the_browser() {
        let mut state = AppState::new();
        let cmds = update(&mut state, Message::DownloadFile("b.txt".into()));
        assert!(matches!(cmds.as_slice(), [Command::OpenFileDownload(p)] if p == "b.txt"));
    }
}
