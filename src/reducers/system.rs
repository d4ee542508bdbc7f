//! System monitor: resource metrics and the backend log tail shown on the
//! dashboard.

use crate::messages::{Command, Message, Region};
use crate::state::{AppState, View};

/// Returns `true` when the message was handled by the system reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadMonitor => {
            load(state, cmds);
            true
        }
        Message::SystemMetricsLoaded(result) => {
            state.monitor.loading = false;
            match result {
                Ok(metrics) => state.monitor.metrics = Some(metrics.clone()),
                Err(e) => log::warn!("system metrics unavailable: {}", e),
            }
            repaint(state, cmds);
            true
        }
        Message::SystemLogsLoaded(result) => {
            match result {
                Ok(logs) => state.monitor.logs = logs.clone(),
                Err(e) => log::warn!("system logs unavailable: {}", e),
            }
            repaint(state, cmds);
            true
        }
        Message::SetMonitorTab(tab) => {
            if state.monitor.tab != *tab {
                state.monitor.tab = *tab;
                repaint(state, cmds);
            }
            true
        }
        Message::SetLogLevelFilter(level) => {
            state.monitor.level_filter = *level;
            repaint(state, cmds);
            true
        }
        Message::ClearSystemLogs => {
            state.monitor.logs.clear();
            repaint(state, cmds);
            true
        }
        _ => false,
    }
}

pub(crate) fn load(state: &mut AppState, cmds: &mut Vec<Command>) {
    state.monitor.loading = true;
    cmds.push(Command::FetchSystemMetrics);
    cmds.push(Command::FetchSystemLogs);
}

fn repaint(state: &AppState, cmds: &mut Vec<Command>) {
    if state.current_view == View::Dashboard {
        cmds.push(Command::Render(Region::Content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogEntry, LogLevel, SystemMetrics};
    use crate::state::MonitorTab;
    use crate::update::update;

    fn log(level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            timestamp: "2024-05-01T10:00:00".into(),
            level,
            message: message.into(),
        }
    }

    #[test]
    fn dashboard_loads_metrics_and_logs() {
        let mut state = AppState::new();
        let cmds = update(&mut state, Message::Navigate(View::Dashboard));
        assert!(cmds.iter().any(|c| matches!(c, Command::FetchSystemMetrics)));
        assert!(cmds.iter().any(|c| matches!(c, Command::FetchSystemLogs)));
        assert!(state.monitor.loading);

        let mut metrics = SystemMetrics::default();
        metrics.cpu.percent = 37.0;
        update(&mut state, Message::SystemMetricsLoaded(Ok(metrics)));
        assert!(!state.monitor.loading);
        assert_eq!(state.monitor.metrics.as_ref().map(|m| m.cpu.percent), Some(37.0));
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let mut state = AppState::new();
        update(&mut state, Message::SystemMetricsLoaded(Ok(SystemMetrics::default())));
        update(&mut state, Message::SystemLogsLoaded(Ok(vec![log(LogLevel::Info, "up")])));
        update(&mut state, Message::SystemMetricsLoaded(Err("Server error".into())));
        update(&mut state, Message::SystemLogsLoaded(Err("Server error".into())));
        assert!(state.monitor.metrics.is_some());
        assert_eq!(state.monitor.logs.len(), 1);
        // Monitor failures are not worth a toast.
        assert!(state.notifications.active().is_empty());
    }

    #[test]
    fn tab_filter_and_clear() {
        let mut state = AppState::new();
        update(
            &mut state,
            Message::SystemLogsLoaded(Ok(vec![log(LogLevel::Info, "a"), log(LogLevel::Error, "b")])),
        );
        let cmds = update(&mut state, Message::SetMonitorTab(MonitorTab::Logs));
        assert!(cmds.iter().any(|c| matches!(c, Command::Render(Region::Content))));
        assert!(update(&mut state, Message::SetMonitorTab(MonitorTab::Logs)).is_empty());

        update(&mut state, Message::SetLogLevelFilter(Some(LogLevel::Error)));
        assert_eq!(state.monitor.visible_logs().len(), 1);

        update(&mut state, Message::ClearSystemLogs);
        assert!(state.monitor.logs.is_empty());
    }
}
