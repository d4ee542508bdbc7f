//! System monitor panel on the dashboard: resource usage and backend logs.

use crate::models::{LogEntry, LogLevel, SystemMetrics};
use crate::state::{MonitorState, MonitorTab};
use crate::utils::{escape_html, format_bytes};

fn usage_bar(label: &str, percent: f64, detail: &str) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let level = if percent >= 90.0 {
        "critical"
    } else if percent >= 70.0 {
        "warning"
    } else {
        "normal"
    };
    format!(
        r#"<div class="resource-card"><div class="resource-label">{label}</div><div class="usage-bar usage-{level}"><div class="usage-fill" style="width: {percent:.0}%"></div></div><div class="resource-detail">{percent:.1}%{detail}</div></div>"#
    )
}

fn resources(metrics: &SystemMetrics) -> String {
    let memory = format!(
        " ({} / {})",
        format_bytes(metrics.memory.used, 1),
        format_bytes(metrics.memory.total, 1)
    );
    let disk = format!(
        " ({} free)",
        format_bytes(metrics.disk.free, 1)
    );
    let cores = match metrics.cpu.percent_per_core.len() {
        0 => String::new(),
        n => format!(" across {} cores", n),
    };
    format!(
        r#"<div class="resource-grid">{cpu}{memory}{disk}<div class="resource-card"><div class="resource-label">Network</div><div class="resource-detail">Sent {sent}<br>Received {recv}</div></div></div>"#,
        cpu = usage_bar("CPU", metrics.cpu.percent, &cores),
        memory = usage_bar("Memory", metrics.memory.percent, &memory),
        disk = usage_bar("Disk", metrics.disk.percent, &disk),
        sent = format_bytes(metrics.network.bytes_sent, 1),
        recv = format_bytes(metrics.network.bytes_recv, 1),
    )
}

fn log_row(entry: &LogEntry) -> String {
    format!(
        r#"<li class="log-entry log-{level}"><span class="log-time">{time}</span><span class="log-level">{level}</span><span class="log-message">{message}</span></li>"#,
        level = entry.level.as_str(),
        time = escape_html(&entry.timestamp),
        message = escape_html(&entry.message),
    )
}

fn logs(monitor: &MonitorState) -> String {
    let options: String = LogLevel::ALL
        .iter()
        .map(|level| {
            format!(
                r#"<option value="{value}"{sel}>{value}</option>"#,
                value = level.as_str(),
                sel = if monitor.level_filter == Some(*level) { " selected" } else { "" },
            )
        })
        .collect();
    let entries = monitor.visible_logs();
    let list = if entries.is_empty() {
        r#"<p class="muted">No log entries.</p>"#.to_string()
    } else {
        format!(
            r#"<ul class="log-list">{}</ul>"#,
            entries.into_iter().map(log_row).collect::<String>()
        )
    };
    format!(
        r#"<div class="log-toolbar"><select data-filter="log-level"><option value="">All levels</option>{options}</select><button type="button" class="btn btn-small" data-action="clear-logs">Clear</button></div>{list}"#
    )
}

pub fn panel(monitor: &MonitorState) -> String {
    let tabs: String = [(MonitorTab::Resources, "Resources"), (MonitorTab::Logs, "Logs")]
        .iter()
        .map(|(tab, label)| {
            format!(
                r#"<button type="button" class="tab{active}" data-action="monitor-tab" data-value="{value}">{label}</button>"#,
                active = if monitor.tab == *tab { " active" } else { "" },
                value = tab.as_str(),
            )
        })
        .collect();

    let body = match (monitor.tab, &monitor.metrics) {
        (MonitorTab::Logs, _) => logs(monitor),
        (MonitorTab::Resources, Some(metrics)) => resources(metrics),
        (MonitorTab::Resources, None) if monitor.loading => {
            r#"<p class="loading">Loading metrics...</p>"#.to_string()
        }
        (MonitorTab::Resources, None) => r#"<p class="muted">Metrics unavailable.</p>"#.to_string(),
    };

    format!(
        r#"<div class="panel system-monitor"><div class="panel-header"><h2>System monitor</h2><button type="button" class="btn btn-small" data-action="refresh-monitor">Refresh</button></div>
<div class="tabs">{tabs}</div>
{body}
</div>"#
    )
}
