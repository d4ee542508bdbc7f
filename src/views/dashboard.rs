//! Dashboard: agent stats, backend status, the system monitor and quick links.

use crate::models::Agent;
use crate::state::AppState;
use crate::utils::{escape_html, truncate};

fn stat_card(label: &str, value: usize, class: &str) -> String {
    format!(
        r#"<div class="stat-card {class}"><div class="stat-value">{value}</div><div class="stat-label">{label}</div></div>"#
    )
}

fn format_uptime(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (days, hours, minutes) = (total / 86_400, total % 86_400 / 3_600, total % 3_600 / 60);
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn agent_row(agent: &Agent) -> String {
    format!(
        r#"<li class="agent-row"><span class="agent-avatar">{avatar}</span><span class="agent-name">{name}</span><span class="status-badge status-{status}">{status}</span><button type="button" class="btn btn-small" data-action="open-chat" data-id="{id}">Chat</button></li>"#,
        avatar = escape_html(&agent.avatar),
        name = escape_html(&truncate(&agent.name, 30, "...")),
        status = agent.status.as_str(),
        id = escape_html(&agent.id),
    )
}

pub fn html(state: &AppState) -> String {
    let stats = state.agents.stats();
    let cards = [
        stat_card("Total agents", stats.total, "stat-total"),
        stat_card("Active", stats.active, "stat-active"),
        stat_card("Inactive", stats.inactive, "stat-inactive"),
        stat_card("Busy", stats.busy, "stat-busy"),
        stat_card("Error", stats.error, "stat-error"),
    ]
    .concat();

    let system = match &state.system_status {
        Some(status) => {
            let mut rows = vec![format!(
                "<dt>Status</dt><dd>{}</dd>",
                escape_html(if status.status.is_empty() { "unknown" } else { &status.status })
            )];
            if let Some(version) = &status.version {
                rows.push(format!("<dt>Version</dt><dd>{}</dd>", escape_html(version)));
            }
            if let Some(uptime) = status.uptime {
                rows.push(format!("<dt>Uptime</dt><dd>{}</dd>", format_uptime(uptime)));
            }
            if let Some(active) = status.active_agents {
                rows.push(format!("<dt>Running agents</dt><dd>{}</dd>", active));
            }
            format!("<dl class=\"system-status\">{}</dl>", rows.concat())
        }
        None if state.offline => r#"<p class="muted">Backend unreachable.</p>"#.to_string(),
        None => r#"<p class="muted">Loading system status...</p>"#.to_string(),
    };

    let recent: Vec<&Agent> = state
        .recent_agents
        .iter()
        .filter_map(|id| state.agents.get(id))
        .collect();
    let recent = if recent.is_empty() {
        r#"<p class="muted">No recent conversations.</p>"#.to_string()
    } else {
        format!(
            "<ul class=\"agent-rows\">{}</ul>",
            recent.iter().map(|a| agent_row(a)).collect::<String>()
        )
    };

    let agents = if state.agents.loading && !state.agents.loaded {
        r#"<p class="loading">Loading agents...</p>"#.to_string()
    } else if state.agents.is_empty() {
        r#"<p class="muted">No agents yet. <a href="javascript:void(0)" data-action="navigate" data-value="agents">Create one</a>.</p>"#.to_string()
    } else {
        let matches = state.agents.search(&state.search_query);
        format!(
            "<ul class=\"agent-rows\">{}</ul>",
            matches.iter().take(8).map(|a| agent_row(a)).collect::<String>()
        )
    };

    let monitor = super::monitor::panel(&state.monitor);

    format!(
        r#"<section class="dashboard">
<div class="stats-grid">{cards}</div>
<div class="dashboard-grid">
<div class="panel"><div class="panel-header"><h2>System</h2><button type="button" class="btn btn-small" data-action="refresh-status">Refresh</button></div>{system}</div>
{monitor}
<div class="panel"><h2>Recent agents</h2>{recent}</div>
<div class="panel"><div class="panel-header"><h2>Agents</h2><button type="button" class="btn btn-small" data-action="refresh-agents">Refresh</button></div>{agents}</div>
<div class="panel quick-actions"><h2>Quick actions</h2>
<button type="button" class="btn" data-action="navigate" data-value="agents">Manage agents</button>
<button type="button" class="btn" data-action="new-workflow">New workflow</button>
<button type="button" class="btn" data-action="navigate" data-value="models">Models</button>
</div>
</div>
</section>"#
    )
}
