//! Agent list with filters, the create / import forms and the memory panel
//! of the selected agent.

use crate::constants::DEFAULT_MODEL;
use crate::models::{Agent, AgentStatus, Capability, MemoryItem};
use crate::state::{AppState, MemoryState};
use crate::utils::{escape_html, relative_time_rfc3339, truncate};

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        escape_html(value),
        if selected { " selected" } else { "" },
        escape_html(label)
    )
}

fn filters_html(state: &AppState) -> String {
    let statuses: String = AgentStatus::ALL
        .iter()
        .map(|s| option(s.as_str(), s.as_str(), state.agents.status_filter == Some(*s)))
        .collect();
    let caps: String = Capability::ALL
        .iter()
        .map(|c| option(c.as_str(), &c.label(), state.agents.capability_filter == Some(*c)))
        .collect();
    format!(
        r#"<div class="agent-filters">
<select data-filter="status"><option value="">All statuses</option>{statuses}</select>
<select data-filter="capability"><option value="">All capabilities</option>{caps}</select>
<button type="button" class="btn" data-action="refresh-agents">Refresh</button>
</div>"#
    )
}

fn create_form_html() -> String {
    let caps: String = Capability::ALL
        .iter()
        .map(|c| {
            format!(
                r#"<label class="checkbox"><input type="checkbox" name="capabilities" value="{}"> {}</label>"#,
                c.as_str(),
                c.label()
            )
        })
        .collect();
    format!(
        r#"<details class="panel agent-create">
<summary>Create agent</summary>
<form data-form="create-agent">
<label>Name<input type="text" name="name" required minlength="2" maxlength="100"></label>
<label>Description<textarea name="description" rows="2" maxlength="500"></textarea></label>
<label>Model<input type="text" name="model" value="{model}"></label>
<label>Avatar<input type="text" name="avatar" placeholder="🤖" maxlength="4"></label>
<fieldset class="capabilities"><legend>Capabilities</legend>{caps}</fieldset>
<button type="submit" class="btn btn-primary">Create</button>
</form>
</details>
<details class="panel agent-import">
<summary>Import configuration</summary>
<form data-form="import-agent">
<textarea name="config" rows="5" placeholder="Paste an exported agent configuration (JSON)"></textarea>
<button type="submit" class="btn">Import</button>
</form>
</details>"#,
        model = DEFAULT_MODEL,
    )
}

pub fn agent_card(agent: &Agent) -> String {
    let caps: String = agent
        .capabilities
        .iter()
        .map(|c| format!(r#"<span class="capability-tag">{}</span>"#, c.label()))
        .collect();
    let toggle = if agent.is_active() {
        format!(
            r#"<button type="button" class="btn btn-small" data-action="deactivate-agent" data-id="{}">Deactivate</button>"#,
            escape_html(&agent.id)
        )
    } else {
        format!(
            r#"<button type="button" class="btn btn-small" data-action="activate-agent" data-id="{}">Activate</button>"#,
            escape_html(&agent.id)
        )
    };
    format!(
        r#"<article class="agent-card" data-agent-id="{id}">
<header><span class="agent-avatar">{avatar}</span><h3>{name}</h3><span class="status-badge status-{status}">{status}</span></header>
<p class="agent-description">{desc}</p>
<p class="agent-model">{model}</p>
<div class="capability-tags">{caps}</div>
<footer class="agent-actions">
<button type="button" class="btn btn-small btn-primary" data-action="open-chat" data-id="{id}">Chat</button>
{toggle}
<button type="button" class="btn btn-small" data-action="show-memory" data-id="{id}">Memory</button>
<button type="button" class="btn btn-small" data-action="export-agent" data-id="{id}">Export</button>
<button type="button" class="btn btn-small btn-danger" data-action="delete-agent" data-id="{id}">Delete</button>
</footer>
</article>"#,
        id = escape_html(&agent.id),
        avatar = escape_html(&agent.avatar),
        name = escape_html(&agent.name),
        status = agent.status.as_str(),
        desc = escape_html(&truncate(&agent.description, 140, "...")),
        model = escape_html(&agent.model),
        caps = caps,
        toggle = toggle,
    )
}

fn memory_item_html(item: &MemoryItem, now_ms: u64) -> String {
    let when = item
        .timestamp
        .as_deref()
        .map(|t| relative_time_rfc3339(t, now_ms))
        .unwrap_or_default();
    let delete = item
        .id
        .as_deref()
        .map(|id| {
            format!(
                r#"<button type="button" class="btn btn-small btn-danger" data-action="delete-memory" data-id="{}">Delete</button>"#,
                escape_html(id)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<li class="memory-item"><p>{}</p><small>{}</small>{}</li>"#,
        escape_html(&item.content),
        escape_html(&when),
        delete
    )
}

fn memory_panel_html(memory: &MemoryState, agent_name: &str, now_ms: u64) -> String {
    let Some(agent_id) = memory.agent_id.as_deref() else {
        return String::new();
    };
    let (heading, items) = match &memory.search_results {
        Some(results) => (
            format!(
                r#"Search results ({}) <button type="button" class="btn btn-small" data-action="clear-memory-search">Clear</button>"#,
                results.len()
            ),
            results.as_slice(),
        ),
        None => ("Stored memory".to_string(), memory.items.as_slice()),
    };
    let list = if memory.loading {
        r#"<p class="loading">Loading memory...</p>"#.to_string()
    } else if items.is_empty() {
        r#"<p class="muted">Nothing stored.</p>"#.to_string()
    } else {
        format!(
            r#"<ul class="memory-list">{}</ul>"#,
            items.iter().map(|i| memory_item_html(i, now_ms)).collect::<String>()
        )
    };
    format!(
        r#"<aside class="panel memory-panel">
<h2>Memory: {name}</h2>
<form data-form="add-memory" data-id="{id}"><textarea name="content" rows="2" placeholder="Add a memory..."></textarea><button type="submit" class="btn btn-primary">Add</button></form>
<form data-form="search-memory"><input type="search" name="query" placeholder="Search memory"><button type="submit" class="btn">Search</button></form>
<h3>{heading}</h3>
{list}
</aside>"#,
        name = escape_html(agent_name),
        id = escape_html(agent_id),
        heading = heading,
        list = list,
    )
}

pub fn html(state: &AppState) -> String {
    let visible = state.agents.visible(&state.search_query);
    let list = if state.agents.loading && !state.agents.loaded {
        r#"<p class="loading">Loading agents...</p>"#.to_string()
    } else if visible.is_empty() {
        if state.agents.is_empty() {
            r#"<p class="muted">No agents yet.</p>"#.to_string()
        } else {
            r#"<p class="muted">No agents match the current search or filters.</p>"#.to_string()
        }
    } else {
        visible.iter().map(|a| agent_card(a)).collect()
    };

    let memory_agent = state
        .memory
        .agent_id
        .as_deref()
        .and_then(|id| state.agents.get(id))
        .map_or("", |a| a.name.as_str());

    format!(
        r#"<section class="agents-view">
{filters}
{create}
<div class="agent-grid">{list}</div>
{memory}
</section>"#,
        filters = filters_html(state),
        create = create_form_html(),
        list = list,
        memory = memory_panel_html(&state.memory, memory_agent, state.now_ms()),
    )
}
