//! Page skeleton: sidebar navigation, header with the global search and the
//! view container every page renders into.

use crate::constants::{APP_NAME, APP_VERSION};
use crate::dom_utils;
use crate::state::{AppState, View};
use crate::utils::escape_html;

pub const ROOT_ID: &str = "app-shell";
pub const SIDEBAR_ID: &str = "sidebar";
pub const HEADER_TITLE_ID: &str = "page-title";
pub const STATUS_ID: &str = "connection-status";
pub const SEARCH_INPUT_ID: &str = "global-search";
pub const CONTENT_ID: &str = "view-container";

fn view_icon(view: View) -> &'static str {
    match view {
        View::Dashboard => "📊",
        View::Agents => "🤖",
        View::Chat => "💬",
        View::Workflows => "🔀",
        View::Models => "🧠",
        View::Settings => "⚙️",
    }
}

/// Static layout. Rendered once by `views::mount`; the dynamic parts are
/// repainted into the ids above.
pub fn layout_html() -> String {
    format!(
        r#"<div class="app-shell" id="{root}">
<aside class="sidebar" id="{sidebar}"></aside>
<div class="main">
<header class="app-header">
<button type="button" class="btn btn-icon sidebar-toggle" data-action="toggle-sidebar" aria-label="Toggle sidebar">☰</button>
<h1 class="page-title" id="{title}"></h1>
<input type="search" id="{search}" class="global-search" data-input="search" placeholder="Search agents... (Ctrl+K)" autocomplete="off">
<span class="connection-status" id="{status}"></span>
</header>
<main class="view-container" id="{content}"></main>
</div>
</div>"#,
        root = ROOT_ID,
        sidebar = SIDEBAR_ID,
        title = HEADER_TITLE_ID,
        search = SEARCH_INPUT_ID,
        status = STATUS_ID,
        content = CONTENT_ID,
    )
}

pub fn sidebar_html(state: &AppState) -> String {
    let nav: String = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| {
            format!(
                r##"<li><a href="#" class="nav-item{active}" data-action="navigate" data-value="{value}"><span class="nav-icon">{icon}</span><span class="nav-label">{label}</span><kbd>{key}</kbd></a></li>"##,
                active = if *view == state.current_view { " active" } else { "" },
                value = view.as_str(),
                icon = view_icon(*view),
                label = view.title(),
                key = i + 1,
            )
        })
        .collect();

    let recent: String = state
        .recent_agents
        .iter()
        .filter_map(|id| state.agents.get(id))
        .take(5)
        .map(|agent| {
            format!(
                r##"<li><a href="#" class="recent-agent" data-action="open-chat" data-id="{id}">{avatar} {name}</a></li>"##,
                id = escape_html(&agent.id),
                avatar = escape_html(&agent.avatar),
                name = escape_html(&agent.name),
            )
        })
        .collect();
    let recent = if recent.is_empty() {
        String::new()
    } else {
        format!(r#"<h4 class="sidebar-heading">Recent</h4><ul class="recent-agents">{}</ul>"#, recent)
    };

    format!(
        r#"<div class="sidebar-brand">{name} <small>v{version}</small></div>
<nav><ul class="nav-list">{nav}</ul></nav>
{recent}"#,
        name = APP_NAME,
        version = APP_VERSION,
        nav = nav,
        recent = recent,
    )
}

pub fn status_html(state: &AppState) -> String {
    if state.offline {
        r#"<span class="badge badge-warning" title="Running in offline mode">Offline</span>"#.to_string()
    } else {
        r#"<span class="badge badge-success">Online</span>"#.to_string()
    }
}

/// Repaint the sidebar, header and root attributes.
pub fn render(state: &AppState) {
    dom_utils::set_html(SIDEBAR_ID, &sidebar_html(state));
    dom_utils::set_html(STATUS_ID, &status_html(state));
    if let Some(title) = dom_utils::by_id(HEADER_TITLE_ID) {
        title.set_text_content(Some(state.current_view.title()));
    }
    if let Some(root) = dom_utils::by_id(ROOT_ID) {
        dom_utils::set_class(&root, "sidebar-collapsed", !state.sidebar_open);
        dom_utils::set_class(&root, "offline", state.offline);
    }
    if let Some(doc) = dom_utils::document().ok().and_then(|d| d.document_element()) {
        let _ = doc.set_attribute("data-font-size", state.settings.font_size.as_str());
        let _ = doc.set_attribute("data-reduce-motion", &state.settings.reduce_motion.to_string());
    }
}
