//! Workflow list, or the builder when one is open.

use crate::canvas::view::builder_html;
use crate::models::{Workflow, WorkflowStatus};
use crate::state::AppState;
use crate::utils::{escape_html, truncate};

fn status_label(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Draft => "draft",
        WorkflowStatus::Active => "active",
        WorkflowStatus::Running => "running",
        WorkflowStatus::Completed => "completed",
        WorkflowStatus::Failed => "failed",
    }
}

fn workflow_row(workflow: &Workflow, executing: Option<&str>) -> String {
    let Some(id) = workflow.id.as_deref() else {
        return String::new();
    };
    let running = executing == Some(id);
    format!(
        r#"<tr class="workflow-row">
<td class="workflow-name">{name}</td>
<td>{desc}</td>
<td>{nodes}</td>
<td><span class="status-badge status-{status}">{status}</span></td>
<td class="workflow-actions">
<button type="button" class="btn btn-small" data-action="edit-workflow" data-id="{id}">Edit</button>
<button type="button" class="btn btn-small btn-primary" data-action="execute-workflow" data-id="{id}"{disabled}>{run_label}</button>
<button type="button" class="btn btn-small btn-danger" data-action="delete-workflow" data-id="{id}">Delete</button>
</td>
</tr>"#,
        name = escape_html(&workflow.name),
        desc = escape_html(&truncate(&workflow.description, 80, "...")),
        nodes = workflow.nodes.len(),
        status = status_label(workflow.status),
        id = escape_html(id),
        disabled = if running { " disabled" } else { "" },
        run_label = if running { "Running..." } else { "Execute" },
    )
}

pub fn html(state: &AppState) -> String {
    if let Some(builder) = state.workflows.builder.as_ref() {
        return builder_html(builder, &state.agents.all());
    }

    let executing = state.workflows.executing.as_ref().map(|(id, _)| id.as_str());
    let body = if state.workflows.loading && state.workflows.list.is_empty() {
        r#"<p class="loading">Loading workflows...</p>"#.to_string()
    } else if state.workflows.list.is_empty() {
        r#"<p class="muted">No workflows yet.</p>"#.to_string()
    } else {
        let rows: String = state
            .workflows
            .list
            .iter()
            .map(|w| workflow_row(w, executing))
            .collect();
        format!(
            r#"<table class="workflow-table"><thead><tr><th>Name</th><th>Description</th><th>Nodes</th><th>Status</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            rows
        )
    };

    format!(
        r#"<section class="workflows-view">
<div class="view-toolbar"><button type="button" class="btn btn-primary" data-action="new-workflow">New workflow</button></div>
{body}
</section>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowBuilder;

    fn saved(id: &str, name: &str) -> Workflow {
        Workflow {
            id: Some(id.into()),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn running_workflow_cannot_be_started_again() {
        let mut state = AppState::new();
        state.workflows.list = vec![saved("w1", "Daily"), saved("w2", "Weekly")];
        state.workflows.executing = Some(("w1".into(), Some(1)));
        let html = html(&state);
        assert_eq!(html.matches("Running...").count(), 1);
        assert_eq!(html.matches(">Execute<").count(), 1);
    }

    #[test]
    fn open_builder_replaces_list() {
        let mut state = AppState::new();
        state.workflows.list = vec![saved("w1", "Daily")];
        state.workflows.builder = Some(WorkflowBuilder::empty());
        let html = html(&state);
        assert!(html.contains("workflow-canvas"));
        assert!(!html.contains("workflow-table"));
    }
}
