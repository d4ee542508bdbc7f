//! DOM side of the workflow builder.
//!
//! The builder is rendered as markup from the [`WorkflowGraph`]: absolutely
//! positioned node cards, connection bars (`LineGeometry::css`) whose
//! element id is the connection id, and the properties panel of the
//! selected node. Drags skip the rebuild and only move the affected
//! elements through [`reposition`].

use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, MouseEvent};

use super::geometry::Point;
use super::graph::{config_keys, CanvasNode, NodeKind, WorkflowGraph};
use crate::app::AppHandle;
use crate::dom_utils;
use crate::messages::Message;
use crate::models::Agent;
use crate::state::WorkflowBuilder;
use crate::utils::escape_html;

pub const CANVAS_ID: &str = "workflow-canvas";

const ACTION_TYPES: [(&str, &str); 3] = [("log", "Log"), ("api", "API Call"), ("script", "Script")];

fn node_style(node: &CanvasNode) -> String {
    format!("left:{:.1}px;top:{:.1}px;", node.position.x, node.position.y)
}

pub fn node_html(node: &CanvasNode, selected: bool) -> String {
    let input = if node.kind.has_input() {
        format!(
            r#"<div class="node-handle node-input" data-handle="input" data-node-id="{}"></div>"#,
            node.id
        )
    } else {
        String::new()
    };
    let output = if node.kind.has_output() {
        format!(
            r#"<div class="node-handle node-output" data-handle="output" data-node-id="{}"></div>"#,
            node.id
        )
    } else {
        String::new()
    };
    format!(
        r#"<div class="canvas-node node-{kind}{sel}" id="{id}" data-node-id="{id}" data-action="select-node" data-id="{id}" style="{style}">{input}<div class="node-title">{title}</div><div class="node-description">{desc}</div>{output}</div>"#,
        kind = node.kind.as_str(),
        sel = if selected { " selected" } else { "" },
        id = escape_html(&node.id),
        style = node_style(node),
        input = input,
        title = escape_html(&node.title()),
        desc = escape_html(&node.description()),
        output = output,
    )
}

fn connections_html(graph: &WorkflowGraph) -> String {
    graph
        .connections()
        .filter_map(|c| {
            let geometry = graph.geometry(&c)?;
            Some(format!(
                r#"<div class="connection-line" id="{}" style="{}"></div>"#,
                escape_html(&c.id),
                geometry.css()
            ))
        })
        .collect()
}

fn config_value<'a>(node: &'a CanvasNode, key: &str) -> &'a str {
    node.config
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

/// Properties form for the selected node, chosen by its kind.
pub fn properties_html(node: &CanvasNode, agents: &[&Agent]) -> String {
    let fields = match node.kind {
        NodeKind::Agent => {
            let current = config_value(node, config_keys::AGENT_ID);
            let options: String = agents
                .iter()
                .map(|a| {
                    format!(
                        r#"<option value="{id}"{sel}>{name}</option>"#,
                        id = escape_html(&a.id),
                        sel = if a.id == current { " selected" } else { "" },
                        name = escape_html(&a.name),
                    )
                })
                .collect();
            format!(
                r#"<label>Agent<select name="{agent_key}"><option value="">Select agent...</option>{options}</select></label>
<label>Description<textarea name="{desc_key}" rows="3">{desc}</textarea></label>"#,
                agent_key = config_keys::AGENT_ID,
                options = options,
                desc_key = config_keys::DESCRIPTION,
                desc = escape_html(config_value(node, config_keys::DESCRIPTION)),
            )
        }
        NodeKind::Condition => format!(
            r#"<label>Condition<input type="text" name="{key}" value="{value}" placeholder="e.g., input.score > 0.5"></label>"#,
            key = config_keys::CONDITION,
            value = escape_html(config_value(node, config_keys::CONDITION)),
        ),
        NodeKind::Action => {
            let current = config_value(node, config_keys::ACTION_TYPE);
            let options: String = ACTION_TYPES
                .iter()
                .map(|(value, label)| {
                    format!(
                        r#"<option value="{value}"{sel}>{label}</option>"#,
                        sel = if *value == current { " selected" } else { "" },
                    )
                })
                .collect();
            format!(
                r#"<label>Action type<select name="{type_key}">{options}</select></label>
<label>Action<input type="text" name="{action_key}" value="{action}"></label>"#,
                type_key = config_keys::ACTION_TYPE,
                options = options,
                action_key = config_keys::ACTION,
                action = escape_html(config_value(node, config_keys::ACTION)),
            )
        }
        NodeKind::Start | NodeKind::End => {
            r#"<p class="muted">This node has no properties.</p>"#.to_string()
        }
    };
    format!(
        r#"<h3>{title}</h3><form class="node-properties" data-form="node-properties" data-id="{id}">{fields}
<div class="form-actions"><button type="submit" class="btn btn-primary">Apply</button>
<button type="button" class="btn btn-danger" data-action="remove-node" data-id="{id}">Remove node</button></div></form>"#,
        title = escape_html(&node.title()),
        id = escape_html(&node.id),
        fields = fields,
    )
}

fn palette_html() -> String {
    NodeKind::ALL
        .iter()
        .map(|kind| {
            format!(
                r#"<button type="button" class="btn palette-item" data-action="add-node" data-value="{kind}">+ {label}</button>"#,
                kind = kind.as_str(),
                label = crate::utils::capitalize(kind.as_str()),
            )
        })
        .collect()
}

/// Whole builder: toolbar, node palette, canvas and properties panel.
pub fn builder_html(builder: &WorkflowBuilder, agents: &[&Agent]) -> String {
    if builder.loading {
        return r#"<div class="loading">Loading workflow...</div>"#.to_string();
    }
    let graph = &builder.graph;
    let selected = graph.selected_id();
    let nodes: String = graph
        .nodes()
        .map(|n| node_html(n, Some(n.id.as_str()) == selected))
        .collect();
    let properties = graph
        .selected()
        .map(|n| properties_html(n, agents))
        .unwrap_or_else(|| r#"<p class="muted">Select a node to edit its properties.</p>"#.to_string());
    let save_label = if builder.saving { "Saving..." } else { "Save" };
    let status = if builder.dirty { "Unsaved changes" } else { "" };

    format!(
        r#"<div class="workflow-builder">
<div class="builder-toolbar">
<input type="text" class="workflow-name" data-input="workflow-name" value="{name}" placeholder="Workflow name">
<span class="builder-status">{status}</span>
<button type="button" class="btn btn-primary" data-action="save-workflow"{disabled}>{save_label}</button>
<button type="button" class="btn" data-action="close-builder">Close</button>
</div>
<div class="builder-body">
<div class="node-palette">{palette}</div>
<div class="workflow-canvas" id="{canvas_id}">{lines}{nodes}</div>
<aside class="properties-panel">{properties}</aside>
</div>
</div>"#,
        name = escape_html(&builder.workflow.name),
        status = status,
        disabled = if builder.saving { " disabled" } else { "" },
        save_label = save_label,
        palette = palette_html(),
        canvas_id = CANVAS_ID,
        lines = connections_html(graph),
        nodes = nodes,
        properties = properties,
    )
}

/// Pointer position relative to the canvas content box.
pub fn canvas_point(event: &MouseEvent) -> Option<Point> {
    let canvas = dom_utils::by_id(CANVAS_ID)?;
    let rect = canvas.get_bounding_client_rect();
    Some(Point::new(
        event.client_x() as f64 - rect.left() + canvas.scroll_left() as f64,
        event.client_y() as f64 - rect.top() + canvas.scroll_top() as f64,
    ))
}

/// Move one node element and the listed connection bars to their current
/// geometry.
pub fn reposition(app: &AppHandle, node_id: &str, connections: &[String]) {
    app.with_state(|state| {
        let Some(builder) = state.workflows.builder.as_ref() else {
            return;
        };
        let graph = &builder.graph;
        if let (Some(node), Some(el)) = (graph.node(node_id), dom_utils::by_id(node_id)) {
            dom_utils::set_style(&el, &node_style(node));
        }
        for connection in graph.connections().filter(|c| connections.contains(&c.id)) {
            if let (Some(geometry), Some(el)) = (graph.geometry(&connection), dom_utils::by_id(&connection.id)) {
                dom_utils::set_style(&el, &geometry.css());
            }
        }
    });
}

/// Read the rendered size of every node and report the ones whose stored
/// size is off, so connection anchors follow the real layout.
pub fn measure_nodes(app: &AppHandle) {
    let measured: Vec<(String, f64, f64)> = app.with_state(|state| {
        let Some(builder) = state.workflows.builder.as_ref() else {
            return Vec::new();
        };
        builder
            .graph
            .nodes()
            .filter_map(|node| {
                let el = dom_utils::by_id(&node.id)?.dyn_into::<HtmlElement>().ok()?;
                let (w, h) = (el.offset_width() as f64, el.offset_height() as f64);
                let changed = w > 0.0 && h > 0.0 && ((w - node.width).abs() > 0.5 || (h - node.height).abs() > 0.5);
                changed.then(|| (node.id.clone(), w, h))
            })
            .collect()
    });
    for (node_id, width, height) in measured {
        app.dispatch(Message::NodeMeasured {
            node_id,
            width,
            height,
        });
    }
}
