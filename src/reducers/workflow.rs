//! Workflow manager and the builder canvas.
//!
//! Pointer messages are translated into [`WorkflowGraph`] operations; drags
//! only repaint the moved node and the lines touching it.
//!
//! [`WorkflowGraph`]: crate::canvas::graph::WorkflowGraph

use serde_json::Value;

use crate::canvas::geometry::Point;
use crate::canvas::graph::NodeConfig;
use crate::constants::success_messages::{WORKFLOW_DELETED, WORKFLOW_EXECUTED, WORKFLOW_SAVED};
use crate::events::AppEvent;
use crate::messages::{Command, Message, Region};
use crate::notifications::Severity;
use crate::state::{AppState, View, WorkflowBuilder};
use crate::validation::{self, FormData};

use super::{notify, notify_error, notify_progress};

/// Returns `true` when the message was handled by the workflow reducer.
pub fn update(state: &mut AppState, msg: &Message, cmds: &mut Vec<Command>) -> bool {
    match msg {
        Message::LoadWorkflows => {
            state.workflows.loading = true;
            cmds.push(Command::FetchWorkflows);
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::WorkflowsLoaded(result) => {
            state.workflows.loading = false;
            match result {
                Ok(list) => state.workflows.list = list.clone(),
                Err(e) => notify_error(state, cmds, "Failed to load workflows", e),
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::OpenWorkflowBuilder(id) => {
            match id {
                Some(id) => {
                    state.workflows.builder = Some(WorkflowBuilder {
                        loading: true,
                        ..WorkflowBuilder::empty()
                    });
                    cmds.push(Command::FetchWorkflow(id.clone()));
                }
                None => {
                    state.workflows.builder = Some(WorkflowBuilder::empty());
                    cmds.push(Command::RestoreWorkflowDraft);
                }
            }
            state.current_view = View::Workflows;
            cmds.push(Command::Render(Region::Shell));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::WorkflowLoaded(result) => {
            match result {
                Ok(workflow) => {
                    state.workflows.builder = Some(WorkflowBuilder::from_workflow(workflow.clone()));
                }
                Err(e) => {
                    state.workflows.builder = None;
                    notify_error(state, cmds, "Failed to load workflow", e);
                }
            }
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::WorkflowDraftRestored(draft) => {
            let untouched = state
                .workflows
                .builder
                .as_ref()
                .map_or(false, |b| b.is_new() && !b.dirty && b.graph.node_count() == 0);
            if untouched {
                let mut builder = WorkflowBuilder::from_workflow(draft.clone());
                builder.dirty = true;
                state.workflows.builder = Some(builder);
                notify(state, cmds, "Restored unsaved workflow draft", Severity::Info);
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::CloseWorkflowBuilder => {
            state.workflows.builder = None;
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::SetWorkflowName(name) => {
            if let Some(builder) = state.builder_mut() {
                builder.workflow.name = name.clone();
                builder.dirty = true;
            }
            true
        }
        Message::AddNode(kind) => {
            let now = state.now_ms();
            if let Some(builder) = state.builder_mut() {
                let id = builder.graph.add_node(*kind, now);
                log::debug!("added {} node {}", kind.as_str(), id);
                builder.dirty = true;
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::SelectNode(id) => {
            if let Some(builder) = state.builder_mut() {
                builder.graph.select(id);
                cmds.push(Command::Render(Region::Content));
            }
            true
        }
        Message::NodePointerDown { node_id, x, y } => {
            if let Some(builder) = state.builder_mut() {
                builder.graph.begin_drag(node_id, Point::new(*x, *y));
            }
            true
        }
        Message::CanvasPointerMove { x, y } => {
            if let Some(builder) = state.builder_mut() {
                if let Some(node_id) = builder.graph.dragging_id().map(str::to_string) {
                    let touched = builder.graph.drag_to(Point::new(*x, *y));
                    builder.dirty = true;
                    cmds.push(Command::Render(Region::CanvasDrag {
                        node_id,
                        connections: touched.into_iter().map(|c| c.id).collect(),
                    }));
                }
            }
            true
        }
        Message::CanvasPointerUp | Message::CanvasPointerLeave => {
            if let Some(builder) = state.builder_mut() {
                builder.graph.end_drag();
                // A pointer-up on an input handle has already consumed it.
                builder.graph.cancel_connection();
            }
            true
        }
        Message::OutputHandleDown(node_id) => {
            if let Some(builder) = state.builder_mut() {
                if let Err(e) = builder.graph.begin_connection(node_id) {
                    log::warn!("cannot start connection: {}", e);
                }
            }
            true
        }
        Message::InputHandleUp(node_id) => {
            if let Some(builder) = state.builder_mut() {
                if builder.graph.pending_from().is_some() {
                    match builder.graph.complete_connection(node_id) {
                        Ok(id) => {
                            log::debug!("connected {}", id);
                            builder.dirty = true;
                            cmds.push(Command::Render(Region::Content));
                        }
                        Err(e) => log::warn!("connection rejected: {}", e),
                    }
                }
            }
            true
        }
        Message::SubmitNodeProperties { node_id, values } => {
            if let Some(builder) = state.builder_mut() {
                match builder.graph.update_config(node_id, form_to_config(values)) {
                    Ok(_) => {
                        builder.dirty = true;
                        cmds.push(Command::Render(Region::Content));
                    }
                    Err(e) => log::warn!("properties for missing node: {}", e),
                }
            }
            true
        }
        Message::RemoveNode(node_id) => {
            if let Some(builder) = state.builder_mut() {
                match builder.graph.remove_node(node_id) {
                    Ok(removed) => {
                        log::debug!("removed {} with {} connection(s)", node_id, removed.len());
                        builder.dirty = true;
                        cmds.push(Command::Render(Region::Content));
                    }
                    Err(e) => log::warn!("{}", e),
                }
            }
            true
        }
        Message::NodeMeasured {
            node_id,
            width,
            height,
        } => {
            if let Some(builder) = state.builder_mut() {
                builder.graph.set_node_size(node_id, *width, *height);
                let connections = builder
                    .graph
                    .connections_touching(node_id)
                    .into_iter()
                    .map(|c| c.id)
                    .collect::<Vec<_>>();
                if !connections.is_empty() {
                    cmds.push(Command::Render(Region::CanvasDrag {
                        node_id: node_id.clone(),
                        connections,
                    }));
                }
            }
            true
        }
        Message::SaveWorkflow => {
            save(state, cmds);
            true
        }
        Message::WorkflowSaved(saved) => {
            if let Some(builder) = state.builder_mut() {
                builder.saving = false;
                builder.dirty = false;
                builder.workflow = saved.clone();
            }
            state.workflows.upsert(saved.clone());
            notify(state, cmds, WORKFLOW_SAVED, Severity::Success);
            cmds.push(Command::ClearWorkflowDraft);
            cmds.push(Command::Publish(AppEvent::WorkflowSaved(saved.clone())));
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::WorkflowSaveFailed(e) => {
            if let Some(builder) = state.builder_mut() {
                builder.saving = false;
            }
            notify_error(state, cmds, "Failed to save workflow", e);
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::DeleteWorkflow(id) => {
            cmds.push(Command::DeleteWorkflow(id.clone()));
            true
        }
        Message::WorkflowDeleted(id) => {
            state.workflows.remove(id);
            let open = state
                .workflows
                .builder
                .as_ref()
                .map_or(false, |b| b.workflow.id.as_deref() == Some(id.as_str()));
            if open {
                state.workflows.builder = None;
            }
            notify(state, cmds, WORKFLOW_DELETED, Severity::Success);
            cmds.push(Command::Render(Region::Content));
            true
        }
        Message::ExecuteWorkflow(id) => {
            if let Some((running, _)) = &state.workflows.executing {
                log::warn!("workflow {} is still executing", running);
                return true;
            }
            let progress = notify_progress(state, cmds, None, "Executing workflow...", 0.0);
            state.workflows.executing = Some((id.clone(), progress));
            cmds.push(Command::ExecuteWorkflow {
                id: id.clone(),
                input: Value::Object(Default::default()),
            });
            true
        }
        Message::WorkflowExecuted { id, result } => {
            let progress = state.workflows.executing.take().and_then(|(_, n)| n);
            match result {
                Ok(_) => {
                    notify_progress(state, cmds, progress, WORKFLOW_EXECUTED, 100.0);
                    cmds.push(Command::Publish(AppEvent::WorkflowExecuted {
                        workflow_id: id.clone(),
                    }));
                }
                Err(e) => {
                    if let Some(n) = progress {
                        state.notifications.dismiss(n);
                    }
                    notify_error(state, cmds, "Failed to execute workflow", e);
                }
            }
            true
        }
        Message::AutosaveTick => {
            if !state.settings.auto_save {
                return true;
            }
            if let Some(builder) = state.workflows.builder.as_ref().filter(|b| b.dirty && !b.loading) {
                cmds.push(Command::PersistWorkflowDraft(builder.graph.draft(&builder.workflow)));
            }
            true
        }
        _ => false,
    }
}

fn save(state: &mut AppState, cmds: &mut Vec<Command>) {
    let Some(builder) = state.workflows.builder.as_mut() else {
        return;
    };
    if builder.saving {
        log::debug!("save already in flight");
        return;
    }
    if let Err(e) = validation::workflow_name(&builder.workflow.name) {
        notify(state, cmds, &e, Severity::Error);
        return;
    }
    let base = builder.workflow.clone();
    match builder.graph.to_workflow(&base) {
        Ok(workflow) => {
            builder.saving = true;
            match workflow.id.clone() {
                Some(id) => cmds.push(Command::UpdateWorkflow { id, workflow }),
                None => cmds.push(Command::CreateWorkflow(workflow)),
            }
            cmds.push(Command::Render(Region::Content));
        }
        Err(e) => notify_error(state, cmds, "Cannot save workflow", &e.to_string()),
    }
}

/// Form values become string config entries; blank fields are left out.
fn form_to_config(values: &FormData) -> NodeConfig {
    values
        .iter()
        .map(|(k, v)| (k, v.trim()))
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.clone(), Value::String(v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::graph::{config_keys, NodeKind};
    use crate::models::Workflow;
    use crate::notifications::ManualClock;
    use crate::update::update;
    use std::rc::Rc;

    fn builder_state() -> (AppState, ManualClock) {
        let clock = ManualClock::new(1_000);
        let mut state = AppState::with_clock(Rc::new(clock.clone()));
        update(&mut state, Message::OpenWorkflowBuilder(None));
        (state, clock)
    }

    fn add(state: &mut AppState, clock: &ManualClock, kind: NodeKind) -> String {
        clock.advance(1);
        update(state, Message::AddNode(kind));
        state
            .workflows
            .builder
            .as_ref()
            .and_then(|b| b.graph.selected_id().map(str::to_string))
            .expect("new node selected")
    }

    fn connect(state: &mut AppState, from: &str, to: &str) {
        update(state, Message::OutputHandleDown(from.into()));
        update(state, Message::InputHandleUp(to.into()));
        update(state, Message::CanvasPointerUp);
    }

    fn builder(state: &AppState) -> &WorkflowBuilder {
        state.workflows.builder.as_ref().expect("builder open")
    }

    #[test]
    fn pointer_gestures_build_the_graph() {
        let (mut state, clock) = builder_state();
        let start = add(&mut state, &clock, NodeKind::Start);
        let agent = add(&mut state, &clock, NodeKind::Agent);
        connect(&mut state, &start, &agent);
        assert!(builder(&state).graph.has_connection(&start, &agent));

        // Releasing over empty canvas drops the pending connection.
        update(&mut state, Message::OutputHandleDown(agent.clone()));
        update(&mut state, Message::CanvasPointerUp);
        assert!(builder(&state).graph.pending_from().is_none());
    }

    #[test]
    fn dragging_repaints_only_touching_lines() {
        let (mut state, clock) = builder_state();
        let a = add(&mut state, &clock, NodeKind::Start);
        let b = add(&mut state, &clock, NodeKind::Agent);
        let c = add(&mut state, &clock, NodeKind::End);
        connect(&mut state, &a, &b);

        update(
            &mut state,
            Message::NodePointerDown {
                node_id: c.clone(),
                x: 110.0,
                y: 110.0,
            },
        );
        let cmds = update(&mut state, Message::CanvasPointerMove { x: 410.0, y: 210.0 });
        assert!(cmds.iter().any(|cmd| matches!(
            cmd,
            Command::Render(Region::CanvasDrag { node_id, connections }) if *node_id == c && connections.is_empty()
        )));

        update(&mut state, Message::CanvasPointerLeave);
        update(
            &mut state,
            Message::NodePointerDown {
                node_id: b.clone(),
                x: 100.0,
                y: 100.0,
            },
        );
        let cmds = update(&mut state, Message::CanvasPointerMove { x: 150.0, y: 300.0 });
        assert!(cmds.iter().any(|cmd| matches!(
            cmd,
            Command::Render(Region::CanvasDrag { connections, .. }) if connections.len() == 1
        )));
        assert_eq!(
            builder(&state).graph.node(&b).unwrap().position,
            Point::new(150.0, 300.0)
        );

        update(&mut state, Message::CanvasPointerUp);
        assert!(update(&mut state, Message::CanvasPointerMove { x: 0.0, y: 0.0 }).is_empty());
    }

    #[test]
    fn properties_form_updates_node_config() {
        let (mut state, clock) = builder_state();
        let agent = add(&mut state, &clock, NodeKind::Agent);
        let mut values = FormData::new();
        values.insert(config_keys::AGENT_ID.into(), "a-7".into());
        values.insert(config_keys::DESCRIPTION.into(), "  ".into());
        update(
            &mut state,
            Message::SubmitNodeProperties {
                node_id: agent.clone(),
                values,
            },
        );
        let node = builder(&state).graph.node(&agent).unwrap();
        assert_eq!(node.title(), "Agent: a-7");
        assert!(!node.config.contains_key(config_keys::DESCRIPTION));
    }

    #[test]
    fn first_save_creates_then_updates() {
        let (mut state, clock) = builder_state();
        update(&mut state, Message::SetWorkflowName("Pipeline".into()));
        let s = add(&mut state, &clock, NodeKind::Start);
        let e = add(&mut state, &clock, NodeKind::End);
        connect(&mut state, &s, &e);

        let cmds = update(&mut state, Message::SaveWorkflow);
        let created = cmds
            .iter()
            .find_map(|c| match c {
                Command::CreateWorkflow(w) => Some(w.clone()),
                _ => None,
            })
            .expect("create");
        assert_eq!(created.name, "Pipeline");
        assert!(builder(&state).saving);

        // A second click while saving does nothing.
        assert!(update(&mut state, Message::SaveWorkflow).is_empty());

        update(
            &mut state,
            Message::WorkflowSaved(Workflow {
                id: Some("wf-1".into()),
                ..created
            }),
        );
        assert!(!builder(&state).saving);
        assert_eq!(state.workflows.list.len(), 1);

        let cmds = update(&mut state, Message::SaveWorkflow);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, Command::UpdateWorkflow { id, .. } if id == "wf-1")));
        assert!(!cmds.iter().any(|c| matches!(c, Command::CreateWorkflow(_))));
    }

    #[test]
    fn cyclic_graph_is_not_saved() {
        let (mut state, clock) = builder_state();
        update(&mut state, Message::SetWorkflowName("Loop".into()));
        let a = add(&mut state, &clock, NodeKind::Action);
        let b = add(&mut state, &clock, NodeKind::Condition);
        connect(&mut state, &a, &b);
        connect(&mut state, &b, &a);

        let cmds = update(&mut state, Message::SaveWorkflow);
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, Command::CreateWorkflow(_) | Command::UpdateWorkflow { .. })));
        assert!(state.notifications.active()[0].message.contains("cycle"));
        assert!(!builder(&state).saving);
    }

    #[test]
    fn blank_name_is_rejected() {
        let (mut state, _) = builder_state();
        update(&mut state, Message::SetWorkflowName(String::new()));
        let cmds = update(&mut state, Message::SaveWorkflow);
        assert!(!cmds.iter().any(|c| matches!(c, Command::CreateWorkflow(_))));
        assert_eq!(state.notifications.active()[0].severity, Severity::Error);
    }

    #[test]
    fn autosave_only_when_dirty_and_enabled() {
        let (mut state, clock) = builder_state();
        assert!(update(&mut state, Message::AutosaveTick).is_empty());

        add(&mut state, &clock, NodeKind::Start);
        let cmds = update(&mut state, Message::AutosaveTick);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, Command::PersistWorkflowDraft(w) if w.nodes.len() == 1)));

        state.settings.auto_save = false;
        assert!(update(&mut state, Message::AutosaveTick).is_empty());
    }

    #[test]
    fn draft_restores_into_fresh_builder_only() {
        let (mut state, clock) = builder_state();
        let mut draft = Workflow {
            name: "Draft".into(),
            ..Default::default()
        };
        draft.nodes.push(crate::models::WorkflowNodeRecord {
            id: "node-1".into(),
            kind: "start".into(),
            x: 10.0,
            y: 20.0,
            config: Default::default(),
        });
        update(&mut state, Message::WorkflowDraftRestored(draft.clone()));
        assert_eq!(builder(&state).workflow.name, "Draft");
        assert_eq!(builder(&state).graph.node_count(), 1);

        add(&mut state, &clock, NodeKind::End);
        update(&mut state, Message::WorkflowDraftRestored(draft));
        assert_eq!(builder(&state).graph.node_count(), 2);
    }

    #[test]
    fn execution_reports_progress() {
        let mut state = AppState::new();
        update(&mut state, Message::ExecuteWorkflow("wf-1".into()));
        let progress = state.notifications.active()[0].progress;
        assert_eq!(progress, Some(0.0));

        // Ignored while running.
        assert!(update(&mut state, Message::ExecuteWorkflow("wf-2".into())).is_empty());

        let cmds = update(
            &mut state,
            Message::WorkflowExecuted {
                id: "wf-1".into(),
                result: Ok(Value::Null),
            },
        );
        assert_eq!(state.notifications.active()[0].progress, Some(100.0));
        assert!(state.workflows.executing.is_none());
        assert!(cmds
            .iter()
            .any(|c| matches!(c, Command::Publish(AppEvent::WorkflowExecuted { .. }))));
    }

    #[test]
    fn execution_is_silent_with_notifications_off() {
        let mut state = AppState::new();
        state.settings.notifications = false;
        let cmds = update(&mut state, Message::ExecuteWorkflow("wf-1".into()));
        assert!(cmds.iter().any(|c| matches!(c, Command::ExecuteWorkflow { .. })));
        assert!(state.notifications.active().is_empty());
        assert_eq!(state.workflows.executing, Some(("wf-1".to_string(), None)));

        update(
            &mut state,
            Message::WorkflowExecuted {
                id: "wf-1".into(),
                result: Ok(Value::Null),
            },
        );
        assert!(state.notifications.active().is_empty());
        assert!(state.workflows.executing.is_none());
    }
}
