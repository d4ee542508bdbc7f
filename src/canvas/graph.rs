//! Typed workflow graph behind the builder canvas.
//!
//! Nodes are keyed by id; connections are stored as an adjacency list
//! (`from -> [to]`) and identified by the deterministic id
//! `conn-{from}-{to}`. All pointer interaction (drag, pending connection,
//! selection) is tracked here so the DOM layer only has to mirror it.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::geometry::{LineGeometry, Point, Rect};
use crate::constants::{DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH, DEFAULT_NODE_X, DEFAULT_NODE_Y};
use crate::models::{Workflow, WorkflowConnectionRecord, WorkflowNodeRecord, WorkflowStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Agent,
    Condition,
    Action,
    End,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Start,
        NodeKind::Agent,
        NodeKind::Condition,
        NodeKind::Action,
        NodeKind::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Agent => "agent",
            NodeKind::Condition => "condition",
            NodeKind::Action => "action",
            NodeKind::End => "end",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        NodeKind::ALL.into_iter().find(|k| k.as_str() == value)
    }

    pub fn has_input(&self) -> bool {
        *self != NodeKind::Start
    }

    pub fn has_output(&self) -> bool {
        *self != NodeKind::End
    }
}

/// Config keys written by the properties form.
pub mod config_keys {
    pub const AGENT_ID: &str = "agentId";
    pub const DESCRIPTION: &str = "description";
    pub const CONDITION: &str = "condition";
    pub const ACTION: &str = "action";
    pub const ACTION_TYPE: &str = "actionType";
}

pub type NodeConfig = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub config: NodeConfig,
}

impl CanvasNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Point) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
            config: NodeConfig::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn title(&self) -> String {
        match self.kind {
            NodeKind::Start => "Start".to_string(),
            NodeKind::Agent => match self.config_str(config_keys::AGENT_ID) {
                Some(agent) => format!("Agent: {}", agent),
                None => "Agent".to_string(),
            },
            NodeKind::Condition => "Condition".to_string(),
            NodeKind::Action => "Action".to_string(),
            NodeKind::End => "End".to_string(),
        }
    }

    pub fn description(&self) -> String {
        let text = match self.kind {
            NodeKind::Start => "Workflow starting point",
            NodeKind::Agent => self
                .config_str(config_keys::DESCRIPTION)
                .unwrap_or("AI agent task"),
            NodeKind::Condition => self
                .config_str(config_keys::CONDITION)
                .unwrap_or("Decision point"),
            NodeKind::Action => self
                .config_str(config_keys::ACTION)
                .or_else(|| self.config_str(config_keys::ACTION_TYPE))
                .unwrap_or("Custom action"),
            NodeKind::End => "Workflow completion",
        };
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub id: String,
    pub from: String,
    pub to: String,
}

pub fn connection_id(from: &str, to: &str) -> String {
    format!("conn-{}-{}", from, to)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(String),
    #[error("node {0} cannot connect to itself")]
    SelfConnection(String),
    #[error("connection {0} already exists")]
    DuplicateConnection(String),
    #[error("node {0} has no output handle")]
    NoOutput(String),
    #[error("node {0} has no input handle")]
    NoInput(String),
    #[error("no connection is in progress")]
    NoPendingConnection,
    #[error("workflow contains a cycle through {}", .0.join(", "))]
    Cycle(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowGraph {
    nodes: BTreeMap<String, CanvasNode>,
    adjacency: BTreeMap<String, Vec<String>>,
    selected: Option<String>,
    /// Node being dragged and the pointer offset inside it.
    dragging: Option<(String, Point)>,
    pending_from: Option<String>,
    id_seq: u64,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------- Queries ----------------

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CanvasNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.adjacency.iter().flat_map(|(from, tos)| {
            tos.iter().map(move |to| Connection {
                id: connection_id(from, to),
                from: from.clone(),
                to: to.clone(),
            })
        })
    }

    pub fn connection_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn has_connection(&self, from: &str, to: &str) -> bool {
        self.adjacency
            .get(from)
            .map_or(false, |tos| tos.iter().any(|t| t == to))
    }

    /// Every connection with `node_id` at either end.
    pub fn connections_touching(&self, node_id: &str) -> Vec<Connection> {
        self.connections()
            .filter(|c| c.from == node_id || c.to == node_id)
            .collect()
    }

    pub fn selected(&self) -> Option<&CanvasNode> {
        self.selected.as_deref().and_then(|id| self.nodes.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn dragging_id(&self) -> Option<&str> {
        self.dragging.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn pending_from(&self) -> Option<&str> {
        self.pending_from.as_deref()
    }

    /// Line geometry for a connection whose endpoints both exist.
    pub fn geometry(&self, connection: &Connection) -> Option<LineGeometry> {
        let from = self.nodes.get(&connection.from)?;
        let to = self.nodes.get(&connection.to)?;
        Some(LineGeometry::between(&from.rect(), &to.rect()))
    }

    // ---------------- Editing ----------------

    /// Add a node at the default position and select it. Ids are derived
    /// from `now_ms`, with a suffix if two nodes land on the same millisecond.
    pub fn add_node(&mut self, kind: NodeKind, now_ms: u64) -> String {
        let mut id = format!("node-{}", now_ms);
        while self.nodes.contains_key(&id) {
            self.id_seq += 1;
            id = format!("node-{}-{}", now_ms, self.id_seq);
        }
        let node = CanvasNode::new(id.clone(), kind, Point::new(DEFAULT_NODE_X, DEFAULT_NODE_Y));
        self.nodes.insert(id.clone(), node);
        self.select(&id);
        id
    }

    /// Insert a fully built node (used when loading a saved workflow).
    pub fn insert_node(&mut self, node: CanvasNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn set_node_size(&mut self, id: &str, width: f64, height: f64) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.width = width;
            node.height = height;
        }
    }

    pub fn connect(&mut self, from: &str, to: &str) -> Result<String, GraphError> {
        let from_node = self
            .nodes
            .get(from)
            .ok_or_else(|| GraphError::UnknownNode(from.to_string()))?;
        let to_node = self
            .nodes
            .get(to)
            .ok_or_else(|| GraphError::UnknownNode(to.to_string()))?;
        if from == to {
            return Err(GraphError::SelfConnection(from.to_string()));
        }
        if !from_node.kind.has_output() {
            return Err(GraphError::NoOutput(from.to_string()));
        }
        if !to_node.kind.has_input() {
            return Err(GraphError::NoInput(to.to_string()));
        }
        let id = connection_id(from, to);
        if self.has_connection(from, to) {
            return Err(GraphError::DuplicateConnection(id));
        }
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        Ok(id)
    }

    /// Add a connection without checks, as found in stored data. Dangling
    /// entries are pruned by [`WorkflowGraph::validate`].
    pub fn insert_raw_connection(&mut self, from: &str, to: &str) {
        let tos = self.adjacency.entry(from.to_string()).or_default();
        if !tos.iter().any(|t| t == to) {
            tos.push(to.to_string());
        }
    }

    /// Select `id`, replacing any previous selection. Unknown ids clear the
    /// selection.
    pub fn select(&mut self, id: &str) -> Option<&CanvasNode> {
        self.selected = self.nodes.contains_key(id).then(|| id.to_string());
        self.selected()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Replace a node's config with the submitted form values.
    pub fn update_config(&mut self, id: &str, config: NodeConfig) -> Result<&CanvasNode, GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.config = config;
        Ok(node)
    }

    /// Remove a node and every connection touching it. Returns the ids of
    /// the removed connections.
    pub fn remove_node(&mut self, id: &str) -> Result<Vec<String>, GraphError> {
        if self.nodes.remove(id).is_none() {
            return Err(GraphError::UnknownNode(id.to_string()));
        }
        let removed: Vec<String> = self
            .connections_touching(id)
            .into_iter()
            .map(|c| c.id)
            .collect();
        self.adjacency.remove(id);
        for tos in self.adjacency.values_mut() {
            tos.retain(|t| t != id);
        }
        self.adjacency.retain(|_, tos| !tos.is_empty());

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.dragging_id() == Some(id) {
            self.dragging = None;
        }
        if self.pending_from.as_deref() == Some(id) {
            self.pending_from = None;
        }
        Ok(removed)
    }

    // ---------------- Pointer interaction ----------------

    /// Pointer-down on a node body.
    pub fn begin_drag(&mut self, id: &str, pointer: Point) -> bool {
        match self.nodes.get(id) {
            Some(node) => {
                self.dragging = Some((id.to_string(), pointer - node.position));
                true
            }
            None => false,
        }
    }

    /// Pointer-move while dragging. Moves the node and returns the
    /// connections whose geometry changed (exactly those touching it).
    pub fn drag_to(&mut self, pointer: Point) -> Vec<Connection> {
        let Some((id, offset)) = self.dragging.clone() else {
            return Vec::new();
        };
        match self.nodes.get_mut(&id) {
            Some(node) => node.position = pointer - offset,
            None => {
                self.dragging = None;
                return Vec::new();
            }
        }
        self.connections_touching(&id)
    }

    /// Pointer-up or pointer leaving the canvas.
    pub fn end_drag(&mut self) -> Option<String> {
        self.dragging.take().map(|(id, _)| id)
    }

    /// Pointer-down on an output handle.
    pub fn begin_connection(&mut self, from: &str) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get(from)
            .ok_or_else(|| GraphError::UnknownNode(from.to_string()))?;
        if !node.kind.has_output() {
            return Err(GraphError::NoOutput(from.to_string()));
        }
        self.pending_from = Some(from.to_string());
        Ok(())
    }

    /// Pointer-up on an input handle. The pending connection is consumed
    /// whether or not the connection is accepted.
    pub fn complete_connection(&mut self, to: &str) -> Result<String, GraphError> {
        let from = self
            .pending_from
            .take()
            .ok_or(GraphError::NoPendingConnection)?;
        self.connect(&from, to)
    }

    pub fn cancel_connection(&mut self) {
        self.pending_from = None;
    }

    // ---------------- Validation / persistence ----------------

    /// Drop connections whose endpoints no longer exist. Returns their ids.
    pub fn prune_dangling(&mut self) -> Vec<String> {
        let dangling: Vec<Connection> = self
            .connections()
            .filter(|c| !self.nodes.contains_key(&c.from) || !self.nodes.contains_key(&c.to))
            .collect();
        for c in &dangling {
            if let Some(tos) = self.adjacency.get_mut(&c.from) {
                tos.retain(|t| t != &c.to);
            }
        }
        self.adjacency.retain(|_, tos| !tos.is_empty());
        dangling.into_iter().map(|c| c.id).collect()
    }

    /// Kahn's algorithm. Ties are broken by node id so the order is stable.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let mut in_degree: HashMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();
        for c in self.connections() {
            if let Some(d) = in_degree.get_mut(c.to.as_str()) {
                *d += 1;
            }
        }

        let mut queue: VecDeque<&str> = self
            .nodes
            .keys()
            .map(String::as_str)
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            if let Some(tos) = self.adjacency.get(id) {
                let mut ready = Vec::new();
                for to in tos {
                    if let Some(d) = in_degree.get_mut(to.as_str()) {
                        *d -= 1;
                        if *d == 0 {
                            ready.push(to.as_str());
                        }
                    }
                }
                ready.sort_unstable();
                queue.extend(ready);
            }
        }

        if order.len() != self.nodes.len() {
            let placed: HashSet<&str> = order.iter().map(String::as_str).collect();
            let stuck = self
                .nodes
                .keys()
                .filter(|id| !placed.contains(id.as_str()))
                .cloned()
                .collect();
            return Err(GraphError::Cycle(stuck));
        }
        Ok(order)
    }

    /// Prune dangling connections, then reject cycles. Returns the pruned ids.
    pub fn validate(&mut self) -> Result<Vec<String>, GraphError> {
        let pruned = self.prune_dangling();
        if !pruned.is_empty() {
            log::warn!("pruned {} dangling connection(s)", pruned.len());
        }
        self.topological_order()?;
        Ok(pruned)
    }

    /// Validate and serialize into `base`, keeping its id, name, description,
    /// config and status.
    pub fn to_workflow(&mut self, base: &Workflow) -> Result<Workflow, GraphError> {
        self.validate()?;
        let order = self.topological_order()?;
        let steps = order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| !matches!(n.kind, NodeKind::Start | NodeKind::End))
            .map(|n| self.step_for(n))
            .collect();

        Ok(Workflow {
            steps,
            ..self.draft(base)
        })
    }

    /// Layout-only snapshot for autosave: nodes and connections as they are,
    /// no validation and no steps.
    pub fn draft(&self, base: &Workflow) -> Workflow {
        let nodes = self
            .nodes
            .values()
            .map(|n| WorkflowNodeRecord {
                id: n.id.clone(),
                kind: n.kind.as_str().to_string(),
                x: n.position.x,
                y: n.position.y,
                config: n.config.clone(),
            })
            .collect();
        let connections = self
            .connections()
            .map(|c| WorkflowConnectionRecord {
                id: c.id,
                from: c.from,
                to: c.to,
            })
            .collect();
        Workflow {
            nodes,
            connections,
            steps: Vec::new(),
            ..base.clone()
        }
    }

    fn step_for(&self, node: &CanvasNode) -> WorkflowStep {
        let action = match node.kind {
            NodeKind::Agent => "agent_task".to_string(),
            NodeKind::Condition => "condition".to_string(),
            _ => node
                .config_str(config_keys::ACTION_TYPE)
                .unwrap_or("custom")
                .to_string(),
        };
        let next: Vec<Value> = self
            .adjacency
            .get(&node.id)
            .map(|tos| tos.iter().cloned().map(Value::String).collect())
            .unwrap_or_default();
        let mut outputs = Map::new();
        outputs.insert("next".to_string(), Value::Array(next));

        WorkflowStep {
            id: node.id.clone(),
            name: node.title(),
            agent_id: node.config_str(config_keys::AGENT_ID).map(str::to_string),
            action,
            inputs: Value::Object(node.config.clone()),
            outputs: Value::Object(outputs),
        }
    }

    /// Rebuild the graph from a saved workflow. Nodes of unknown kind are
    /// skipped; connections are loaded as-is and pruned on validation.
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let mut graph = Self::new();
        for record in &workflow.nodes {
            match NodeKind::parse(&record.kind) {
                Some(kind) => {
                    let mut node =
                        CanvasNode::new(record.id.clone(), kind, Point::new(record.x, record.y));
                    node.config = record.config.clone();
                    graph.insert_node(node);
                }
                None => log::warn!("skipping node {} of unknown kind {}", record.id, record.kind),
            }
        }
        for c in &workflow.connections {
            graph.insert_raw_connection(&c.from, &c.to);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chain() -> (WorkflowGraph, String, String, String) {
        let mut g = WorkflowGraph::new();
        let s = g.add_node(NodeKind::Start, 1);
        let a = g.add_node(NodeKind::Agent, 2);
        let e = g.add_node(NodeKind::End, 3);
        g.connect(&s, &a).unwrap();
        g.connect(&a, &e).unwrap();
        (g, s, a, e)
    }

    #[test]
    fn add_node_uses_defaults_and_selects() {
        let mut g = WorkflowGraph::new();
        let id = g.add_node(NodeKind::Condition, 1_700_000_000_000);
        assert_eq!(id, "node-1700000000000");
        let node = g.node(&id).unwrap();
        assert_eq!(node.position, Point::new(100.0, 100.0));
        assert!(node.config.is_empty());
        assert_eq!(g.selected_id(), Some(id.as_str()));
    }

    #[test]
    fn same_millisecond_ids_stay_unique() {
        let mut g = WorkflowGraph::new();
        let a = g.add_node(NodeKind::Agent, 5);
        let b = g.add_node(NodeKind::Agent, 5);
        assert_ne!(a, b);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.selected_id(), Some(b.as_str()));
    }

    #[test]
    fn connect_rejects_bad_edges() {
        let (mut g, s, a, e) = chain();
        assert_eq!(g.connect(&a, &a), Err(GraphError::SelfConnection(a.clone())));
        assert_eq!(
            g.connect(&s, &a),
            Err(GraphError::DuplicateConnection(connection_id(&s, &a)))
        );
        assert_eq!(g.connect(&a, "ghost"), Err(GraphError::UnknownNode("ghost".into())));
        assert_eq!(g.connect(&e, &a), Err(GraphError::NoOutput(e.clone())));
        assert_eq!(g.connect(&a, &s), Err(GraphError::NoInput(s.clone())));
        assert_eq!(g.connection_count(), 2);
    }

    #[test]
    fn fan_out_and_fan_in_allowed() {
        let mut g = WorkflowGraph::new();
        let s = g.add_node(NodeKind::Start, 1);
        let a = g.add_node(NodeKind::Agent, 2);
        let b = g.add_node(NodeKind::Action, 3);
        let e = g.add_node(NodeKind::End, 4);
        g.connect(&s, &a).unwrap();
        g.connect(&s, &b).unwrap();
        g.connect(&a, &e).unwrap();
        g.connect(&b, &e).unwrap();
        assert_eq!(g.connection_count(), 4);
    }

    #[test]
    fn pending_connection_flow() {
        let (mut g, _, a, _) = chain();
        let c = g.add_node(NodeKind::Action, 9);
        g.begin_connection(&a).unwrap();
        assert_eq!(g.pending_from(), Some(a.as_str()));
        assert_eq!(g.complete_connection(&c).unwrap(), connection_id(&a, &c));
        assert_eq!(g.pending_from(), None);
        assert_eq!(g.complete_connection(&c), Err(GraphError::NoPendingConnection));
    }

    #[test]
    fn select_replaces_previous() {
        let (mut g, s, a, _) = chain();
        g.select(&s);
        assert_eq!(g.selected_id(), Some(s.as_str()));
        g.select(&a);
        assert_eq!(g.selected_id(), Some(a.as_str()));
        g.select("nope");
        assert!(g.selected().is_none());
    }

    #[test]
    fn config_update_refreshes_title_and_description() {
        let (mut g, _, a, _) = chain();
        assert_eq!(g.node(&a).unwrap().title(), "Agent");
        let mut cfg = NodeConfig::new();
        cfg.insert(config_keys::AGENT_ID.into(), Value::String("a-42".into()));
        cfg.insert(config_keys::DESCRIPTION.into(), Value::String("Summarize".into()));
        let node = g.update_config(&a, cfg).unwrap();
        assert_eq!(node.title(), "Agent: a-42");
        assert_eq!(node.description(), "Summarize");
    }

    #[test]
    fn remove_prunes_touching_connections() {
        let (mut g, s, a, e) = chain();
        g.select(&a);
        let removed = g.remove_node(&a).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(removed.contains(&connection_id(&s, &a)));
        assert!(removed.contains(&connection_id(&a, &e)));
        assert_eq!(g.connection_count(), 0);
        assert!(g.selected().is_none());
    }

    #[test]
    fn validate_prunes_dangling_and_rejects_cycles() {
        let (mut g, _, a, _) = chain();
        g.insert_raw_connection(&a, "deleted-node");
        assert_eq!(g.validate().unwrap(), vec![connection_id(&a, "deleted-node")]);

        let b = g.add_node(NodeKind::Action, 10);
        let c = g.add_node(NodeKind::Condition, 11);
        g.connect(&a, &b).unwrap();
        g.connect(&b, &c).unwrap();
        g.connect(&c, &a).unwrap();
        match g.validate() {
            Err(GraphError::Cycle(nodes)) => {
                assert!(nodes.contains(&a) && nodes.contains(&b) && nodes.contains(&c));
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn to_workflow_orders_steps_topologically() {
        let (mut g, _, a, _) = chain();
        let act = g.add_node(NodeKind::Action, 7);
        let mut cfg = NodeConfig::new();
        cfg.insert(config_keys::ACTION_TYPE.into(), Value::String("log".into()));
        g.update_config(&act, cfg).unwrap();
        g.connect(&a, &act).unwrap();

        let base = Workflow {
            name: "Flow".into(),
            ..Default::default()
        };
        let wf = g.to_workflow(&base).unwrap();
        assert_eq!(wf.name, "Flow");
        assert!(wf.id.is_none());
        assert_eq!(wf.nodes.len(), 4);
        assert_eq!(wf.connections.len(), 3);
        let step_ids: Vec<&str> = wf.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(step_ids, vec![a.as_str(), act.as_str()]);
        assert_eq!(wf.steps[1].action, "log");
        assert_eq!(wf.steps[0].action, "agent_task");
    }

    #[test]
    fn from_workflow_restores_layout() {
        let (mut g, s, a, _) = chain();
        g.begin_drag(&a, Point::new(110.0, 110.0));
        g.drag_to(Point::new(310.0, 160.0));
        g.end_drag();
        let wf = g.to_workflow(&Workflow::default()).unwrap();

        let restored = WorkflowGraph::from_workflow(&wf);
        assert_eq!(restored.node(&a).unwrap().position, Point::new(300.0, 150.0));
        assert!(restored.has_connection(&s, &a));
        assert_eq!(restored.connection_count(), 2);
    }

    #[test]
    fn draft_keeps_cycles_without_steps() {
        let (mut g, _, a, _) = chain();
        let b = g.add_node(NodeKind::Action, 10);
        g.connect(&a, &b).unwrap();
        g.connect(&b, &a).unwrap();
        let draft = g.draft(&Workflow::default());
        assert_eq!(draft.nodes.len(), 4);
        assert_eq!(draft.connections.len(), 4);
        assert!(draft.steps.is_empty());
        assert!(g.to_workflow(&Workflow::default()).is_err());
    }

    #[test]
    fn drag_moves_by_pointer_offset() {
        let (mut g, s, a, e) = chain();
        assert!(g.begin_drag(&a, Point::new(120.0, 130.0)));
        let touched = g.drag_to(Point::new(220.0, 330.0));
        assert_eq!(g.node(&a).unwrap().position, Point::new(200.0, 300.0));
        let ids: HashSet<String> = touched.into_iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            HashSet::from([connection_id(&s, &a), connection_id(&a, &e)])
        );
        assert_eq!(g.end_drag(), Some(a));
        assert!(g.drag_to(Point::new(0.0, 0.0)).is_empty());
    }

    proptest! {
        #[test]
        fn drag_updates_exactly_touching_connections(
            positions in proptest::collection::vec((0.0f64..800.0, 0.0f64..600.0), 2..8),
            edges in proptest::collection::vec((0usize..8, 0usize..8), 0..20),
            target in 0usize..8,
            pointer in (0.0f64..800.0, 0.0f64..600.0),
        ) {
            let mut g = WorkflowGraph::new();
            let ids: Vec<String> = positions
                .iter()
                .enumerate()
                .map(|(i, (x, y))| {
                    let id = g.add_node(NodeKind::Action, i as u64);
                    g.nodes.get_mut(&id).unwrap().position = Point::new(*x, *y);
                    id
                })
                .collect();
            for (f, t) in edges {
                let _ = g.connect(&ids[f % ids.len()], &ids[t % ids.len()]);
            }
            let moved = &ids[target % ids.len()];

            let before: HashMap<String, LineGeometry> = g
                .connections()
                .map(|c| (c.id.clone(), g.geometry(&c).unwrap()))
                .collect();

            g.begin_drag(moved, g.node(moved).unwrap().position);
            let touched: HashSet<String> = g
                .drag_to(Point::new(pointer.0, pointer.1))
                .into_iter()
                .map(|c| c.id)
                .collect();

            for c in g.connections() {
                let touches = c.from == *moved || c.to == *moved;
                prop_assert_eq!(touched.contains(&c.id), touches);
                if !touches {
                    prop_assert_eq!(g.geometry(&c).unwrap(), before[&c.id]);
                }
            }
        }
    }
}
