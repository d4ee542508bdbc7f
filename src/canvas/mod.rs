pub mod geometry;
pub mod graph;
pub mod view;

pub use geometry::{LineGeometry, Point, Rect};
pub use graph::{CanvasNode, Connection, GraphError, NodeKind, WorkflowGraph};
