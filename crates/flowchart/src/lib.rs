//! `flowchart` crate — the step/graph model, snapshot validation, and the
//! editing orchestrator.

pub mod editor;
pub mod error;
pub mod graph;
pub mod models;
pub mod validate;

pub use editor::{EditorConfig, FlowEditor, Generated, StepAdded, Synced};
pub use error::FlowChartError;
pub use graph::{bracket_steps, FlowChart};
pub use models::{Edge, EdgeKind, FlowChartSnapshot, Node, Position};
pub use validate::{validate_flowchart, ValidationReport};

#[cfg(test)]
mod editor_tests;
