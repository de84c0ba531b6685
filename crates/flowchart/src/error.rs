//! Flowchart-level error types.

use thiserror::Error;

/// Errors produced by snapshot validation and by the editing operations.
///
/// Translation failures never show up here: the editor degrades them to
/// placeholder results instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowChartError {
    // ------ Request errors ------

    /// A required field is missing or blank. Raised before any gateway call.
    #[error("{0}")]
    Validation(String),

    /// The referenced node does not exist.
    #[error("step '{0}' not found")]
    NotFound(String),

    // ------ Snapshot errors ------

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// A connection references a node ID that isn't in the flowchart.
    #[error("connection references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },
}

impl FlowChartError {
    pub fn missing_field(field: &str) -> Self {
        FlowChartError::Validation(format!("{field} is required"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FlowChartError::NotFound(_))
    }
}
