//! Node, edge and snapshot types of the flowchart.
//!
//! The JSON shape matches what the flowchart front-end renders:
//! `{"nodes": [{id, type, text, position}], "connections": [{source, target, type}]}`.

use serde::{Deserialize, Serialize};

use gateway::StepType;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Layout hint for the renderer. Carries no meaning for the model itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// The graph's materialization of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// `node_<n>`; the only identity key.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: StepType,
    pub text: String,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Arrow,
}

/// Directed "happens-before" link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn arrow(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Arrow,
        }
    }

    /// True if either end of the edge is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

// ---------------------------------------------------------------------------
// FlowChartSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of a flowchart, for transport and rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowChartSnapshot {
    pub nodes: Vec<Node>,
    pub connections: Vec<Edge>,
}
