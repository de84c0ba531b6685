//! Snapshot validation — run this before loading a flowchart that came from
//! outside the process.
//!
//! Rules enforced:
//! 1. Node IDs must be unique.
//! 2. Every connection must reference existing node IDs (`source` and `target`).
//!
//! Sentinel placement and unconnected nodes are reported, not rejected:
//! adding and removing steps legitimately produce both.

use std::collections::HashSet;

use crate::{FlowChartError, FlowChartSnapshot};

/// What [`validate_flowchart`] found in a structurally valid snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub node_count: usize,
    pub connection_count: usize,
    /// First node is `start` and last is `end` (vacuously true when empty).
    pub sentinels_in_place: bool,
    /// Nodes with no incoming or outgoing connection, in sequence order.
    pub unconnected: Vec<String>,
}

/// Check a snapshot's structural invariants.
///
/// # Errors
/// - [`FlowChartError::DuplicateNodeId`] if two nodes share an ID.
/// - [`FlowChartError::UnknownNodeReference`] if a connection is dangling.
pub fn validate_flowchart(snapshot: &FlowChartSnapshot) -> Result<ValidationReport, FlowChartError> {
    let mut node_ids: HashSet<&str> = HashSet::with_capacity(snapshot.nodes.len());
    for node in &snapshot.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(FlowChartError::DuplicateNodeId(node.id.clone()));
        }
    }

    let mut connected: HashSet<&str> = HashSet::new();
    for edge in &snapshot.connections {
        if !node_ids.contains(edge.source.as_str()) {
            return Err(FlowChartError::UnknownNodeReference {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !node_ids.contains(edge.target.as_str()) {
            return Err(FlowChartError::UnknownNodeReference {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
        connected.insert(edge.source.as_str());
        connected.insert(edge.target.as_str());
    }

    let sentinels_in_place = match (snapshot.nodes.first(), snapshot.nodes.last()) {
        (Some(first), Some(last)) => first.node_type.is_start() && last.node_type.is_end(),
        _ => true,
    };

    let unconnected = snapshot
        .nodes
        .iter()
        .filter(|node| !connected.contains(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();

    Ok(ValidationReport {
        node_count: snapshot.nodes.len(),
        connection_count: snapshot.connections.len(),
        sentinels_in_place,
        unconnected,
    })
}
