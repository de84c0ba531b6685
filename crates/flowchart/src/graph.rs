//! `FlowChart` — the authoritative node/edge model and its conversions to and
//! from an ordered step list.
//!
//! Guarantees:
//! 1. After [`FlowChart::from_steps`] on non-empty input the first node is
//!    `start` and the last is `end`; sentinels are only added when missing.
//! 2. Every edge points at nodes that are currently present.
//! 3. Node IDs are unique. New IDs are `node_<max suffix + 1>`, found by
//!    scanning the current nodes on every call rather than keeping a counter.
//!
//! Nothing here returns an error: malformed input falls back to defaults.

use std::collections::HashSet;

use tracing::{debug, warn};

use gateway::{Step, StepType};

use crate::models::{Edge, FlowChartSnapshot, Node, Position};

/// Horizontal position of every node.
pub const LAYOUT_X: f64 = 100.0;
/// Vertical position of the first node, and of nodes added without an anchor.
pub const LAYOUT_BASELINE_Y: f64 = 100.0;
/// Vertical distance between consecutive nodes.
pub const LAYOUT_STEP_Y: f64 = 100.0;

const NODE_ID_PREFIX: &str = "node_";

/// `node_<suffix>`.
pub fn node_id(suffix: u64) -> String {
    format!("{NODE_ID_PREFIX}{suffix}")
}

/// Numeric suffix of a node ID, or `None` for IDs that don't carry one.
pub fn node_suffix(id: &str) -> Option<u64> {
    id.strip_prefix(NODE_ID_PREFIX)
        .unwrap_or(id)
        .trim()
        .parse()
        .ok()
}

/// Wrap `steps` in `start`/`end` sentinels where they are missing.
///
/// Only position 0 and the last position are checked, both against the input
/// as given: a `start` step elsewhere does not count. The synthetic `end` is
/// numbered one past the length of the (possibly prepended) list. Empty input
/// stays empty.
pub fn bracket_steps(steps: &[Step]) -> Vec<Step> {
    let mut bracketed = Vec::with_capacity(steps.len() + 2);
    let (Some(first), Some(last)) = (steps.first(), steps.last()) else {
        return bracketed;
    };

    if !first.is_start() {
        bracketed.push(Step::new(0, StepType::Start, "Start"));
    }
    bracketed.extend_from_slice(steps);
    if !last.is_end() {
        let end_id = bracketed.len() as u64 + 1;
        bracketed.push(Step::new(end_id, StepType::End, "End"));
    }
    bracketed
}

fn next_node_id(nodes: &[Node]) -> String {
    let used: HashSet<u64> = nodes.iter().filter_map(|node| node_suffix(&node.id)).collect();
    let max = used.iter().copied().max().unwrap_or(0);

    // A suffix at u64::MAX leaves nothing above it; take the lowest free one.
    let next = max
        .checked_add(1)
        .or_else(|| (0..u64::MAX).find(|suffix| !used.contains(suffix)))
        .unwrap_or(max);
    node_id(next)
}

/// In-memory flowchart. Single owner; callers serialize access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowChart {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl FlowChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a chart from a snapshot exactly as given. Run
    /// [`crate::validate_flowchart`] first if the snapshot is untrusted.
    pub fn from_snapshot(snapshot: FlowChartSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes,
            edges: snapshot.connections,
        }
    }

    /// Replace the whole chart with one node per step, chained in order.
    ///
    /// Missing fields fall back to: ID from the 1-based position, type
    /// `process`, text `Step <n>`. A step whose ID is already taken gets the
    /// next free ID instead, so IDs stay unique.
    pub fn from_steps(&mut self, steps: &[Step]) {
        let steps = bracket_steps(steps);
        let mut nodes: Vec<Node> = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let ordinal = index as u64 + 1;

            let mut id = node_id(step.step_id.unwrap_or(ordinal));
            if nodes.iter().any(|node| node.id == id) {
                let fresh = next_node_id(&nodes);
                warn!(duplicate = %id, assigned = %fresh, "duplicate step id, assigning a fresh node id");
                id = fresh;
            }

            nodes.push(Node {
                id,
                node_type: step.step_type.clone().unwrap_or_default(),
                text: step
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Step {ordinal}")),
                position: Position {
                    x: LAYOUT_X,
                    y: LAYOUT_BASELINE_Y + index as f64 * LAYOUT_STEP_Y,
                },
            });
        }

        self.edges = nodes
            .windows(2)
            .map(|pair| Edge::arrow(&pair[0].id, &pair[1].id))
            .collect();
        self.nodes = nodes;

        debug!(nodes = self.nodes.len(), edges = self.edges.len(), "flowchart rebuilt from steps");
    }

    /// Snapshot for transport and rendering.
    pub fn to_dict(&self) -> FlowChartSnapshot {
        FlowChartSnapshot {
            nodes: self.nodes.clone(),
            connections: self.edges.clone(),
        }
    }

    /// Pretty-printed JSON of [`FlowChart::to_dict`].
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_dict())
    }

    /// Overwrite the text of `node_id`, and its type when `new_type` is
    /// non-empty. Returns `false` and changes nothing if the node is absent.
    pub fn update_step(&mut self, node_id: &str, new_text: &str, new_type: Option<&str>) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|node| node.id == node_id) else {
            return false;
        };

        node.text = new_text.to_owned();
        if let Some(kind) = new_type.map(str::trim).filter(|kind| !kind.is_empty()) {
            node.node_type = StepType::from(kind);
        }
        true
    }

    /// Append a new node and return its ID.
    ///
    /// The node always goes to the end of the sequence. `after_id` only
    /// affects layout (`y` one step below the anchor) and adds a single
    /// `after_id -> new` edge; an unknown anchor leaves the node unconnected
    /// at the baseline.
    pub fn add_step(
        &mut self,
        step_type: impl Into<StepType>,
        description: impl Into<String>,
        after_id: Option<&str>,
    ) -> String {
        let id = next_node_id(&self.nodes);

        let anchor = after_id
            .and_then(|after| self.node(after))
            .map(|node| (node.id.clone(), node.position.y));

        let y = anchor
            .as_ref()
            .map_or(LAYOUT_BASELINE_Y, |(_, y)| y + LAYOUT_STEP_Y);

        self.nodes.push(Node {
            id: id.clone(),
            node_type: step_type.into(),
            text: description.into(),
            position: Position { x: LAYOUT_X, y },
        });

        match (anchor, after_id) {
            (Some((anchor, _)), _) => self.edges.push(Edge::arrow(anchor, &id)),
            (None, Some(after)) => debug!(after_id = after, new_id = %id, "anchor not found, node left unconnected"),
            (None, None) => {}
        }

        id
    }

    /// Remove the first node called `node_id` together with every edge that
    /// touches it. Neighbours are not reconnected.
    pub fn remove_step(&mut self, node_id: &str) -> bool {
        let Some(index) = self.nodes.iter().position(|node| node.id == node_id) else {
            return false;
        };

        self.nodes.remove(index);
        self.edges.retain(|edge| !edge.touches(node_id));
        true
    }

    /// Steps for SQL regeneration, sorted by the numeric suffix of each ID.
    ///
    /// An ID without a numeric suffix is numbered one past the steps collected
    /// so far. Not an exact inverse of [`FlowChart::from_steps`].
    pub fn to_steps(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let step_id = node_suffix(&node.id).unwrap_or(steps.len() as u64 + 1);
            steps.push(Step::new(step_id, node.node_type.clone(), node.text.clone()));
        }
        steps.sort_by_key(|step| step.step_id);
        steps
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if the chart is empty or runs from a `start` node to an `end` node.
    pub fn has_sentinels(&self) -> bool {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => first.node_type.is_start() && last.node_type.is_end(),
            _ => true,
        }
    }
}
