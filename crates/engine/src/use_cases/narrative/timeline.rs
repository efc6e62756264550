//! Timeline linearizer - flattens the act graph into one left-to-right
//! main path with numbered side branches.
//!
//! Pure derivation over already-loaded nodes and edges; recomputed by the
//! caller whenever the graph changes. The main path follows taken edges
//! where the session has chosen one, falling back to creation order, so
//! during live play the timeline shows the route actually travelled.

use std::collections::{HashMap, HashSet};

use plotloom_domain::{NodeId, StoryEdge, StoryNode};

/// One slot on the horizontal timeline. Branch entries nest one level
/// deep; a branch's own subtree is not expanded.
#[derive(Debug, Clone)]
pub struct TimelineNode {
    pub node: StoryNode,
    /// 1-based position along the main path. Branches share their
    /// parent's sequence.
    pub sequence: usize,
    /// "1", "2", ... on the main path; "2.1", "2.2", ... for branches
    /// off the second slot.
    pub hierarchical_number: String,
    pub branches: Vec<TimelineNode>,
    /// Label of the edge that leads into this node, shown as "why did we
    /// get here" above the slot.
    pub edge_label: Option<String>,
}

/// Build the timeline starting from the act's root. An empty graph or a
/// missing root yields an empty timeline.
pub fn build_timeline(nodes: &[StoryNode], edges: &[StoryEdge]) -> Vec<TimelineNode> {
    let node_map: HashMap<NodeId, &StoryNode> = nodes.iter().map(|n| (n.id(), n)).collect();
    let mut outgoing: HashMap<NodeId, Vec<&StoryEdge>> = HashMap::new();
    for edge in edges {
        outgoing.entry(edge.from_node_id()).or_default().push(edge);
    }

    let Some(root) = nodes.iter().find(|n| n.is_root()) else {
        return Vec::new();
    };

    let mut timeline = Vec::new();
    let mut processed: HashSet<NodeId> = HashSet::new();
    let mut current_id = Some(root.id());

    while let Some(id) = current_id {
        // Cycle guard: a node already placed on the path ends the walk.
        if !processed.insert(id) {
            break;
        }
        let Some(&node) = node_map.get(&id) else {
            break;
        };

        let sequence = timeline.len() + 1;
        let mut slot = TimelineNode {
            node: node.clone(),
            sequence,
            hierarchical_number: sequence.to_string(),
            branches: Vec::new(),
            edge_label: None,
        };

        // Taken edges first, creation order otherwise (stable sort keeps
        // the original order within each group).
        let mut paths: Vec<&StoryEdge> = outgoing.get(&id).cloned().unwrap_or_default();
        paths.sort_by_key(|e| !e.was_taken());

        current_id = None;
        for (index, edge) in paths.iter().enumerate() {
            if index == 0 {
                // First edge continues the main path.
                current_id = Some(edge.to_node_id());
                continue;
            }
            let Some(&branch_node) = node_map.get(&edge.to_node_id()) else {
                continue;
            };
            slot.branches.push(TimelineNode {
                node: branch_node.clone(),
                sequence,
                hierarchical_number: format!("{sequence}.{index}"),
                branches: Vec::new(),
                edge_label: edge.label().map(String::from),
            });
        }

        timeline.push(slot);
    }

    // Attach each main-path edge's label to the node it leads into.
    for index in 1..timeline.len() {
        let from = timeline[index - 1].node.id();
        let to = timeline[index].node.id();
        timeline[index].edge_label = edges
            .iter()
            .find(|e| e.connects(from, to))
            .and_then(|e| e.label())
            .map(String::from);
    }

    timeline
}
