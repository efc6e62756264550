//! View-state logic shared by the canvas and timeline renderings.
//!
//! No drawing happens here. These helpers answer the questions both
//! views ask: which mode are we in, may these two nodes be connected,
//! which paths can the party choose right now, and how far should the
//! timeline scroll to show the current node.

use serde::{Deserialize, Serialize};

use plotloom_domain::{NodeId, StoryEdge};

use super::query::ActGraphSnapshot;
use super::timeline::TimelineNode;

// Approximate rendered width of one timeline slot, used for auto-scroll.
const TIMELINE_NODE_WIDTH: f64 = 280.0;

/// Preparation is the edit/build mode; Live is the play mode where the
/// GM traverses the graph and structural editing is de-emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Preparation,
    Live,
}

impl SessionMode {
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Preparation => Self::Live,
            Self::Live => Self::Preparation,
        }
    }
}

/// Why a canvas click-to-connect gesture was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectRejection {
    #[error("A node cannot be connected to itself")]
    SelfEdge,
    #[error("These nodes are already connected")]
    DuplicateEdge,
}

/// Guard a canvas connect gesture before the mutation engine is asked to
/// create the edge. Checks against the loaded snapshot only; the storage
/// constraint is the final arbiter.
pub fn guard_connect(
    snapshot: &ActGraphSnapshot,
    from: NodeId,
    to: NodeId,
) -> Result<(), ConnectRejection> {
    if from == to {
        return Err(ConnectRejection::SelfEdge);
    }
    if snapshot.edge_between(from, to).is_some() {
        return Err(ConnectRejection::DuplicateEdge);
    }
    Ok(())
}

/// The edges offered as "choose path" buttons. Only live mode offers
/// choices, and only from the current node.
pub fn choosable_paths<'a>(snapshot: &'a ActGraphSnapshot, mode: SessionMode) -> Vec<&'a StoryEdge> {
    if !mode.is_live() {
        return Vec::new();
    }
    match snapshot.current() {
        Some(current) => snapshot.outgoing(current.id()),
        None => Vec::new(),
    }
}

/// Horizontal scroll offset that brings the current node into view:
/// its main-path index times the approximate slot width. Zero when there
/// is no current node or it sits on a branch rather than the main path.
pub fn timeline_scroll_offset(timeline: &[TimelineNode], current: Option<NodeId>) -> f64 {
    let Some(current) = current else {
        return 0.0;
    };
    timeline
        .iter()
        .position(|slot| slot.node.id() == current)
        .map(|index| index as f64 * TIMELINE_NODE_WIDTH)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::narrative::timeline::build_timeline;
    use chrono::{DateTime, TimeZone, Utc};
    use plotloom_domain::{ActId, StoryNode};
    use std::collections::HashMap;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")
    }

    fn snapshot_with(nodes: Vec<StoryNode>, edges: Vec<StoryEdge>) -> ActGraphSnapshot {
        ActGraphSnapshot {
            act_id: ActId::new(),
            nodes,
            edges,
            links: Vec::new(),
            checks: Vec::new(),
            note_titles: HashMap::new(),
            encounter_titles: HashMap::new(),
            monster_names: HashMap::new(),
        }
    }

    fn node(act_id: ActId, title: &str) -> StoryNode {
        StoryNode::new(act_id, title, t0()).expect("valid node")
    }

    #[test]
    fn mode_toggle_flips_between_preparation_and_live() {
        assert_eq!(SessionMode::default(), SessionMode::Preparation);
        assert_eq!(SessionMode::Preparation.toggled(), SessionMode::Live);
        assert_eq!(SessionMode::Live.toggled(), SessionMode::Preparation);
    }

    #[test]
    fn guard_rejects_self_edges_and_duplicates() {
        let act_id = ActId::new();
        let a = node(act_id, "A");
        let b = node(act_id, "B");
        let existing = StoryEdge::new(a.id(), b.id(), t0());
        let snapshot = snapshot_with(vec![a.clone(), b.clone()], vec![existing]);

        assert_eq!(
            guard_connect(&snapshot, a.id(), a.id()),
            Err(ConnectRejection::SelfEdge)
        );
        assert_eq!(
            guard_connect(&snapshot, a.id(), b.id()),
            Err(ConnectRejection::DuplicateEdge)
        );
        // The reverse direction is a different edge and stays allowed.
        assert_eq!(guard_connect(&snapshot, b.id(), a.id()), Ok(()));
    }

    #[test]
    fn choosable_paths_only_from_current_node_in_live_mode() {
        let act_id = ActId::new();
        let root = node(act_id, "Root").as_root();
        let next = node(act_id, "Next");
        let elsewhere = node(act_id, "Elsewhere");
        let offered = StoryEdge::new(root.id(), next.id(), t0());
        let not_offered = StoryEdge::new(next.id(), elsewhere.id(), t0());
        let snapshot = snapshot_with(
            vec![root.clone(), next, elsewhere],
            vec![offered.clone(), not_offered],
        );

        assert!(choosable_paths(&snapshot, SessionMode::Preparation).is_empty());

        let live: Vec<_> = choosable_paths(&snapshot, SessionMode::Live)
            .iter()
            .map(|e| e.id())
            .collect();
        assert_eq!(live, vec![offered.id()]);
    }

    #[test]
    fn choosable_paths_empty_without_a_current_node() {
        let act_id = ActId::new();
        let snapshot = snapshot_with(vec![node(act_id, "Alone")], Vec::new());
        assert!(choosable_paths(&snapshot, SessionMode::Live).is_empty());
    }

    #[test]
    fn scroll_offset_tracks_main_path_index() {
        let act_id = ActId::new();
        let root = node(act_id, "Root").as_root();
        let second = node(act_id, "Second");
        let third = node(act_id, "Third");
        let edges = vec![
            StoryEdge::new(root.id(), second.id(), t0()),
            StoryEdge::new(second.id(), third.id(), t0()),
        ];
        let timeline = build_timeline(&[root.clone(), second, third.clone()], &edges);

        assert_eq!(timeline_scroll_offset(&timeline, Some(root.id())), 0.0);
        assert_eq!(
            timeline_scroll_offset(&timeline, Some(third.id())),
            2.0 * 280.0
        );
        assert_eq!(timeline_scroll_offset(&timeline, None), 0.0);
        assert_eq!(timeline_scroll_offset(&timeline, Some(NodeId::new())), 0.0);
    }
}
