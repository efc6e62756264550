//! StoryEdge entity - a directed transition between two nodes
//!
//! Edges carry an optional label describing the triggering choice or
//! condition, and remember whether the GM actually followed them during
//! live play.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EdgeId, NodeId};

/// A directed, labeled transition between two nodes in the same act
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryEdge {
    id: EdgeId,
    from_node_id: NodeId,
    to_node_id: NodeId,

    /// Short text describing the choice/condition that triggers this path
    label: Option<String>,

    /// Whether the GM followed this edge during live play
    was_taken: bool,
    taken_at: Option<DateTime<Utc>>,

    created_at: DateTime<Utc>,
}

impl StoryEdge {
    pub fn new(from_node_id: NodeId, to_node_id: NodeId, now: DateTime<Utc>) -> Self {
        Self {
            id: EdgeId::new(),
            from_node_id,
            to_node_id,
            label: None,
            was_taken: false,
            taken_at: None,
            created_at: now,
        }
    }

    // Read accessors
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn from_node_id(&self) -> NodeId {
        self.from_node_id
    }

    pub fn to_node_id(&self) -> NodeId {
        self.to_node_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn was_taken(&self) -> bool {
        self.was_taken
    }

    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Builder methods
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    // Mutators
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Record that the GM followed this edge during live play.
    pub fn mark_taken(&mut self, now: DateTime<Utc>) {
        self.was_taken = true;
        self.taken_at = Some(now);
    }

    /// Forget live-play traversal state (session reset).
    pub fn clear_taken(&mut self) {
        self.was_taken = false;
        self.taken_at = None;
    }

    /// True if this edge connects the same ordered (from, to) pair.
    pub fn connects(&self, from: NodeId, to: NodeId) -> bool {
        self.from_node_id == from && self.to_node_id == to
    }

    /// True if this edge references the node as source or target.
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }

    /// Reconstruct a StoryEdge from stored parts (for repository
    /// deserialization).
    pub fn from_parts(
        id: EdgeId,
        from_node_id: NodeId,
        to_node_id: NodeId,
        label: Option<String>,
        was_taken: bool,
        taken_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            from_node_id,
            to_node_id,
            label,
            was_taken,
            taken_at,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")
    }

    #[test]
    fn test_new() {
        let from = NodeId::new();
        let to = NodeId::new();
        let now = test_now();
        let edge = StoryEdge::new(from, to, now);

        assert_eq!(edge.from_node_id(), from);
        assert_eq!(edge.to_node_id(), to);
        assert_eq!(edge.label(), None);
        assert!(!edge.was_taken());
        assert_eq!(edge.taken_at(), None);
        assert_eq!(edge.created_at(), now);
    }

    #[test]
    fn test_with_label() {
        let edge = StoryEdge::new(NodeId::new(), NodeId::new(), test_now())
            .with_label("the party accepts");
        assert_eq!(edge.label(), Some("the party accepts"));
    }

    #[test]
    fn test_mark_and_clear_taken() {
        let now = test_now();
        let mut edge = StoryEdge::new(NodeId::new(), NodeId::new(), now);

        let later = now + chrono::Duration::seconds(10);
        edge.mark_taken(later);
        assert!(edge.was_taken());
        assert_eq!(edge.taken_at(), Some(later));

        edge.clear_taken();
        assert!(!edge.was_taken());
        assert_eq!(edge.taken_at(), None);
    }

    #[test]
    fn test_connects_is_directional() {
        let from = NodeId::new();
        let to = NodeId::new();
        let edge = StoryEdge::new(from, to, test_now());

        assert!(edge.connects(from, to));
        assert!(!edge.connects(to, from));
    }

    #[test]
    fn test_touches_either_end() {
        let from = NodeId::new();
        let to = NodeId::new();
        let edge = StoryEdge::new(from, to, test_now());

        assert!(edge.touches(from));
        assert!(edge.touches(to));
        assert!(!edge.touches(NodeId::new()));
    }
}
