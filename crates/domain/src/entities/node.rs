//! StoryNode entity - a discrete story beat in the narrative graph
//!
//! Nodes belong to exactly one act and carry both structural content
//! (title, description, canvas position) and live-session traversal
//! state (root/current/visited flags).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActId, CanvasPosition, DomainError, NodeId, SessionId};

/// A story beat in an act's narrative graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    id: NodeId,
    act_id: ActId,

    /// Short title shown on the canvas and timeline (required, non-empty)
    title: String,
    /// Optional long-form description of the beat
    description: Option<String>,

    /// Free-form canvas placement
    position: CanvasPosition,

    /// Whether this node is the act's entry point (at most one per act)
    is_root: bool,
    /// Whether the party is here right now (at most one per act)
    is_current: bool,
    /// Whether the party has reached this node during live play
    was_visited: bool,
    /// When the node was visited (drives visited-path ordering)
    visited_at: Option<DateTime<Utc>>,
    /// Which play session last touched this node
    session_id: Option<SessionId>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoryNode {
    pub fn new(
        act_id: ActId,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("Node title cannot be empty"));
        }
        Ok(Self {
            id: NodeId::new(),
            act_id,
            title,
            description: None,
            position: CanvasPosition::default(),
            is_root: false,
            is_current: false,
            was_visited: false,
            visited_at: None,
            session_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    // Read accessors
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn act_id(&self) -> ActId {
        self.act_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn position(&self) -> CanvasPosition {
        self.position
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn was_visited(&self) -> bool {
        self.was_visited
    }

    pub fn visited_at(&self) -> Option<DateTime<Utc>> {
        self.visited_at
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Builder methods
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_position(mut self, position: CanvasPosition) -> Self {
        self.position = position;
        self
    }

    /// Flag this node as the act's root. Roots start as the current node.
    pub fn as_root(mut self) -> Self {
        self.is_root = true;
        self.is_current = true;
        self
    }

    // Setter methods for content edits
    pub fn set_title(
        &mut self,
        title: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("Node title cannot be empty"));
        }
        self.title = title;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>, now: DateTime<Utc>) {
        self.description = description;
        self.updated_at = now;
    }

    pub fn set_position(&mut self, position: CanvasPosition, now: DateTime<Utc>) {
        self.position = position;
        self.updated_at = now;
    }

    // Live-session state transitions

    /// Mark this node reached during live play. Visiting a node always
    /// moves the party off it, so `is_current` is cleared here.
    pub fn mark_visited(&mut self, session_id: SessionId, now: DateTime<Utc>) {
        self.was_visited = true;
        self.visited_at = Some(now);
        self.session_id = Some(session_id);
        self.is_current = false;
        self.updated_at = now;
    }

    pub fn set_current(&mut self, is_current: bool, now: DateTime<Utc>) {
        self.is_current = is_current;
        self.updated_at = now;
    }

    /// Clear all live-session state without touching structure.
    pub fn clear_session_state(&mut self, now: DateTime<Utc>) {
        self.is_current = false;
        self.was_visited = false;
        self.visited_at = None;
        self.session_id = None;
        self.updated_at = now;
    }

    /// Reconstruct a StoryNode from stored parts (for repository
    /// deserialization). Bypasses validation since stored data is trusted.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: NodeId,
        act_id: ActId,
        title: String,
        description: Option<String>,
        position: CanvasPosition,
        is_root: bool,
        is_current: bool,
        was_visited: bool,
        visited_at: Option<DateTime<Utc>>,
        session_id: Option<SessionId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            act_id,
            title,
            description,
            position,
            is_root,
            is_current,
            was_visited,
            visited_at,
            session_id,
            created_at,
            updated_at,
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
        let act_id = ActId::new();
        let now = test_now();
        let node = StoryNode::new(act_id, "The ambush", now).expect("valid node");

        assert_eq!(node.title(), "The ambush");
        assert_eq!(node.act_id(), act_id);
        assert_eq!(node.position(), CanvasPosition::origin());
        assert!(!node.is_root());
        assert!(!node.is_current());
        assert!(!node.was_visited());
        assert_eq!(node.visited_at(), None);
        assert_eq!(node.session_id(), None);
        assert_eq!(node.created_at(), now);
        assert_eq!(node.updated_at(), now);
    }

    #[test]
    fn test_new_rejects_empty_title() {
        let result = StoryNode::new(ActId::new(), "   ", test_now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_as_root_is_current() {
        let node = StoryNode::new(ActId::new(), "Opening", test_now())
            .expect("valid node")
            .as_root();

        assert!(node.is_root());
        assert!(node.is_current());
    }

    #[test]
    fn test_mark_visited() {
        let now = test_now();
        let mut node = StoryNode::new(ActId::new(), "Beat", now)
            .expect("valid node")
            .as_root();
        let session = SessionId::new();

        let later = now + chrono::Duration::seconds(30);
        node.mark_visited(session, later);

        assert!(node.was_visited());
        assert_eq!(node.visited_at(), Some(later));
        assert_eq!(node.session_id(), Some(session));
        assert!(!node.is_current());
        assert_eq!(node.updated_at(), later);
    }

    #[test]
    fn test_clear_session_state() {
        let now = test_now();
        let mut node = StoryNode::new(ActId::new(), "Beat", now)
            .expect("valid node")
            .as_root();
        node.mark_visited(SessionId::new(), now);

        let later = now + chrono::Duration::seconds(1);
        node.clear_session_state(later);

        assert!(!node.is_current());
        assert!(!node.was_visited());
        assert_eq!(node.visited_at(), None);
        assert_eq!(node.session_id(), None);
        assert!(node.is_root());
        assert_eq!(node.updated_at(), later);
    }

    #[test]
    fn test_set_title_rejects_empty() {
        let now = test_now();
        let mut node = StoryNode::new(ActId::new(), "Beat", now).expect("valid node");

        assert!(node.set_title("", now).is_err());
        assert_eq!(node.title(), "Beat");

        node.set_title("Renamed", now).expect("valid title");
        assert_eq!(node.title(), "Renamed");
    }

    #[test]
    fn test_set_position_touches_updated_at() {
        let now = test_now();
        let mut node = StoryNode::new(ActId::new(), "Beat", now).expect("valid node");

        let later = now + chrono::Duration::seconds(5);
        node.set_position(CanvasPosition::new(120.0, 40.0), later);

        assert_eq!(node.position(), CanvasPosition::new(120.0, 40.0));
        assert_eq!(node.updated_at(), later);
    }
}
