//! Repository port traits for database access.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use plotloom_domain::{
    ActId, CanvasPosition, CheckId, EdgeId, EncounterId, LinkTarget, MonsterId, NodeCheck,
    NodeId, NodeLink, SessionId, StoryEdge, StoryNode, StoryNoteId,
};

use super::error::RepoError;

// =============================================================================
// Narrative Graph Storage
// =============================================================================

/// Storage port for one act's narrative graph: nodes, edges, links, checks.
///
/// Traversal operations that span multiple rows (`take_path`,
/// `set_current_node`, `reset_session`, `insert_root`) are single
/// transactions in any implementation, so a partial failure can never
/// leave torn session state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphRepo: Send + Sync {
    // Nodes
    async fn get_node(&self, id: NodeId) -> Result<Option<StoryNode>, RepoError>;
    async fn save_node(&self, node: &StoryNode) -> Result<(), RepoError>;
    /// Deletes the node; the store cascades to its edges, links, and checks.
    async fn delete_node(&self, id: NodeId) -> Result<(), RepoError>;
    async fn list_nodes_in_act(&self, act_id: ActId) -> Result<Vec<StoryNode>, RepoError>;
    /// Position-only write; callers keep their optimistic local position.
    async fn update_node_position(
        &self,
        id: NodeId,
        position: CanvasPosition,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError>;
    async fn find_root(&self, act_id: ActId) -> Result<Option<StoryNode>, RepoError>;

    // Edges
    async fn get_edge(&self, id: EdgeId) -> Result<Option<StoryEdge>, RepoError>;
    async fn save_edge(&self, edge: &StoryEdge) -> Result<(), RepoError>;
    async fn delete_edge(&self, id: EdgeId) -> Result<(), RepoError>;
    /// All edges whose source or target node belongs to the act.
    async fn list_edges_in_act(&self, act_id: ActId) -> Result<Vec<StoryEdge>, RepoError>;
    async fn list_edges_from(&self, node_id: NodeId) -> Result<Vec<StoryEdge>, RepoError>;
    async fn edge_exists(&self, from: NodeId, to: NodeId) -> Result<bool, RepoError>;

    // Node links
    async fn add_link(&self, link: &NodeLink) -> Result<(), RepoError>;
    async fn remove_link(&self, node_id: NodeId, target: LinkTarget) -> Result<(), RepoError>;
    async fn list_links_in_act(&self, act_id: ActId) -> Result<Vec<NodeLink>, RepoError>;

    // Checks
    async fn get_check(&self, id: CheckId) -> Result<Option<NodeCheck>, RepoError>;
    async fn save_check(&self, check: &NodeCheck) -> Result<(), RepoError>;
    async fn delete_check(&self, id: CheckId) -> Result<(), RepoError>;
    async fn list_checks_in_act(&self, act_id: ActId) -> Result<Vec<NodeCheck>, RepoError>;
    async fn list_checks_for_node(&self, node_id: NodeId) -> Result<Vec<NodeCheck>, RepoError>;

    // Transactional session operations
    /// Insert a root node, clearing any stale current flag in the act
    /// within the same transaction.
    async fn insert_root(&self, node: &StoryNode) -> Result<(), RepoError>;
    /// Mark the edge taken, its source visited and no longer current,
    /// and its target current - atomically.
    async fn take_path(
        &self,
        edge_id: EdgeId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError>;
    /// Clear every current flag in the act, then set one - atomically.
    async fn set_current_node(
        &self,
        act_id: ActId,
        node_id: NodeId,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError>;
    /// Clear all session state in the act and re-mark the root current.
    /// Returns the id of the node left current, if a root exists.
    async fn reset_session(
        &self,
        act_id: ActId,
        now: DateTime<Utc>,
    ) -> Result<Option<NodeId>, RepoError>;
}

// =============================================================================
// External Collaborator Reads
// =============================================================================

/// Read-only title lookups for entities linked from graph nodes.
///
/// The linked tables are owned by the surrounding CRUD layer; the graph
/// core only reads titles for display badges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepo: Send + Sync {
    async fn note_titles(
        &self,
        ids: &[StoryNoteId],
    ) -> Result<HashMap<StoryNoteId, String>, RepoError>;
    async fn encounter_titles(
        &self,
        ids: &[EncounterId],
    ) -> Result<HashMap<EncounterId, String>, RepoError>;
    async fn monster_names(
        &self,
        ids: &[MonsterId],
    ) -> Result<HashMap<MonsterId, String>, RepoError>;
}
