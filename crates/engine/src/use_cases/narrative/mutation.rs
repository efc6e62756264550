//! Graph mutation engine - every write that changes graph structure or
//! live-session traversal state.
//!
//! Structural CRUD is straightforward row writes. The live-session
//! operations (`take_path`, `set_current_node`, `reset_session`) span
//! multiple rows and run as single storage transactions so the act can
//! never be observed with two current nodes. `quick_branch` is the one
//! compound operation that is not a transaction; it compensates by
//! deleting the freshly created node when the edge write fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use plotloom_domain::{
    ActId, CanvasPosition, CheckId, CheckKind, DomainError, EdgeId, LinkTarget, NodeCheck, NodeId,
    NodeLink, SessionId, StoryEdge, StoryNode,
};

use crate::infrastructure::ports::{ClockPort, RepoError};
use crate::repositories::NarrativeGraph;

// Where quick-branched children land on the canvas relative to their
// parent: to the right, fanned downward per existing sibling.
const BRANCH_SPACING_X: f64 = 250.0;
const BRANCH_SPACING_Y: f64 = 150.0;

#[derive(Debug, thiserror::Error)]
pub enum GraphMutationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Storage(#[from] RepoError),
    /// The write would break a graph rule (duplicate edge, second root,
    /// self-edge). Nothing was changed.
    #[error("{0}")]
    Conflict(String),
}

impl GraphMutationError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Inputs for creating a non-root node.
#[derive(Debug, Clone)]
pub struct CreateNodeInput {
    pub act_id: ActId,
    pub title: String,
    pub description: Option<String>,
    pub position: CanvasPosition,
}

/// Partial update for node content edits. `description: Some(None)`
/// clears the description; `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

/// Partial update for an edge. Only the label is editable after creation.
#[derive(Debug, Clone, Default)]
pub struct EdgePatch {
    pub label: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct CreateCheckInput {
    pub node_id: NodeId,
    pub kind: CheckKind,
    pub success_text: String,
    pub failure_text: String,
    pub critical_text: Option<String>,
    pub is_hidden: bool,
    /// When absent, the check is appended after the node's existing checks.
    pub sort_order: Option<i64>,
}

/// Replacement outcome texts for a check, applied as one unit.
#[derive(Debug, Clone)]
pub struct CheckOutcomes {
    pub success_text: String,
    pub failure_text: String,
    pub critical_text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckPatch {
    pub kind: Option<CheckKind>,
    pub outcomes: Option<CheckOutcomes>,
    pub is_hidden: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct QuickBranchInput {
    pub from_node_id: NodeId,
    pub title: String,
    pub edge_label: Option<String>,
    /// Follow the new edge immediately (live play: "and that's where
    /// they went").
    pub auto_take: Option<SessionId>,
}

/// Outcome of a quick branch: the created pair, so callers can focus the
/// new node without a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickBranchResult {
    pub node_id: NodeId,
    pub edge_id: EdgeId,
}

/// All graph writes. Holds the timeout-bounded repository and an
/// injected clock so traversal timestamps are testable.
pub struct GraphMutationOps {
    graph: Arc<NarrativeGraph>,
    clock: Arc<dyn ClockPort>,
}

impl GraphMutationOps {
    pub fn new(graph: Arc<NarrativeGraph>, clock: Arc<dyn ClockPort>) -> Self {
        Self { graph, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // Node CRUD

    pub async fn create_node(
        &self,
        input: CreateNodeInput,
    ) -> Result<NodeId, GraphMutationError> {
        let mut node =
            StoryNode::new(input.act_id, input.title, self.now())?.with_position(input.position);
        if let Some(description) = input.description {
            node = node.with_description(description);
        }
        self.graph.save_node(&node).await?;
        debug!(node_id = %node.id(), act_id = %input.act_id, "Created story node");
        Ok(node.id())
    }

    /// Create the act's entry point. Fails with a conflict when the act
    /// already has a root; the insert also clears any stale current flag
    /// in the same transaction, so the new root is the only current node.
    pub async fn create_root_node(
        &self,
        act_id: ActId,
        title: impl Into<String>,
    ) -> Result<NodeId, GraphMutationError> {
        if let Some(existing) = self.graph.find_root(act_id).await? {
            return Err(GraphMutationError::conflict(format!(
                "Act already has a root node ({})",
                existing.id()
            )));
        }
        let node = StoryNode::new(act_id, title, self.now())?.as_root();
        self.graph.insert_root(&node).await?;
        debug!(node_id = %node.id(), act_id = %act_id, "Created root node");
        Ok(node.id())
    }

    pub async fn update_node(
        &self,
        id: NodeId,
        patch: NodePatch,
    ) -> Result<(), GraphMutationError> {
        let mut node = self.require_node(id).await?;
        let now = self.now();
        if let Some(title) = patch.title {
            node.set_title(title, now)?;
        }
        if let Some(description) = patch.description {
            node.set_description(description, now);
        }
        self.graph.save_node(&node).await?;
        Ok(())
    }

    /// Position-only write. Deliberately does not touch any other column
    /// and returns nothing to re-render; the canvas has already moved the
    /// node optimistically.
    pub async fn update_node_position(
        &self,
        id: NodeId,
        position: CanvasPosition,
    ) -> Result<(), GraphMutationError> {
        self.graph
            .update_node_position(id, position, self.now())
            .await?;
        Ok(())
    }

    /// Delete a node. Storage cascade removes its edges (both
    /// directions), links, and checks.
    pub async fn delete_node(&self, id: NodeId) -> Result<(), GraphMutationError> {
        self.graph.delete_node(id).await?;
        debug!(node_id = %id, "Deleted story node");
        Ok(())
    }

    // Edge CRUD

    pub async fn create_edge(
        &self,
        from: NodeId,
        to: NodeId,
        label: Option<String>,
    ) -> Result<EdgeId, GraphMutationError> {
        if from == to {
            return Err(GraphMutationError::conflict(
                "An edge cannot connect a node to itself",
            ));
        }
        if self.graph.edge_exists(from, to).await? {
            return Err(GraphMutationError::conflict(
                "An edge between these nodes already exists",
            ));
        }
        let mut edge = StoryEdge::new(from, to, self.now());
        if let Some(label) = label {
            edge = edge.with_label(label);
        }
        self.graph.save_edge(&edge).await?;
        debug!(edge_id = %edge.id(), %from, %to, "Created story edge");
        Ok(edge.id())
    }

    pub async fn update_edge(
        &self,
        id: EdgeId,
        patch: EdgePatch,
    ) -> Result<(), GraphMutationError> {
        let mut edge = self.require_edge(id).await?;
        if let Some(label) = patch.label {
            edge.set_label(label);
        }
        self.graph.save_edge(&edge).await?;
        Ok(())
    }

    pub async fn delete_edge(&self, id: EdgeId) -> Result<(), GraphMutationError> {
        self.graph.delete_edge(id).await?;
        Ok(())
    }

    // Link toggles

    pub async fn add_link(
        &self,
        node_id: NodeId,
        target: LinkTarget,
    ) -> Result<(), GraphMutationError> {
        let link = NodeLink::new(node_id, target, self.now());
        self.graph.add_link(&link).await?;
        Ok(())
    }

    pub async fn remove_link(
        &self,
        node_id: NodeId,
        target: LinkTarget,
    ) -> Result<(), GraphMutationError> {
        self.graph.remove_link(node_id, target).await?;
        Ok(())
    }

    // Check CRUD

    pub async fn create_check(
        &self,
        input: CreateCheckInput,
    ) -> Result<CheckId, GraphMutationError> {
        let sort_order = match input.sort_order {
            Some(order) => order,
            None => self.graph.list_checks_for_node(input.node_id).await?.len() as i64,
        };
        let mut check = NodeCheck::new(
            input.node_id,
            input.kind,
            input.success_text,
            input.failure_text,
            self.now(),
        )?
        .with_hidden(input.is_hidden)
        .with_sort_order(sort_order);
        if let Some(text) = input.critical_text {
            check = check.with_critical_text(text);
        }
        self.graph.save_check(&check).await?;
        Ok(check.id())
    }

    pub async fn update_check(
        &self,
        id: CheckId,
        patch: CheckPatch,
    ) -> Result<(), GraphMutationError> {
        let mut check = self.require_check(id).await?;
        let now = self.now();
        if let Some(kind) = patch.kind {
            check.set_kind(kind, now)?;
        }
        if let Some(outcomes) = patch.outcomes {
            check.set_outcomes(
                outcomes.success_text,
                outcomes.failure_text,
                outcomes.critical_text,
                now,
            )?;
        }
        if let Some(is_hidden) = patch.is_hidden {
            check.set_hidden(is_hidden, now);
        }
        if let Some(sort_order) = patch.sort_order {
            check.set_sort_order(sort_order, now);
        }
        self.graph.save_check(&check).await?;
        Ok(())
    }

    pub async fn delete_check(&self, id: CheckId) -> Result<(), GraphMutationError> {
        self.graph.delete_check(id).await?;
        Ok(())
    }

    // Live-session operations

    /// Follow an edge during live play: the edge becomes taken, its
    /// source visited, its target current. One transaction; either the
    /// whole traversal lands or none of it does.
    pub async fn take_path(
        &self,
        edge_id: EdgeId,
        session_id: SessionId,
    ) -> Result<(), GraphMutationError> {
        self.graph.take_path(edge_id, session_id, self.now()).await?;
        debug!(edge_id = %edge_id, session_id = %session_id, "Path taken");
        Ok(())
    }

    /// Manual jump: the GM clicks "go here" without following an edge.
    /// Clears every current flag in the act and sets the target, as one
    /// transaction, so exactly one node ends up current.
    pub async fn set_current_node(
        &self,
        act_id: ActId,
        node_id: NodeId,
    ) -> Result<(), GraphMutationError> {
        self.graph
            .set_current_node(act_id, node_id, self.now())
            .await?;
        Ok(())
    }

    /// Branch mid-session: create a child node next to the parent and an
    /// edge to it in one call. The edge write failing deletes the node
    /// again; callers never see a childless orphan.
    pub async fn quick_branch(
        &self,
        input: QuickBranchInput,
    ) -> Result<QuickBranchResult, GraphMutationError> {
        let parent = self.require_node(input.from_node_id).await?;
        let siblings = self.graph.list_edges_from(parent.id()).await?.len();

        let position = parent
            .position()
            .offset(BRANCH_SPACING_X, siblings as f64 * BRANCH_SPACING_Y);
        let node_id = self
            .create_node(CreateNodeInput {
                act_id: parent.act_id(),
                title: input.title,
                description: None,
                position,
            })
            .await?;

        let edge_id = match self
            .create_edge(parent.id(), node_id, input.edge_label)
            .await
        {
            Ok(edge_id) => edge_id,
            Err(err) => {
                warn!(
                    node_id = %node_id,
                    error = %err,
                    "Edge creation failed after quick-branch node insert, rolling back node"
                );
                if let Err(cleanup) = self.graph.delete_node(node_id).await {
                    warn!(
                        node_id = %node_id,
                        error = %cleanup,
                        "Quick-branch rollback failed, orphan node left behind"
                    );
                }
                return Err(err);
            }
        };

        if let Some(session_id) = input.auto_take {
            self.take_path(edge_id, session_id).await?;
        }

        Ok(QuickBranchResult { node_id, edge_id })
    }

    /// Wipe live-session state without touching structure, then re-mark
    /// the root current when one exists. Idempotent.
    pub async fn reset_session(
        &self,
        act_id: ActId,
    ) -> Result<Option<NodeId>, GraphMutationError> {
        let root = self.graph.reset_session(act_id, self.now()).await?;
        debug!(act_id = %act_id, root = ?root, "Session reset");
        Ok(root)
    }

    // Lookup helpers

    async fn require_node(&self, id: NodeId) -> Result<StoryNode, GraphMutationError> {
        self.graph
            .get_node(id)
            .await?
            .ok_or_else(|| RepoError::not_found("StoryNode", id).into())
    }

    async fn require_edge(&self, id: EdgeId) -> Result<StoryEdge, GraphMutationError> {
        self.graph
            .get_edge(id)
            .await?
            .ok_or_else(|| RepoError::not_found("StoryEdge", id).into())
    }

    async fn require_check(&self, id: CheckId) -> Result<NodeCheck, GraphMutationError> {
        self.graph
            .get_check(id)
            .await?
            .ok_or_else(|| RepoError::not_found("NodeCheck", id).into())
    }
}
