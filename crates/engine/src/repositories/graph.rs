//! Narrative graph data access wrapper.
//!
//! Wraps the `GraphRepo` port and bounds every call with a deadline.
//! An elapsed deadline is reported as a normal repository failure, not a
//! distinct error kind; callers retry or re-derive from a fresh load.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use plotloom_domain::{
    ActId, CanvasPosition, CheckId, EdgeId, LinkTarget, NodeCheck, NodeId, NodeLink, SessionId,
    StoryEdge, StoryNode,
};

use crate::infrastructure::ports::{GraphRepo, RepoError};

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Narrative graph operations with per-call deadlines.
pub struct NarrativeGraph {
    repo: Arc<dyn GraphRepo>,
    deadline: Duration,
}

impl NarrativeGraph {
    pub fn new(repo: Arc<dyn GraphRepo>) -> Self {
        Self::with_deadline(repo, DEFAULT_DEADLINE)
    }

    pub fn with_deadline(repo: Arc<dyn GraphRepo>, deadline: Duration) -> Self {
        Self { repo, deadline }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, RepoError> {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} exceeded the {:?} deadline", operation, self.deadline);
                Err(RepoError::timed_out(operation))
            }
        }
    }

    // Nodes

    pub async fn get_node(&self, id: NodeId) -> Result<Option<StoryNode>, RepoError> {
        self.bounded("get_node", self.repo.get_node(id)).await
    }

    pub async fn save_node(&self, node: &StoryNode) -> Result<(), RepoError> {
        self.bounded("save_node", self.repo.save_node(node)).await
    }

    pub async fn delete_node(&self, id: NodeId) -> Result<(), RepoError> {
        self.bounded("delete_node", self.repo.delete_node(id)).await
    }

    pub async fn list_nodes_in_act(&self, act_id: ActId) -> Result<Vec<StoryNode>, RepoError> {
        self.bounded("list_nodes_in_act", self.repo.list_nodes_in_act(act_id))
            .await
    }

    pub async fn update_node_position(
        &self,
        id: NodeId,
        position: CanvasPosition,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        self.bounded(
            "update_node_position",
            self.repo.update_node_position(id, position, now),
        )
        .await
    }

    pub async fn find_root(&self, act_id: ActId) -> Result<Option<StoryNode>, RepoError> {
        self.bounded("find_root", self.repo.find_root(act_id)).await
    }

    // Edges

    pub async fn get_edge(&self, id: EdgeId) -> Result<Option<StoryEdge>, RepoError> {
        self.bounded("get_edge", self.repo.get_edge(id)).await
    }

    pub async fn save_edge(&self, edge: &StoryEdge) -> Result<(), RepoError> {
        self.bounded("save_edge", self.repo.save_edge(edge)).await
    }

    pub async fn delete_edge(&self, id: EdgeId) -> Result<(), RepoError> {
        self.bounded("delete_edge", self.repo.delete_edge(id)).await
    }

    pub async fn list_edges_in_act(&self, act_id: ActId) -> Result<Vec<StoryEdge>, RepoError> {
        self.bounded("list_edges_in_act", self.repo.list_edges_in_act(act_id))
            .await
    }

    pub async fn list_edges_from(&self, node_id: NodeId) -> Result<Vec<StoryEdge>, RepoError> {
        self.bounded("list_edges_from", self.repo.list_edges_from(node_id))
            .await
    }

    pub async fn edge_exists(&self, from: NodeId, to: NodeId) -> Result<bool, RepoError> {
        self.bounded("edge_exists", self.repo.edge_exists(from, to))
            .await
    }

    // Node links

    pub async fn add_link(&self, link: &NodeLink) -> Result<(), RepoError> {
        self.bounded("add_link", self.repo.add_link(link)).await
    }

    pub async fn remove_link(&self, node_id: NodeId, target: LinkTarget) -> Result<(), RepoError> {
        self.bounded("remove_link", self.repo.remove_link(node_id, target))
            .await
    }

    pub async fn list_links_in_act(&self, act_id: ActId) -> Result<Vec<NodeLink>, RepoError> {
        self.bounded("list_links_in_act", self.repo.list_links_in_act(act_id))
            .await
    }

    // Checks

    pub async fn get_check(&self, id: CheckId) -> Result<Option<NodeCheck>, RepoError> {
        self.bounded("get_check", self.repo.get_check(id)).await
    }

    pub async fn save_check(&self, check: &NodeCheck) -> Result<(), RepoError> {
        self.bounded("save_check", self.repo.save_check(check)).await
    }

    pub async fn delete_check(&self, id: CheckId) -> Result<(), RepoError> {
        self.bounded("delete_check", self.repo.delete_check(id))
            .await
    }

    pub async fn list_checks_in_act(&self, act_id: ActId) -> Result<Vec<NodeCheck>, RepoError> {
        self.bounded("list_checks_in_act", self.repo.list_checks_in_act(act_id))
            .await
    }

    pub async fn list_checks_for_node(&self, node_id: NodeId) -> Result<Vec<NodeCheck>, RepoError> {
        self.bounded(
            "list_checks_for_node",
            self.repo.list_checks_for_node(node_id),
        )
        .await
    }

    // Transactional session operations

    pub async fn insert_root(&self, node: &StoryNode) -> Result<(), RepoError> {
        self.bounded("insert_root", self.repo.insert_root(node))
            .await
    }

    pub async fn take_path(
        &self,
        edge_id: EdgeId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        self.bounded("take_path", self.repo.take_path(edge_id, session_id, now))
            .await
    }

    pub async fn set_current_node(
        &self,
        act_id: ActId,
        node_id: NodeId,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        self.bounded(
            "set_current_node",
            self.repo.set_current_node(act_id, node_id, now),
        )
        .await
    }

    pub async fn reset_session(
        &self,
        act_id: ActId,
        now: DateTime<Utc>,
    ) -> Result<Option<NodeId>, RepoError> {
        self.bounded("reset_session", self.repo.reset_session(act_id, now))
            .await
    }
}
