//! Narrative graph repository implementation for SQLite
//!
//! Traversal operations that touch multiple rows run inside a single
//! transaction, so a failure partway can never leave torn session state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use plotloom_domain::{
    ActId, CanvasPosition, CheckId, CheckKind, EdgeId, LinkTarget, LinkType, NodeCheck, NodeId,
    NodeLink, NodeLinkId, SessionId, StoryEdge, StoryNode,
};

use crate::infrastructure::ports::{GraphRepo, RepoError};

/// Repository for one act's nodes, edges, links, and checks
pub struct SqliteGraphRepository {
    pool: SqlitePool,
}

impl SqliteGraphRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(operation: &'static str, err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::constraint(format!("{operation}: {db}"))
        }
        _ => RepoError::database(operation, err),
    }
}

fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(value)
        .map_err(|e| RepoError::serialization(format!("invalid uuid in {column}: {e}")))
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct NodeRow {
    id: String,
    act_id: String,
    title: String,
    description: Option<String>,
    position_x: f64,
    position_y: f64,
    is_root: bool,
    is_current: bool,
    was_visited: bool,
    visited_at: Option<DateTime<Utc>>,
    session_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NodeRow {
    fn into_domain(self) -> Result<StoryNode, RepoError> {
        let session_id = match self.session_id {
            Some(s) => Some(SessionId::from_uuid(parse_uuid("session_id", &s)?)),
            None => None,
        };
        Ok(StoryNode::from_parts(
            NodeId::from_uuid(parse_uuid("id", &self.id)?),
            ActId::from_uuid(parse_uuid("act_id", &self.act_id)?),
            self.title,
            self.description,
            CanvasPosition::new(self.position_x, self.position_y),
            self.is_root,
            self.is_current,
            self.was_visited,
            self.visited_at,
            session_id,
            self.created_at,
            self.updated_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    id: String,
    from_node_id: String,
    to_node_id: String,
    label: Option<String>,
    was_taken: bool,
    taken_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl EdgeRow {
    fn into_domain(self) -> Result<StoryEdge, RepoError> {
        Ok(StoryEdge::from_parts(
            EdgeId::from_uuid(parse_uuid("id", &self.id)?),
            NodeId::from_uuid(parse_uuid("from_node_id", &self.from_node_id)?),
            NodeId::from_uuid(parse_uuid("to_node_id", &self.to_node_id)?),
            self.label,
            self.was_taken,
            self.taken_at,
            self.created_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: String,
    node_id: String,
    link_type: String,
    link_id: String,
    created_at: DateTime<Utc>,
}

impl LinkRow {
    fn into_domain(self) -> Result<NodeLink, RepoError> {
        let link_type: LinkType = self
            .link_type
            .parse()
            .map_err(|e| RepoError::serialization(format!("{e}")))?;
        let target = LinkTarget::from_stored(link_type, parse_uuid("link_id", &self.link_id)?);
        Ok(NodeLink::from_parts(
            NodeLinkId::from_uuid(parse_uuid("id", &self.id)?),
            NodeId::from_uuid(parse_uuid("node_id", &self.node_id)?),
            target,
            self.created_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct CheckRow {
    id: String,
    node_id: String,
    check_type: String,
    skill: Option<String>,
    ability: Option<String>,
    dc: Option<i32>,
    condition_text: Option<String>,
    success_text: String,
    failure_text: String,
    critical_text: Option<String>,
    is_hidden: bool,
    sort_order: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CheckRow {
    fn into_domain(self) -> Result<NodeCheck, RepoError> {
        let kind = match self.check_type.as_str() {
            "ability" => CheckKind::Ability {
                skill: self.skill.ok_or_else(|| {
                    RepoError::serialization("ability check row missing skill")
                })?,
                dc: self
                    .dc
                    .ok_or_else(|| RepoError::serialization("ability check row missing dc"))?,
            },
            "save" => CheckKind::Save {
                ability: self.ability.ok_or_else(|| {
                    RepoError::serialization("save check row missing ability")
                })?,
                dc: self
                    .dc
                    .ok_or_else(|| RepoError::serialization("save check row missing dc"))?,
            },
            "condition" => CheckKind::Condition {
                text: self.condition_text.ok_or_else(|| {
                    RepoError::serialization("condition check row missing text")
                })?,
            },
            other => {
                return Err(RepoError::serialization(format!(
                    "unknown check type: {other}"
                )))
            }
        };
        Ok(NodeCheck::from_parts(
            CheckId::from_uuid(parse_uuid("id", &self.id)?),
            NodeId::from_uuid(parse_uuid("node_id", &self.node_id)?),
            kind,
            self.success_text,
            self.failure_text,
            self.critical_text,
            self.is_hidden,
            self.sort_order,
            self.created_at,
            self.updated_at,
        ))
    }
}

// =============================================================================
// GraphRepo implementation
// =============================================================================

#[async_trait]
impl GraphRepo for SqliteGraphRepository {
    async fn get_node(&self, id: NodeId) -> Result<Option<StoryNode>, RepoError> {
        let row: Option<NodeRow> = sqlx::query_as("SELECT * FROM nodes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("get_node", e))?;
        row.map(NodeRow::into_domain).transpose()
    }

    async fn save_node(&self, node: &StoryNode) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO nodes (
                id, act_id, title, description, position_x, position_y,
                is_root, is_current, was_visited, visited_at, session_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                position_x = excluded.position_x,
                position_y = excluded.position_y,
                is_root = excluded.is_root,
                is_current = excluded.is_current,
                was_visited = excluded.was_visited,
                visited_at = excluded.visited_at,
                session_id = excluded.session_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(node.id().to_string())
        .bind(node.act_id().to_string())
        .bind(node.title())
        .bind(node.description())
        .bind(node.position().x)
        .bind(node.position().y)
        .bind(node.is_root())
        .bind(node.is_current())
        .bind(node.was_visited())
        .bind(node.visited_at())
        .bind(node.session_id().map(|s| s.to_string()))
        .bind(node.created_at())
        .bind(node.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("save_node", e))?;

        tracing::debug!("Saved node: {}", node.id());
        Ok(())
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("delete_node", e))?;
        tracing::debug!("Deleted node: {}", id);
        Ok(())
    }

    async fn list_nodes_in_act(&self, act_id: ActId) -> Result<Vec<StoryNode>, RepoError> {
        let rows: Vec<NodeRow> =
            sqlx::query_as("SELECT * FROM nodes WHERE act_id = ? ORDER BY rowid")
                .bind(act_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_err("list_nodes_in_act", e))?;
        rows.into_iter().map(NodeRow::into_domain).collect()
    }

    async fn update_node_position(
        &self,
        id: NodeId,
        position: CanvasPosition,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE nodes SET position_x = ?, position_y = ?, updated_at = ? WHERE id = ?")
                .bind(position.x)
                .bind(position.y)
                .bind(now)
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| db_err("update_node_position", e))?;
        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Node", id));
        }
        Ok(())
    }

    async fn find_root(&self, act_id: ActId) -> Result<Option<StoryNode>, RepoError> {
        let row: Option<NodeRow> =
            sqlx::query_as("SELECT * FROM nodes WHERE act_id = ? AND is_root = 1 LIMIT 1")
                .bind(act_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("find_root", e))?;
        row.map(NodeRow::into_domain).transpose()
    }

    async fn get_edge(&self, id: EdgeId) -> Result<Option<StoryEdge>, RepoError> {
        let row: Option<EdgeRow> = sqlx::query_as("SELECT * FROM edges WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("get_edge", e))?;
        row.map(EdgeRow::into_domain).transpose()
    }

    async fn save_edge(&self, edge: &StoryEdge) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO edges (id, from_node_id, to_node_id, label, was_taken, taken_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                was_taken = excluded.was_taken,
                taken_at = excluded.taken_at
            "#,
        )
        .bind(edge.id().to_string())
        .bind(edge.from_node_id().to_string())
        .bind(edge.to_node_id().to_string())
        .bind(edge.label())
        .bind(edge.was_taken())
        .bind(edge.taken_at())
        .bind(edge.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("save_edge", e))?;

        tracing::debug!("Saved edge: {}", edge.id());
        Ok(())
    }

    async fn delete_edge(&self, id: EdgeId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM edges WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("delete_edge", e))?;
        Ok(())
    }

    async fn list_edges_in_act(&self, act_id: ActId) -> Result<Vec<StoryEdge>, RepoError> {
        let rows: Vec<EdgeRow> = sqlx::query_as(
            r#"
            SELECT * FROM edges
            WHERE from_node_id IN (SELECT id FROM nodes WHERE act_id = ?)
               OR to_node_id IN (SELECT id FROM nodes WHERE act_id = ?)
            ORDER BY rowid
            "#,
        )
        .bind(act_id.to_string())
        .bind(act_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_edges_in_act", e))?;
        rows.into_iter().map(EdgeRow::into_domain).collect()
    }

    async fn list_edges_from(&self, node_id: NodeId) -> Result<Vec<StoryEdge>, RepoError> {
        let rows: Vec<EdgeRow> =
            sqlx::query_as("SELECT * FROM edges WHERE from_node_id = ? ORDER BY rowid")
                .bind(node_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_err("list_edges_from", e))?;
        rows.into_iter().map(EdgeRow::into_domain).collect()
    }

    async fn edge_exists(&self, from: NodeId, to: NodeId) -> Result<bool, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM edges WHERE from_node_id = ? AND to_node_id = ?",
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("edge_exists", e))?;
        Ok(count > 0)
    }

    async fn add_link(&self, link: &NodeLink) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO node_links (id, node_id, link_type, link_id, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(link.id().to_string())
        .bind(link.node_id().to_string())
        .bind(link.link_type().as_str())
        .bind(link.target().link_id().to_string())
        .bind(link.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("add_link", e))?;
        Ok(())
    }

    async fn remove_link(&self, node_id: NodeId, target: LinkTarget) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM node_links WHERE node_id = ? AND link_type = ? AND link_id = ?")
            .bind(node_id.to_string())
            .bind(target.link_type().as_str())
            .bind(target.link_id().to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("remove_link", e))?;
        Ok(())
    }

    async fn list_links_in_act(&self, act_id: ActId) -> Result<Vec<NodeLink>, RepoError> {
        let rows: Vec<LinkRow> = sqlx::query_as(
            r#"
            SELECT * FROM node_links
            WHERE node_id IN (SELECT id FROM nodes WHERE act_id = ?)
            ORDER BY rowid
            "#,
        )
        .bind(act_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_links_in_act", e))?;
        rows.into_iter().map(LinkRow::into_domain).collect()
    }

    async fn get_check(&self, id: CheckId) -> Result<Option<NodeCheck>, RepoError> {
        let row: Option<CheckRow> = sqlx::query_as("SELECT * FROM checks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("get_check", e))?;
        row.map(CheckRow::into_domain).transpose()
    }

    async fn save_check(&self, check: &NodeCheck) -> Result<(), RepoError> {
        let (skill, ability, dc, condition_text) = match check.kind() {
            CheckKind::Ability { skill, dc } => (Some(skill.as_str()), None, Some(*dc), None),
            CheckKind::Save { ability, dc } => (None, Some(ability.as_str()), Some(*dc), None),
            CheckKind::Condition { text } => (None, None, None, Some(text.as_str())),
        };

        sqlx::query(
            r#"
            INSERT INTO checks (
                id, node_id, check_type, skill, ability, dc, condition_text,
                success_text, failure_text, critical_text, is_hidden, sort_order,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                check_type = excluded.check_type,
                skill = excluded.skill,
                ability = excluded.ability,
                dc = excluded.dc,
                condition_text = excluded.condition_text,
                success_text = excluded.success_text,
                failure_text = excluded.failure_text,
                critical_text = excluded.critical_text,
                is_hidden = excluded.is_hidden,
                sort_order = excluded.sort_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(check.id().to_string())
        .bind(check.node_id().to_string())
        .bind(check.kind().check_type())
        .bind(skill)
        .bind(ability)
        .bind(dc)
        .bind(condition_text)
        .bind(check.success_text())
        .bind(check.failure_text())
        .bind(check.critical_text())
        .bind(check.is_hidden())
        .bind(check.sort_order())
        .bind(check.created_at())
        .bind(check.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("save_check", e))?;
        Ok(())
    }

    async fn delete_check(&self, id: CheckId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM checks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("delete_check", e))?;
        Ok(())
    }

    async fn list_checks_in_act(&self, act_id: ActId) -> Result<Vec<NodeCheck>, RepoError> {
        let rows: Vec<CheckRow> = sqlx::query_as(
            r#"
            SELECT * FROM checks
            WHERE node_id IN (SELECT id FROM nodes WHERE act_id = ?)
            ORDER BY sort_order, rowid
            "#,
        )
        .bind(act_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_checks_in_act", e))?;
        rows.into_iter().map(CheckRow::into_domain).collect()
    }

    async fn list_checks_for_node(&self, node_id: NodeId) -> Result<Vec<NodeCheck>, RepoError> {
        let rows: Vec<CheckRow> =
            sqlx::query_as("SELECT * FROM checks WHERE node_id = ? ORDER BY sort_order, rowid")
                .bind(node_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_err("list_checks_for_node", e))?;
        rows.into_iter().map(CheckRow::into_domain).collect()
    }

    async fn insert_root(&self, node: &StoryNode) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("insert_root", e))?;

        // A stale current flag would trip the single-current index when the
        // root comes in flagged current, so clear it in the same transaction.
        sqlx::query("UPDATE nodes SET is_current = 0, updated_at = ? WHERE act_id = ? AND is_current = 1")
            .bind(node.updated_at())
            .bind(node.act_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("insert_root", e))?;

        sqlx::query(
            r#"
            INSERT INTO nodes (
                id, act_id, title, description, position_x, position_y,
                is_root, is_current, was_visited, visited_at, session_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(node.id().to_string())
        .bind(node.act_id().to_string())
        .bind(node.title())
        .bind(node.description())
        .bind(node.position().x)
        .bind(node.position().y)
        .bind(node.is_root())
        .bind(node.is_current())
        .bind(node.was_visited())
        .bind(node.visited_at())
        .bind(node.session_id().map(|s| s.to_string()))
        .bind(node.created_at())
        .bind(node.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("insert_root", e))?;

        tx.commit().await.map_err(|e| db_err("insert_root", e))?;
        tracing::debug!("Inserted root node: {}", node.id());
        Ok(())
    }

    async fn take_path(
        &self,
        edge_id: EdgeId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_err("take_path", e))?;

        let edge: Option<EdgeRow> = sqlx::query_as("SELECT * FROM edges WHERE id = ?")
            .bind(edge_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_err("take_path", e))?;
        let edge = edge.ok_or_else(|| RepoError::not_found("Edge", edge_id))?;

        sqlx::query("UPDATE edges SET was_taken = 1, taken_at = ? WHERE id = ?")
            .bind(now)
            .bind(edge_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("take_path", e))?;

        // The source is normally the current node, but the GM can take a
        // path after a manual jump; clear every current flag in the act so
        // the single-current index cannot be tripped.
        sqlx::query(
            r#"
            UPDATE nodes SET is_current = 0, updated_at = ?
            WHERE is_current = 1
              AND act_id = (SELECT act_id FROM nodes WHERE id = ?)
            "#,
        )
        .bind(now)
        .bind(&edge.from_node_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("take_path", e))?;

        sqlx::query(
            r#"
            UPDATE nodes
            SET was_visited = 1, visited_at = ?, session_id = ?, is_current = 0, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(session_id.to_string())
        .bind(now)
        .bind(&edge.from_node_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("take_path", e))?;

        sqlx::query(
            "UPDATE nodes SET is_current = 1, session_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(session_id.to_string())
        .bind(now)
        .bind(&edge.to_node_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("take_path", e))?;

        tx.commit().await.map_err(|e| db_err("take_path", e))?;
        tracing::debug!("Took path {} -> {}", edge.from_node_id, edge.to_node_id);
        Ok(())
    }

    async fn set_current_node(
        &self,
        act_id: ActId,
        node_id: NodeId,
        now: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("set_current_node", e))?;

        sqlx::query("UPDATE nodes SET is_current = 0, updated_at = ? WHERE act_id = ? AND is_current = 1")
            .bind(now)
            .bind(act_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("set_current_node", e))?;

        let result =
            sqlx::query("UPDATE nodes SET is_current = 1, updated_at = ? WHERE id = ? AND act_id = ?")
                .bind(now)
                .bind(node_id.to_string())
                .bind(act_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| db_err("set_current_node", e))?;
        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Node", node_id));
        }

        tx.commit()
            .await
            .map_err(|e| db_err("set_current_node", e))?;
        Ok(())
    }

    async fn reset_session(
        &self,
        act_id: ActId,
        now: DateTime<Utc>,
    ) -> Result<Option<NodeId>, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("reset_session", e))?;

        sqlx::query(
            r#"
            UPDATE nodes
            SET is_current = 0, was_visited = 0, visited_at = NULL, session_id = NULL, updated_at = ?
            WHERE act_id = ?
            "#,
        )
        .bind(now)
        .bind(act_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("reset_session", e))?;

        sqlx::query(
            r#"
            UPDATE edges SET was_taken = 0, taken_at = NULL
            WHERE from_node_id IN (SELECT id FROM nodes WHERE act_id = ?)
            "#,
        )
        .bind(act_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("reset_session", e))?;

        // Best-effort: an act without a root simply ends up with no current
        // node, which is a valid state.
        let root_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM nodes WHERE act_id = ? AND is_root = 1 LIMIT 1")
                .bind(act_id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_err("reset_session", e))?;

        if let Some(ref id) = root_id {
            sqlx::query("UPDATE nodes SET is_current = 1, updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_err("reset_session", e))?;
        }

        tx.commit().await.map_err(|e| db_err("reset_session", e))?;
        tracing::debug!("Reset session for act {}", act_id);

        root_id
            .map(|id| Ok(NodeId::from_uuid(parse_uuid("id", &id)?)))
            .transpose()
    }
}
