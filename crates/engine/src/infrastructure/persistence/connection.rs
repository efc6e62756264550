//! SQLite connection management

use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::infrastructure::config::AppConfig;

/// Shared SQLite connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        tracing::info!("Connected to SQLite at {}", config.database_url);

        Ok(Self { pool })
    }

    /// In-memory database on a single connection, for tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the database schema (tables, indexes, constraints)
    pub async fn initialize_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                act_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                position_x REAL NOT NULL DEFAULT 0,
                position_y REAL NOT NULL DEFAULT 0,
                is_root INTEGER NOT NULL DEFAULT 0,
                is_current INTEGER NOT NULL DEFAULT 0,
                was_visited INTEGER NOT NULL DEFAULT 0,
                visited_at TEXT,
                session_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_nodes_act ON nodes(act_id)",
            // At most one current node per act, enforced by the store
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_act_current
             ON nodes(act_id) WHERE is_current = 1",
            r#"
            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                from_node_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                to_node_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                label TEXT,
                was_taken INTEGER NOT NULL DEFAULT 0,
                taken_at TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (from_node_id, to_node_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_node_id)",
            "CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_node_id)",
            r#"
            CREATE TABLE IF NOT EXISTS node_links (
                id TEXT PRIMARY KEY,
                node_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                link_type TEXT NOT NULL CHECK (link_type IN ('note', 'encounter', 'monster')),
                link_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (node_id, link_type, link_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS checks (
                id TEXT PRIMARY KEY,
                node_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                check_type TEXT NOT NULL CHECK (check_type IN ('ability', 'save', 'condition')),
                skill TEXT,
                ability TEXT,
                dc INTEGER,
                condition_text TEXT,
                success_text TEXT NOT NULL,
                failure_text TEXT NOT NULL,
                critical_text TEXT,
                is_hidden INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_checks_node ON checks(node_id)",
            // Read-side tables owned by the surrounding CRUD layer; created
            // here so a fresh database serves badge lookups.
            r#"
            CREATE TABLE IF NOT EXISTS story_notes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS encounters (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS monsters (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::debug!("Database schema initialized");
        Ok(())
    }
}
