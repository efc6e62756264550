//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{
    Database, SqliteGraphRepository, SqliteReferenceRepository,
};
use crate::infrastructure::ports::ClockPort;
use crate::repositories::{NarrativeGraph, References};
use crate::use_cases::narrative::{GraphMutationOps, GraphQueryOps};
use crate::use_cases::NarrativeUseCases;

/// Main application state: the database handle plus the wired-up
/// narrative use cases.
pub struct App {
    pub database: Database,
    pub narrative: NarrativeUseCases,
}

impl App {
    /// Connect to the configured database, apply the schema, and wire
    /// the repositories and use cases together.
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let database = Database::connect(config).await?;
        database.initialize_schema().await?;
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
        Ok(Self::compose(database, config, clock))
    }

    fn compose(database: Database, config: &AppConfig, clock: Arc<dyn ClockPort>) -> Self {
        let deadline = Duration::from_secs(config.db_timeout_secs);
        let graph = Arc::new(NarrativeGraph::with_deadline(
            Arc::new(SqliteGraphRepository::new(database.pool().clone())),
            deadline,
        ));
        let references = Arc::new(References::with_deadline(
            Arc::new(SqliteReferenceRepository::new(database.pool().clone())),
            deadline,
        ));

        let narrative = NarrativeUseCases::new(
            Arc::new(GraphQueryOps::new(Arc::clone(&graph), references)),
            Arc::new(GraphMutationOps::new(graph, clock)),
        );

        Self {
            database,
            narrative,
        }
    }

    /// In-memory composition for tests and demos.
    #[cfg(test)]
    pub async fn in_memory(clock: Arc<dyn ClockPort>) -> Result<Self> {
        let database = Database::in_memory().await?;
        database.initialize_schema().await?;
        Ok(Self::compose(database, &AppConfig::default(), clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::use_cases::narrative::{CreateNodeInput, SessionMode};
    use chrono::{TimeZone, Utc};
    use plotloom_domain::{ActId, CanvasPosition, SessionId};

    // Full stack walk-through: build an act, play through it, reset it.
    #[tokio::test]
    async fn composed_app_supports_a_full_session_round_trip() {
        let clock = Arc::new(FixedClock(
            Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp"),
        ));
        let app = App::in_memory(clock).await.expect("app");
        let act_id = ActId::new();
        let session_id = SessionId::new();

        let root_id = app
            .narrative
            .mutation
            .create_root_node(act_id, "Opening")
            .await
            .expect("root");
        let next_id = app
            .narrative
            .mutation
            .create_node(CreateNodeInput {
                act_id,
                title: "The chase".to_string(),
                description: None,
                position: CanvasPosition::new(250.0, 0.0),
            })
            .await
            .expect("node");
        let edge_id = app
            .narrative
            .mutation
            .create_edge(root_id, next_id, Some("they run".to_string()))
            .await
            .expect("edge");

        app.narrative
            .mutation
            .take_path(edge_id, session_id)
            .await
            .expect("take path");

        let snapshot = app.narrative.query.load(act_id).await.expect("load");
        assert_eq!(snapshot.current().map(|n| n.id()), Some(next_id));
        assert_eq!(snapshot.visited_path().len(), 1);

        let offered = crate::use_cases::narrative::choosable_paths(&snapshot, SessionMode::Live);
        assert!(offered.is_empty());

        let restored = app
            .narrative
            .mutation
            .reset_session(act_id)
            .await
            .expect("reset");
        assert_eq!(restored, Some(root_id));

        let snapshot = app.narrative.query.load(act_id).await.expect("reload");
        assert_eq!(snapshot.current().map(|n| n.id()), Some(root_id));
        assert!(snapshot.visited_path().is_empty());
    }
}
