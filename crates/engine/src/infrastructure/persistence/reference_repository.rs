//! Read-only title lookups for linked external entities
//!
//! Story notes, encounters, and monsters are owned by the surrounding
//! CRUD layer; the graph core only reads their titles for badges.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use plotloom_domain::{EncounterId, MonsterId, StoryNoteId};

use crate::infrastructure::ports::{ReferenceRepo, RepoError};

pub struct SqliteReferenceRepository {
    pool: SqlitePool,
}

impl SqliteReferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn titles_by_id(
        &self,
        operation: &'static str,
        table: &str,
        title_column: &str,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, RepoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT id, {title_column} FROM {table} WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database(operation, e))?;

        rows.into_iter()
            .map(|(id, title)| {
                Uuid::parse_str(&id)
                    .map(|uuid| (uuid, title))
                    .map_err(|e| RepoError::serialization(format!("invalid uuid in {table}: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl ReferenceRepo for SqliteReferenceRepository {
    async fn note_titles(
        &self,
        ids: &[StoryNoteId],
    ) -> Result<HashMap<StoryNoteId, String>, RepoError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.to_uuid()).collect();
        let titles = self
            .titles_by_id("note_titles", "story_notes", "title", &uuids)
            .await?;
        Ok(titles
            .into_iter()
            .map(|(id, title)| (StoryNoteId::from_uuid(id), title))
            .collect())
    }

    async fn encounter_titles(
        &self,
        ids: &[EncounterId],
    ) -> Result<HashMap<EncounterId, String>, RepoError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.to_uuid()).collect();
        let titles = self
            .titles_by_id("encounter_titles", "encounters", "title", &uuids)
            .await?;
        Ok(titles
            .into_iter()
            .map(|(id, title)| (EncounterId::from_uuid(id), title))
            .collect())
    }

    async fn monster_names(
        &self,
        ids: &[MonsterId],
    ) -> Result<HashMap<MonsterId, String>, RepoError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.to_uuid()).collect();
        let names = self
            .titles_by_id("monster_names", "monsters", "name", &uuids)
            .await?;
        Ok(names
            .into_iter()
            .map(|(id, name)| (MonsterId::from_uuid(id), name))
            .collect())
    }
}
