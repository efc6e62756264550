//! Linked-entity title lookups.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use plotloom_domain::{EncounterId, MonsterId, StoryNoteId};

use crate::infrastructure::ports::{ReferenceRepo, RepoError};

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Read-only access to linked note/encounter/monster titles.
pub struct References {
    repo: Arc<dyn ReferenceRepo>,
    deadline: Duration,
}

impl References {
    pub fn new(repo: Arc<dyn ReferenceRepo>) -> Self {
        Self::with_deadline(repo, DEFAULT_DEADLINE)
    }

    pub fn with_deadline(repo: Arc<dyn ReferenceRepo>, deadline: Duration) -> Self {
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

    pub async fn note_titles(
        &self,
        ids: &[StoryNoteId],
    ) -> Result<HashMap<StoryNoteId, String>, RepoError> {
        self.bounded("note_titles", self.repo.note_titles(ids)).await
    }

    pub async fn encounter_titles(
        &self,
        ids: &[EncounterId],
    ) -> Result<HashMap<EncounterId, String>, RepoError> {
        self.bounded("encounter_titles", self.repo.encounter_titles(ids))
            .await
    }

    pub async fn monster_names(
        &self,
        ids: &[MonsterId],
    ) -> Result<HashMap<MonsterId, String>, RepoError> {
        self.bounded("monster_names", self.repo.monster_names(ids))
            .await
    }
}
