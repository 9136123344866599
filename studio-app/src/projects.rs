//! Saved projects.
//!
//! A project is a named layout owned by a user. The studio talks to
//! storage through [`ProjectRepository`]; [`MemoryProjectRepository`] keeps
//! everything in process.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studio_core::SceneDocument;

use crate::error::{AppError, AppResult};

/// A saved design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Record id.
    pub id: u64,
    /// Owning user.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Serialized scene.
    #[serde(rename = "layout_data")]
    pub layout: SceneDocument,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Storage for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Store a new project.
    async fn create(&self, user_id: &str, name: &str, layout: SceneDocument) -> AppResult<Project>;

    /// Projects of a user, most recently updated first.
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Project>>;

    /// Fetch one project.
    async fn get(&self, id: u64) -> AppResult<Project>;

    /// Replace the name and layout of a project.
    async fn update(&self, id: u64, name: &str, layout: SceneDocument) -> AppResult<Project>;

    /// Remove a project.
    async fn delete(&self, id: u64) -> AppResult<()>;
}

struct Record {
    project: Project,
    // Breaks ties between updates within the same clock tick.
    revision: u64,
}

#[derive(Default)]
struct Inner {
    records: HashMap<u64, Record>,
    next_id: u64,
    revision: u64,
}

/// In-process project storage.
#[derive(Clone, Default)]
pub struct MemoryProjectRepository {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryProjectRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryProjectRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryProjectRepository")
            .field("projects", &self.len())
            .finish()
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn create(&self, user_id: &str, name: &str, layout: SceneDocument) -> AppResult<Project> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        inner.revision += 1;
        let now = Utc::now();
        let project = Project {
            id: inner.next_id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            layout,
            created_at: now,
            updated_at: now,
        };
        let revision = inner.revision;
        inner.records.insert(
            project.id,
            Record {
                project: project.clone(),
                revision,
            },
        );
        tracing::debug!(id = project.id, user_id, "Project created");
        Ok(project)
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Project>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<&Record> = inner
            .records
            .values()
            .filter(|r| r.project.user_id == user_id)
            .collect();
        records.sort_by(|a, b| {
            b.project
                .updated_at
                .cmp(&a.project.updated_at)
                .then(b.revision.cmp(&a.revision))
        });
        Ok(records.into_iter().map(|r| r.project.clone()).collect())
    }

    async fn get(&self, id: u64) -> AppResult<Project> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .records
            .get(&id)
            .map(|r| r.project.clone())
            .ok_or(AppError::ProjectNotFound(id))
    }

    async fn update(&self, id: u64, name: &str, layout: SceneDocument) -> AppResult<Project> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.revision += 1;
        let revision = inner.revision;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(AppError::ProjectNotFound(id))?;
        record.project.name = name.to_string();
        record.project.layout = layout;
        record.project.updated_at = Utc::now().max(record.project.updated_at);
        record.revision = revision;
        tracing::debug!(id, "Project updated");
        Ok(record.project.clone())
    }

    async fn delete(&self, id: u64) -> AppResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.records.remove(&id).is_none() {
            return Err(AppError::ProjectNotFound(id));
        }
        tracing::debug!(id, "Project deleted");
        Ok(())
    }
}
