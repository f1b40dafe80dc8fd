//! In-memory store implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::criteria::{filter_authors, AuthorsCriteria, Page};
use crate::entity::{Author, Course};
use crate::error::{StoreError, StoreResult};
use crate::uow::{Mutation, UnitOfWork};
use crate::Store;

#[derive(Debug, Clone, Default)]
struct Inner {
    authors: HashMap<Uuid, Author>,
    courses: HashMap<Uuid, Course>,
}

/// In-memory implementation of [`Store`].
///
/// All state sits behind a single `RwLock`; the write section of `commit`
/// is the transaction boundary. Commit applies the unit of work to a
/// scratch copy and swaps it in, so a mutation that violates an invariant
/// leaves the store exactly as it was.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn author(&self, author_id: Uuid) -> StoreResult<Option<Author>> {
        Ok(self.inner.read().await.authors.get(&author_id).cloned())
    }

    async fn author_exists(&self, author_id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.read().await.authors.contains_key(&author_id))
    }

    async fn authors_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Author>> {
        let requested: HashSet<Uuid> = ids.iter().copied().collect();
        let inner = self.inner.read().await;
        Ok(inner
            .authors
            .values()
            .filter(|author| requested.contains(&author.id))
            .cloned()
            .collect())
    }

    async fn authors(&self, criteria: &AuthorsCriteria) -> StoreResult<Page<Author>> {
        let inner = self.inner.read().await;
        let all: Vec<Author> = inner.authors.values().cloned().collect();
        Ok(filter_authors(all, criteria))
    }

    async fn course(&self, author_id: Uuid, course_id: Uuid) -> StoreResult<Option<Course>> {
        let inner = self.inner.read().await;
        Ok(inner
            .courses
            .get(&course_id)
            .filter(|course| course.author_id == author_id)
            .cloned())
    }

    async fn courses_for_author(&self, author_id: Uuid) -> StoreResult<Vec<Course>> {
        let inner = self.inner.read().await;
        let mut courses: Vec<Course> = inner
            .courses
            .values()
            .filter(|course| course.author_id == author_id)
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(courses)
    }

    async fn commit(&self, uow: UnitOfWork) -> StoreResult<bool> {
        let mutations = uow.into_mutations();
        if mutations.is_empty() {
            return Ok(false);
        }

        let mut guard = self.inner.write().await;
        let mut scratch = guard.clone();
        let mut changed = false;

        for mutation in mutations {
            match mutation {
                Mutation::AddAuthor(author) => {
                    scratch.authors.insert(author.id, author);
                    changed = true;
                }
                Mutation::DeleteAuthor(author_id) => {
                    if scratch.authors.remove(&author_id).is_some() {
                        scratch.courses.retain(|_, course| course.author_id != author_id);
                        changed = true;
                    }
                }
                Mutation::AddCourse(course) => {
                    if !scratch.authors.contains_key(&course.author_id) {
                        return Err(StoreError::AuthorNotFound {
                            author_id: course.author_id,
                        });
                    }
                    if let Some(existing) = scratch.courses.get(&course.id) {
                        return Err(StoreError::CourseIdTaken {
                            course_id: course.id,
                            owner_id: existing.author_id,
                        });
                    }
                    scratch.courses.insert(course.id, course);
                    changed = true;
                }
                Mutation::UpdateCourse(course) => {
                    if !scratch.courses.contains_key(&course.id) {
                        return Err(StoreError::CourseNotFound {
                            course_id: course.id,
                        });
                    }
                    scratch.courses.insert(course.id, course);
                    changed = true;
                }
            }
        }

        *guard = scratch;
        tracing::debug!(changed, "unit of work committed");
        Ok(changed)
    }
}
