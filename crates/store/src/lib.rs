//! Entity store for the course library: authors, the courses they own, the
//! query pipeline over the author collection, and the unit-of-work commit
//! protocol.

use async_trait::async_trait;
use uuid::Uuid;

pub mod criteria;
pub mod entity;
pub mod error;
pub mod memory;
pub mod uow;

pub use criteria::{AuthorsCriteria, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use entity::{Author, Course};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use uow::{Mutation, UnitOfWork};

/// Abstract store interface. Implementations must be thread-safe and apply
/// a unit of work atomically: either every mutation persists or none does.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Fetch a single author.
    async fn author(&self, author_id: Uuid) -> StoreResult<Option<Author>>;

    /// Cheap existence probe for an author.
    async fn author_exists(&self, author_id: Uuid) -> StoreResult<bool>;

    /// Fetch the authors whose ids appear in `ids`. The result holds each
    /// matching author once, in unspecified order; callers re-correlate by
    /// id and compare counts to detect misses.
    async fn authors_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Author>>;

    /// Run the filter/search/page pipeline over the author collection.
    async fn authors(&self, criteria: &AuthorsCriteria) -> StoreResult<Page<Author>>;

    /// Fetch a course scoped to its owning author.
    async fn course(&self, author_id: Uuid, course_id: Uuid) -> StoreResult<Option<Course>>;

    /// List an author's courses in a stable order.
    async fn courses_for_author(&self, author_id: Uuid) -> StoreResult<Vec<Course>>;

    /// Apply all pending mutations as one atomic change set. Returns whether
    /// anything was persisted.
    async fn commit(&self, uow: UnitOfWork) -> StoreResult<bool>;
}
