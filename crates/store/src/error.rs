use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised while committing a unit of work. Any failure discards
/// every mutation accumulated in the unit of work.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("author not found: {author_id}")]
    AuthorNotFound { author_id: Uuid },

    #[error("course not found: {course_id}")]
    CourseNotFound { course_id: Uuid },

    #[error("course {course_id} already belongs to author {owner_id}")]
    CourseIdTaken { course_id: Uuid, owner_id: Uuid },
}
