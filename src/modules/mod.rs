pub mod authors;
pub mod courses;

use std::sync::Arc;

use courselib_http::error::AppError;
use courselib_kernel::ModuleRegistry;
use courselib_store::{Store, StoreError};

/// Register all course-library modules with the registry.
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn Store>) {
    registry.register(authors::create_module(store.clone()));
    registry.register(courses::create_module(store));
}

/// Map store failures onto the HTTP error taxonomy. Anything the taxonomy
/// does not name is an internal fault and surfaces as a 500 with no detail.
pub(crate) fn map_store_error(err: StoreError) -> AppError {
    match err {
        StoreError::CourseIdTaken {
            course_id,
            owner_id,
        } => AppError::conflict(format!(
            "course {course_id} already belongs to author {owner_id}"
        )),
        StoreError::AuthorNotFound { author_id } => {
            AppError::not_found(format!("author {author_id} does not exist"))
        }
        other => AppError::Internal(anyhow::Error::new(other)),
    }
}
