use courselib_http::error::FieldErrors;
use courselib_store::Course;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest title a course may carry.
pub const TITLE_MAX_LEN: usize = 100;

/// Longest description a course may carry.
pub const DESCRIPTION_MAX_LEN: usize = 1500;

/// Externally visible course representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author_id: Uuid,
}

/// Payload for creating a course under an author.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseForCreation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CourseForCreation {
    /// Check field constraints; an empty map means the payload is valid.
    pub fn validate(&self) -> FieldErrors {
        validate_course_fields(&self.title, self.description.as_deref().unwrap_or(""))
    }
}

/// Full-replace representation and patch target. Unset fields hold their
/// empty value so omitted-field patch operations are no-ops rather than
/// errors, and a full replace overwrites rather than merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseForUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CourseForUpdate {
    /// Check field constraints; an empty map means the representation is
    /// valid.
    pub fn validate(&self) -> FieldErrors {
        validate_course_fields(&self.title, &self.description)
    }
}

fn validate_course_fields(title: &str, description: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if title.trim().is_empty() {
        errors
            .entry("title".to_string())
            .or_default()
            .push("title is required".to_string());
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.entry("title".to_string()).or_default().push(format!(
            "title must be at most {TITLE_MAX_LEN} characters"
        ));
    }

    if description.chars().count() > DESCRIPTION_MAX_LEN {
        errors
            .entry("description".to_string())
            .or_default()
            .push(format!(
                "description must be at most {DESCRIPTION_MAX_LEN} characters"
            ));
    }

    errors
}

/// Map a creation payload onto a new entity; the identifier is assigned
/// here.
pub fn course_from_creation(author_id: Uuid, payload: &CourseForCreation) -> Course {
    Course::new(
        author_id,
        payload.title.trim(),
        payload
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    )
}

/// Map a validated update representation onto a new entity at a
/// caller-supplied identifier (the upsert create path).
pub fn course_from_update(course_id: Uuid, author_id: Uuid, rep: &CourseForUpdate) -> Course {
    let mut course = Course::with_id(course_id, author_id, rep.title.trim(), None);
    merge_update_rep(rep, &mut course);
    course
}

/// Project an entity into the transient update representation. A missing
/// description becomes the empty string.
pub fn course_to_update_rep(course: &Course) -> CourseForUpdate {
    CourseForUpdate {
        title: course.title.clone(),
        description: course.description.clone().unwrap_or_default(),
    }
}

/// Merge a validated update representation back onto an entity. An empty
/// description clears the stored one.
pub fn merge_update_rep(rep: &CourseForUpdate, course: &mut Course) {
    course.title = rep.title.trim().to_string();
    let description = rep.description.trim();
    course.description = if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    };
}

/// Project an entity into its external representation.
pub fn course_to_dto(course: &Course) -> CourseDto {
    CourseDto {
        id: course.id,
        title: course.title.clone(),
        description: course.description.clone(),
        author_id: course.author_id,
    }
}
