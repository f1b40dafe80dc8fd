use courselib_http::error::FieldErrors;
use courselib_store::Author;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::modules::courses::models::CourseForCreation;

/// Externally visible author representation. The storage shape (name parts,
/// date of birth) is projected into a display name and a current age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDto {
    pub id: Uuid,
    pub name: String,
    pub main_category: String,
    pub age: i32,
}

/// Payload for creating an author, optionally with initial courses that are
/// persisted in the same commit.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorForCreation {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub date_of_birth: Date,
    #[serde(default)]
    pub main_category: String,
    #[serde(default)]
    pub courses: Vec<CourseForCreation>,
}

impl AuthorForCreation {
    /// Check field constraints, including nested course payloads; an empty
    /// map means the payload is valid.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("main_category", &self.main_category),
        ] {
            if value.trim().is_empty() {
                errors
                    .entry(field.to_string())
                    .or_default()
                    .push(format!("{field} is required"));
            }
        }

        for (index, course) in self.courses.iter().enumerate() {
            for (field, messages) in course.validate() {
                errors.insert(format!("courses[{index}].{field}"), messages);
            }
        }

        errors
    }
}

/// Map a creation payload onto a new entity; the identifier is assigned
/// here.
pub fn author_from_creation(payload: &AuthorForCreation) -> Author {
    Author::new(
        payload.first_name.trim(),
        payload.last_name.trim(),
        payload.date_of_birth,
        payload.main_category.trim(),
    )
}

/// Project an entity into its external representation.
pub fn author_to_dto(author: &Author) -> AuthorDto {
    AuthorDto {
        id: author.id,
        name: format!("{} {}", author.first_name, author.last_name),
        main_category: author.main_category.clone(),
        age: current_age(author.date_of_birth),
    }
}

/// Whole years between the date of birth and today.
fn current_age(date_of_birth: Date) -> i32 {
    let today = OffsetDateTime::now_utc().date();
    let mut age = today.year() - date_of_birth.year();
    if (today.month() as u8, today.day()) < (date_of_birth.month() as u8, date_of_birth.day()) {
        age -= 1;
    }
    age.max(0)
}
