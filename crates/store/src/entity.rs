use time::Date;
use uuid::Uuid;

/// A stored author. Owns zero or more courses; deleting an author deletes
/// its courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub main_category: String,
}

impl Author {
    /// Build a new author with a freshly assigned identifier.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: Date,
        main_category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            main_category: main_category.into(),
        }
    }

    /// Synthesized text the free-text search matches against: category plus
    /// both name parts, lowercased.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.main_category, self.first_name, self.last_name
        )
        .to_lowercase()
    }
}

/// A stored course. Always belongs to exactly one author; the course id is
/// globally unique, not just unique within its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author_id: Uuid,
}

impl Course {
    /// Build a new course with a freshly assigned identifier.
    pub fn new(author_id: Uuid, title: impl Into<String>, description: Option<String>) -> Self {
        Self::with_id(Uuid::now_v7(), author_id, title, description)
    }

    /// Build a course at a caller-supplied identifier (the PUT/PATCH
    /// create-by-specified-id path).
    pub fn with_id(
        id: Uuid,
        author_id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description,
            author_id,
        }
    }
}
