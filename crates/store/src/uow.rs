use uuid::Uuid;

use crate::entity::{Author, Course};

/// One intended change to the store.
#[derive(Debug, Clone)]
pub enum Mutation {
    AddAuthor(Author),
    /// Removes the author and every course it owns.
    DeleteAuthor(Uuid),
    AddCourse(Course),
    UpdateCourse(Course),
}

/// The pending mutations of a single request. Nothing is durable until the
/// unit of work is handed to [`Store::commit`](crate::Store::commit), which
/// applies it all-or-nothing.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    mutations: Vec<Mutation>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_author(&mut self, author: Author) {
        self.mutations.push(Mutation::AddAuthor(author));
    }

    pub fn delete_author(&mut self, author_id: Uuid) {
        self.mutations.push(Mutation::DeleteAuthor(author_id));
    }

    /// Queue a course insert under the given author. The course must carry
    /// its identifier already; assignment happens where the entity is built.
    pub fn add_course(&mut self, author_id: Uuid, mut course: Course) {
        course.author_id = author_id;
        self.mutations.push(Mutation::AddCourse(course));
    }

    pub fn update_course(&mut self, course: Course) {
        self.mutations.push(Mutation::UpdateCourse(course));
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub(crate) fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}
