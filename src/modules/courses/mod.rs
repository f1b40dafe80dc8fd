//! Courses nested under an author: list/get/create plus the PUT and PATCH
//! upsert paths keyed by `(author_id, course_id)`.

pub mod models;
pub mod patch;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use courselib_http::error::{AppError, FieldErrors};
use courselib_http::extract::AppJson;
use courselib_http::response::{created, no_content};
use courselib_kernel::{InitCtx, Module};
use courselib_store::{Store, UnitOfWork};

use crate::modules::map_store_error;
use models::{
    course_from_creation, course_from_update, course_to_dto, course_to_update_rep,
    merge_update_rep, CourseDto, CourseForCreation, CourseForUpdate,
};
use patch::{PatchDocument, PatchError};

type SharedStore = Arc<dyn Store>;

/// Courses module: child resources of an author.
pub struct CoursesModule {
    store: SharedStore,
}

impl CoursesModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for CoursesModule {
    fn name(&self) -> &'static str {
        "courses"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "courses module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/authors/{author_id}/courses",
                get(list_courses).post(create_course),
            )
            .route(
                "/authors/{author_id}/courses/{course_id}",
                get(get_course).put(put_course).patch(patch_course),
            )
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }
}

/// Create a new instance of the courses module
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(CoursesModule::new(store))
}

async fn ensure_author(store: &SharedStore, author_id: Uuid) -> Result<(), AppError> {
    if store
        .author_exists(author_id)
        .await
        .map_err(map_store_error)?
    {
        Ok(())
    } else {
        Err(AppError::not_found(format!(
            "author {author_id} does not exist"
        )))
    }
}

fn course_location(author_id: Uuid, course_id: Uuid) -> String {
    format!("/authors/{author_id}/courses/{course_id}")
}

fn patch_failure(err: PatchError) -> AppError {
    let mut errors = FieldErrors::new();
    errors.insert(err.path.clone(), vec![err.detail]);
    AppError::validation(errors, "patch document could not be applied")
}

fn check_valid(errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(
            errors,
            "course representation failed validation",
        ))
    }
}

async fn list_courses(
    State(store): State<SharedStore>,
    Path(author_id): Path<Uuid>,
) -> Result<Json<Vec<CourseDto>>, AppError> {
    ensure_author(&store, author_id).await?;

    let courses = store
        .courses_for_author(author_id)
        .await
        .map_err(map_store_error)?;
    Ok(Json(courses.iter().map(course_to_dto).collect()))
}

async fn get_course(
    State(store): State<SharedStore>,
    Path((author_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CourseDto>, AppError> {
    ensure_author(&store, author_id).await?;

    let course = store
        .course(author_id, course_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "course {course_id} not found for author {author_id}"
            ))
        })?;
    Ok(Json(course_to_dto(&course)))
}

async fn create_course(
    State(store): State<SharedStore>,
    Path(author_id): Path<Uuid>,
    AppJson(payload): AppJson<CourseForCreation>,
) -> Result<axum::response::Response, AppError> {
    ensure_author(&store, author_id).await?;
    check_valid(payload.validate())?;

    let course = course_from_creation(author_id, &payload);
    let mut uow = UnitOfWork::new();
    uow.add_course(author_id, course.clone());
    store.commit(uow).await.map_err(map_store_error)?;

    Ok(created(
        course_location(author_id, course.id),
        course_to_dto(&course),
    ))
}

/// PUT: full replace, or create at the requested id when the pair does not
/// resolve. A replace is a total overwrite, so fields omitted from the body
/// (bound to their empty values) clear the stored ones.
async fn put_course(
    State(store): State<SharedStore>,
    Path((author_id, course_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<CourseForUpdate>,
) -> Result<axum::response::Response, AppError> {
    ensure_author(&store, author_id).await?;
    check_valid(payload.validate())?;

    let existing = store
        .course(author_id, course_id)
        .await
        .map_err(map_store_error)?;
    let mut uow = UnitOfWork::new();

    match existing {
        None => {
            let course = course_from_update(course_id, author_id, &payload);
            uow.add_course(author_id, course.clone());
            store.commit(uow).await.map_err(map_store_error)?;

            Ok(created(
                course_location(author_id, course_id),
                course_to_dto(&course),
            ))
        }
        Some(mut course) => {
            merge_update_rep(&payload, &mut course);
            uow.update_course(course);
            store.commit(uow).await.map_err(map_store_error)?;

            Ok(no_content())
        }
    }
}

/// PATCH: apply the ordered patch document to a transient representation,
/// re-validate, then insert (pair absent) or merge back (pair present).
/// Validation runs even when no operation changed a field, so an operation
/// that nulls a required field cannot slip through.
async fn patch_course(
    State(store): State<SharedStore>,
    Path((author_id, course_id)): Path<(Uuid, Uuid)>,
    AppJson(document): AppJson<PatchDocument>,
) -> Result<axum::response::Response, AppError> {
    ensure_author(&store, author_id).await?;

    let existing = store
        .course(author_id, course_id)
        .await
        .map_err(map_store_error)?;
    let mut uow = UnitOfWork::new();

    match existing {
        None => {
            let mut rep = CourseForUpdate::default();
            document.apply(&mut rep).map_err(patch_failure)?;
            check_valid(rep.validate())?;

            let course = course_from_update(course_id, author_id, &rep);
            uow.add_course(author_id, course.clone());
            store.commit(uow).await.map_err(map_store_error)?;

            Ok(created(
                course_location(author_id, course_id),
                course_to_dto(&course),
            ))
        }
        Some(mut course) => {
            let mut rep = course_to_update_rep(&course);
            document.apply(&mut rep).map_err(patch_failure)?;
            check_valid(rep.validate())?;

            merge_update_rep(&rep, &mut course);
            uow.update_course(course);
            store.commit(uow).await.map_err(map_store_error)?;

            Ok(no_content())
        }
    }
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/authors/{authorId}/courses": {
                "get": {
                    "summary": "List an author's courses",
                    "tags": ["Courses"],
                    "responses": {
                        "200": {
                            "description": "Courses owned by the author",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": {"$ref": "#/components/schemas/Course"}
                                    }
                                }
                            }
                        },
                        "404": {
                            "description": "Author not found",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Create a course for an author",
                    "tags": ["Courses"],
                    "responses": {
                        "201": {
                            "description": "Course created",
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Course"}
                                }
                            }
                        },
                        "404": {
                            "description": "Author not found",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        },
                        "422": {
                            "description": "Validation failed",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                }
            },
            "/authors/{authorId}/courses/{courseId}": {
                "get": {
                    "summary": "Get a single course",
                    "tags": ["Courses"],
                    "responses": {
                        "200": {
                            "description": "The course",
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Course"}
                                }
                            }
                        },
                        "404": {
                            "description": "Author or course not found",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                },
                "put": {
                    "summary": "Fully replace a course, creating it at the requested id if absent",
                    "tags": ["Courses"],
                    "responses": {
                        "201": {"description": "Course created at the requested id"},
                        "204": {"description": "Course replaced"},
                        "404": {
                            "description": "Author not found",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        },
                        "422": {
                            "description": "Validation failed",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                },
                "patch": {
                    "summary": "Partially update a course with an ordered patch document",
                    "tags": ["Courses"],
                    "responses": {
                        "201": {"description": "Course created at the requested id"},
                        "204": {"description": "Course patched"},
                        "404": {
                            "description": "Author not found",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        },
                        "422": {
                            "description": "Patch application or validation failed",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Course": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "title": {"type": "string", "maxLength": models::TITLE_MAX_LEN},
                        "description": {"type": "string", "nullable": true, "maxLength": models::DESCRIPTION_MAX_LEN},
                        "author_id": {"type": "string", "format": "uuid"}
                    },
                    "required": ["id", "title", "author_id"]
                },
                "PatchOperation": {
                    "type": "object",
                    "properties": {
                        "op": {"type": "string", "enum": ["add", "remove", "replace", "move", "copy", "test"]},
                        "path": {"type": "string"},
                        "from": {"type": "string"},
                        "value": {}
                    },
                    "required": ["op", "path"]
                }
            }
        }
    })
}
