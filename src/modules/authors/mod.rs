//! Authors and author collections: filtered/paged listing, single lookups,
//! creation (optionally with nested courses), cascade deletion, and the
//! all-or-nothing batch read/create endpoints.

pub mod models;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::HeaderName;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Date, Month};
use uuid::Uuid;

use courselib_http::error::{AppError, FieldErrors};
use courselib_http::extract::AppJson;
use courselib_http::response::created;
use courselib_kernel::{InitCtx, Module};
use courselib_store::{Author, AuthorsCriteria, Course, Store, UnitOfWork};

use crate::modules::courses::models::course_from_creation;
use crate::modules::map_store_error;
use models::{author_from_creation, author_to_dto, AuthorDto, AuthorForCreation};

type SharedStore = Arc<dyn Store>;

/// Authors module: the parent resource plus its batch collection endpoints.
pub struct AuthorsModule {
    store: SharedStore,
}

impl AuthorsModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Put a handful of demo authors and courses into an empty store.
    async fn seed_demo_data(&self) -> anyhow::Result<()> {
        let existing = self.store.authors(&AuthorsCriteria::default()).await?;
        if existing.total_count > 0 {
            return Ok(());
        }

        let berry = Author::new(
            "Berry",
            "Griffin Beak Eldritch",
            Date::from_calendar_date(1650, Month::July, 23)?,
            "Ships",
        );
        let nancy = Author::new(
            "Nancy",
            "Swashbuckler Rye",
            Date::from_calendar_date(1668, Month::May, 21)?,
            "Rum",
        );
        let eli = Author::new(
            "Eli",
            "Ivory Bones Sweet",
            Date::from_calendar_date(1701, Month::December, 16)?,
            "Singing",
        );

        // Mutations apply in order; an author must be queued before its
        // courses so the ownership check sees it.
        let mut uow = UnitOfWork::new();
        let berry_id = berry.id;
        uow.add_author(berry);
        uow.add_author(nancy);
        uow.add_author(eli);
        uow.add_course(
            berry_id,
            Course::new(
                berry_id,
                "Commandeering a Ship Without Getting Caught",
                Some("Commandeering a ship in rough waters isn't easy.".to_string()),
            ),
        );
        uow.add_course(
            berry_id,
            Course::new(
                berry_id,
                "Overthrowing Mutiny",
                Some("Tips to avoid, or, if needed, overthrow mutiny.".to_string()),
            ),
        );

        self.store.commit(uow).await?;
        tracing::info!("seeded demo authors and courses");
        Ok(())
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.store.seed_demo_data {
            self.seed_demo_data().await?;
        }
        tracing::info!(module = self.name(), "authors module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/authors", get(list_authors).post(create_author))
            .route(
                "/authors/{author_id}",
                get(get_author).delete(delete_author),
            )
            .route("/authorcollections", post(create_author_collection))
            .route("/authorcollections/{ids}", get(get_author_collection))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }
}

/// Create a new instance of the authors module
pub fn create_module(store: SharedStore) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(store))
}

/// Query parameters accepted by `GET /authors`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorsQuery {
    main_category: Option<String>,
    search_query: Option<String>,
    page_number: Option<usize>,
    page_size: Option<usize>,
}

/// Pagination metadata exposed in the `X-Pagination` response header.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaginationMeta {
    total_count: usize,
    page_size: usize,
    current_page: usize,
    total_pages: usize,
    has_previous: bool,
    has_next: bool,
}

static X_PAGINATION: HeaderName = HeaderName::from_static("x-pagination");

async fn list_authors(
    State(store): State<SharedStore>,
    Query(query): Query<AuthorsQuery>,
) -> Result<axum::response::Response, AppError> {
    let criteria = AuthorsCriteria::new(
        query.main_category,
        query.search_query,
        query.page_number,
        query.page_size,
    );

    let page = store.authors(&criteria).await.map_err(map_store_error)?;

    let meta = PaginationMeta {
        total_count: page.total_count,
        page_size: page.page_size,
        current_page: page.page_number,
        total_pages: page.total_pages(),
        has_previous: page.has_previous(),
        has_next: page.has_next(),
    };
    let meta_header =
        serde_json::to_string(&meta).map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

    let body: Vec<AuthorDto> = page.items.iter().map(author_to_dto).collect();
    Ok(([(X_PAGINATION.clone(), meta_header)], Json(body)).into_response())
}

async fn get_author(
    State(store): State<SharedStore>,
    Path(author_id): Path<Uuid>,
) -> Result<Json<AuthorDto>, AppError> {
    let author = store
        .author(author_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| AppError::not_found(format!("author {author_id} does not exist")))?;
    Ok(Json(author_to_dto(&author)))
}

async fn create_author(
    State(store): State<SharedStore>,
    AppJson(payload): AppJson<AuthorForCreation>,
) -> Result<axum::response::Response, AppError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(AppError::validation(
            errors,
            "author payload failed validation",
        ));
    }

    let author = author_from_creation(&payload);
    let mut uow = UnitOfWork::new();
    uow.add_author(author.clone());
    for course in &payload.courses {
        uow.add_course(author.id, course_from_creation(author.id, course));
    }
    store.commit(uow).await.map_err(map_store_error)?;

    Ok(created(
        format!("/authors/{}", author.id),
        author_to_dto(&author),
    ))
}

async fn delete_author(
    State(store): State<SharedStore>,
    Path(author_id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let author = store
        .author(author_id)
        .await
        .map_err(map_store_error)?
        .ok_or_else(|| AppError::not_found(format!("author {author_id} does not exist")))?;

    let mut uow = UnitOfWork::new();
    uow.delete_author(author.id);
    store.commit(uow).await.map_err(map_store_error)?;

    Ok(courselib_http::response::no_content())
}

/// Batch read: every requested id must resolve or the whole request is
/// rejected. Duplicated ids count as distinct requests, so they trip the
/// count comparison.
async fn get_author_collection(
    State(store): State<SharedStore>,
    Path(ids): Path<String>,
) -> Result<Json<Vec<AuthorDto>>, AppError> {
    let ids = parse_id_list(&ids).map_err(|message| AppError::bad_request(message))?;

    let authors = store
        .authors_by_ids(&ids)
        .await
        .map_err(map_store_error)?;
    if authors.len() != ids.len() {
        return Err(AppError::not_found(
            "one or more requested authors do not exist",
        ));
    }

    // Respond in requested order; the store's order is unspecified.
    let by_id: HashMap<Uuid, Author> = authors.into_iter().map(|a| (a.id, a)).collect();
    let dtos: Vec<AuthorDto> = ids
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(author_to_dto)
        .collect();
    Ok(Json(dtos))
}

/// Batch create: assign ids, persist everything in one commit, and answer
/// with a composite location addressing the whole new collection.
async fn create_author_collection(
    State(store): State<SharedStore>,
    AppJson(payloads): AppJson<Vec<AuthorForCreation>>,
) -> Result<axum::response::Response, AppError> {
    if payloads.is_empty() {
        return Err(AppError::bad_request("author collection must not be empty"));
    }

    let mut errors = FieldErrors::new();
    for (index, payload) in payloads.iter().enumerate() {
        for (field, messages) in payload.validate() {
            errors.insert(format!("[{index}].{field}"), messages);
        }
    }
    if !errors.is_empty() {
        return Err(AppError::validation(
            errors,
            "author collection failed validation",
        ));
    }

    let mut uow = UnitOfWork::new();
    let mut authors = Vec::with_capacity(payloads.len());
    for payload in &payloads {
        let author = author_from_creation(payload);
        uow.add_author(author.clone());
        for course in &payload.courses {
            uow.add_course(author.id, course_from_creation(author.id, course));
        }
        authors.push(author);
    }
    store.commit(uow).await.map_err(map_store_error)?;

    let ids = authors
        .iter()
        .map(|a| a.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let dtos: Vec<AuthorDto> = authors.iter().map(author_to_dto).collect();
    Ok(created(format!("/authorcollections/({ids})"), dtos))
}

/// Parse a composite id path segment like `(id1,id2)` (parentheses
/// optional) into an ordered identifier sequence. Order and duplicates are
/// preserved.
pub fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(trimmed);

    if inner.trim().is_empty() {
        // `()` is an explicit empty collection; anything else blank is
        // malformed.
        return if trimmed == "()" {
            Ok(Vec::new())
        } else {
            Err("author id list must not be empty".to_string())
        };
    }

    inner
        .split(',')
        .map(|part| {
            let part = part.trim();
            Uuid::parse_str(part).map_err(|_| format!("'{part}' is not a valid author id"))
        })
        .collect()
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/authors": {
                "get": {
                    "summary": "List authors with filtering, search, and paging",
                    "tags": ["Authors"],
                    "parameters": [
                        {"name": "mainCategory", "in": "query", "schema": {"type": "string"}},
                        {"name": "searchQuery", "in": "query", "schema": {"type": "string"}},
                        {"name": "pageNumber", "in": "query", "schema": {"type": "integer", "minimum": 1}},
                        {"name": "pageSize", "in": "query", "schema": {"type": "integer", "minimum": 1, "maximum": 20}}
                    ],
                    "responses": {
                        "200": {
                            "description": "One page of authors; pagination metadata in the X-Pagination header",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": {"$ref": "#/components/schemas/Author"}
                                    }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Create an author, optionally with initial courses",
                    "tags": ["Authors"],
                    "responses": {
                        "201": {
                            "description": "Author created",
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Author"}
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
            "/authors/{authorId}": {
                "get": {
                    "summary": "Get a single author",
                    "tags": ["Authors"],
                    "responses": {
                        "200": {
                            "description": "The author",
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Author"}
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
                "delete": {
                    "summary": "Delete an author and all of its courses",
                    "tags": ["Authors"],
                    "responses": {
                        "204": {"description": "Author and owned courses deleted"},
                        "404": {
                            "description": "Author not found",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                }
            },
            "/authorcollections/({ids})": {
                "get": {
                    "summary": "Batch read authors by a comma-separated id list; all-or-nothing",
                    "tags": ["Author collections"],
                    "responses": {
                        "200": {
                            "description": "Every requested author",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": {"$ref": "#/components/schemas/Author"}
                                    }
                                }
                            }
                        },
                        "400": {
                            "description": "Malformed id list",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        },
                        "404": {
                            "description": "At least one requested author does not exist",
                            "content": {
                                "application/problem+json": {
                                    "schema": {"$ref": "#/components/schemas/ProblemDetails"}
                                }
                            }
                        }
                    }
                }
            },
            "/authorcollections": {
                "post": {
                    "summary": "Batch create authors in a single commit",
                    "tags": ["Author collections"],
                    "responses": {
                        "201": {
                            "description": "Every author created; composite location header",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": {"$ref": "#/components/schemas/Author"}
                                    }
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
            }
        },
        "components": {
            "schemas": {
                "Author": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "name": {"type": "string"},
                        "main_category": {"type": "string"},
                        "age": {"type": "integer"}
                    },
                    "required": ["id", "name", "main_category", "age"]
                }
            }
        }
    })
}
