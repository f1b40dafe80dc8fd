//! End-to-end tests over the composed application router.

use axum::http::{self, Request, StatusCode};
use axum::Router;
use courselib_app::app;
use courselib_kernel::settings::Settings;
use courselib_store::MemoryStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    app(MemoryStore::new_shared(), &Settings::default())
        .await
        .expect("router should build")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn delete(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn author_payload(first: &str, last: &str, category: &str) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "date_of_birth": "1650-07-23",
        "main_category": category,
    })
}

async fn create_author(app: &Router, first: &str, last: &str, category: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/authors",
            author_payload(first, last, category),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn create_course(app: &Router, author_id: &str, title: &str, description: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/authors/{author_id}/courses"),
            json!({"title": title, "description": description}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}

// --- health ---

#[tokio::test]
async fn healthz_responds_ok() {
    let app = test_app().await;
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// --- authors ---

#[tokio::test]
async fn create_author_returns_location_and_projection() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/authors",
            author_payload("Berry", "Eldritch", "Ships"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loc = location(&response);

    let author = body_json(response).await;
    assert_eq!(author["name"], "Berry Eldritch");
    assert_eq!(author["main_category"], "Ships");
    assert!(author["age"].as_i64().unwrap() > 0);
    assert_eq!(loc, format!("/authors/{}", author["id"].as_str().unwrap()));

    let fetched = app.clone().oneshot(get(&loc)).await.unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(fetched).await["id"], author["id"]);
}

#[tokio::test]
async fn get_missing_author_is_404_problem() {
    let app = test_app().await;
    let response = app
        .oneshot(get("/authors/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["title"], "Not Found");
}

#[tokio::test]
async fn create_author_with_blank_fields_is_422_with_field_errors() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/authors",
            json!({
                "first_name": "  ",
                "last_name": "Rye",
                "date_of_birth": "1668-05-21",
                "main_category": "",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["errors"]["first_name"][0].is_string());
    assert!(body["errors"]["main_category"][0].is_string());
}

#[tokio::test]
async fn author_list_filters_by_category_case_insensitively() {
    let app = test_app().await;
    create_author(&app, "Berry", "Eldritch", "Ships").await;
    create_author(&app, "Nancy", "Rye", "Rum").await;
    create_author(&app, "Eli", "Sweet", "Singing").await;

    let response = app
        .clone()
        .oneshot(get("/authors?mainCategory=rUm"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let authors = body_json(response).await;
    let authors = authors.as_array().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["main_category"], "Rum");
}

#[tokio::test]
async fn author_list_searches_the_synthesized_text() {
    let app = test_app().await;
    create_author(&app, "Berry", "Eldritch", "Ships").await;
    create_author(&app, "Nancy", "Rye", "Rum").await;

    let response = app
        .clone()
        .oneshot(get("/authors?searchQuery=ELDR"))
        .await
        .unwrap();
    let authors = body_json(response).await;
    assert_eq!(authors.as_array().unwrap().len(), 1);

    // Search also matches against the category.
    let response = app
        .clone()
        .oneshot(get("/authors?searchQuery=rum"))
        .await
        .unwrap();
    let authors = body_json(response).await;
    assert_eq!(authors.as_array().unwrap().len(), 1);
    assert_eq!(authors.as_array().unwrap()[0]["main_category"], "Rum");
}

#[tokio::test]
async fn author_pages_are_disjoint_and_carry_metadata() {
    let app = test_app().await;
    create_author(&app, "Berry", "Eldritch", "Ships").await;
    create_author(&app, "Nancy", "Rye", "Rum").await;
    create_author(&app, "Eli", "Sweet", "Singing").await;

    let first = app
        .clone()
        .oneshot(get("/authors?pageNumber=1&pageSize=2"))
        .await
        .unwrap();
    let meta: Value = serde_json::from_str(
        first
            .headers()
            .get("x-pagination")
            .and_then(|v| v.to_str().ok())
            .expect("pagination header"),
    )
    .unwrap();
    assert_eq!(meta["totalCount"], 3);
    assert_eq!(meta["totalPages"], 2);
    assert_eq!(meta["hasNext"], true);
    assert_eq!(meta["hasPrevious"], false);

    let first_page = body_json(first).await;
    let second = app
        .clone()
        .oneshot(get("/authors?pageNumber=2&pageSize=2"))
        .await
        .unwrap();
    let second_page = body_json(second).await;

    let first_ids: Vec<&str> = first_page
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    let second_ids: Vec<&str> = second_page
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();

    assert_eq!(first_ids.len(), 2);
    assert_eq!(second_ids.len(), 1);
    assert!(second_ids.iter().all(|id| !first_ids.contains(id)));
}

// --- author collections ---

#[tokio::test]
async fn batch_read_is_all_or_nothing() {
    let app = test_app().await;
    let a = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let b = create_author(&app, "Nancy", "Rye", "Rum").await;
    let (a, b) = (a["id"].as_str().unwrap(), b["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(get(&format!("/authorcollections/({a},{b})")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let authors = body_json(response).await;
    let ids: Vec<&str> = authors
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![a, b]);

    // One unresolved id rejects the whole batch.
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/authorcollections/({a},00000000-0000-0000-0000-000000000000)"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Duplicates count as distinct requests and trip the count check.
    let response = app
        .clone()
        .oneshot(get(&format!("/authorcollections/({a},{a})")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A malformed list never reaches the resolver.
    let response = app
        .clone()
        .oneshot(get("/authorcollections/(not-an-id)"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_create_commits_all_and_locates_the_collection() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/authorcollections",
            json!([
                author_payload("Berry", "Eldritch", "Ships"),
                author_payload("Nancy", "Rye", "Rum"),
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loc = location(&response);
    assert!(loc.starts_with("/authorcollections/("));
    assert!(loc.contains(','));

    let created = body_json(response).await;
    assert_eq!(created.as_array().unwrap().len(), 2);

    // The composite location resolves back to the created collection.
    let response = app.clone().oneshot(get(&loc)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn batch_create_with_an_invalid_member_creates_nothing() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/authorcollections",
            json!([
                author_payload("Berry", "Eldritch", "Ships"),
                author_payload("", "Rye", "Rum"),
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["errors"]["[1].first_name"][0].is_string());

    let response = app.clone().oneshot(get("/authors")).await.unwrap();
    let meta: Value = serde_json::from_str(
        response
            .headers()
            .get("x-pagination")
            .and_then(|v| v.to_str().ok())
            .unwrap(),
    )
    .unwrap();
    assert_eq!(meta["totalCount"], 0);
}

// --- courses ---

#[tokio::test]
async fn course_crud_under_an_author() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();

    let course = create_course(&app, author_id, "Sailing 101", "Knots and sails").await;
    let course_id = course["id"].as_str().unwrap();
    assert_eq!(course["author_id"].as_str().unwrap(), author_id);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Sailing 101");

    // Unknown author on the courses path is 404.
    let response = app
        .clone()
        .oneshot(get(
            "/authors/00000000-0000-0000-0000-000000000000/courses",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown course under a known author is 404.
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/authors/{author_id}/courses/00000000-0000-0000-0000-000000000000"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_course_without_title_is_422() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/authors/{author_id}/courses"),
            json!({"description": "No title"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["errors"]["title"][0], "title is required");
}

// --- PUT upsert ---

#[tokio::test]
async fn put_creates_a_course_at_the_requested_id() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course_id = "018f4e9a-1111-7aaa-bbbb-cccccccccccc";

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!({"title": "Navigation", "description": "Stars and charts"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["id"].as_str().unwrap(), course_id);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["description"], "Stars and charts");
}

#[tokio::test]
async fn put_fully_overwrites_and_clears_omitted_description() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course = create_course(&app, author_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!({"title": "Sailing, revised"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    let fetched = body_json(response).await;
    assert_eq!(fetched["title"], "Sailing, revised");
    assert!(fetched["description"].is_null());
}

#[tokio::test]
async fn put_without_a_title_is_422() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!(
                "/authors/{author_id}/courses/018f4e9a-2222-7aaa-bbbb-cccccccccccc"
            ),
            json!({"description": "Missing title"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["errors"]["title"][0], "title is required");
}

#[tokio::test]
async fn put_cannot_steal_a_course_id_from_another_author() {
    let app = test_app().await;
    let berry = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let nancy = create_author(&app, "Nancy", "Rye", "Rum").await;
    let berry_id = berry["id"].as_str().unwrap();
    let nancy_id = nancy["id"].as_str().unwrap();

    let course = create_course(&app, berry_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/authors/{nancy_id}/courses/{course_id}"),
            json!({"title": "Hijacked"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The original stays with its owner, untouched.
    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{berry_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["title"], "Sailing");
}

// --- PATCH upsert ---

#[tokio::test]
async fn patch_replaces_a_field_and_keeps_the_rest() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course = create_course(&app, author_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!([{"op": "replace", "path": "/title", "value": "Navigation"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    let fetched = body_json(response).await;
    assert_eq!(fetched["title"], "Navigation");
    assert_eq!(fetched["description"], "Open water");
}

#[tokio::test]
async fn patch_removing_the_title_is_422_and_leaves_the_course_unchanged() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course = create_course(&app, author_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!([{"op": "remove", "path": "/title"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["errors"]["title"][0], "title is required");

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["title"], "Sailing");
}

#[tokio::test]
async fn patch_creates_a_course_when_the_document_is_complete() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course_id = "018f4e9a-3333-7aaa-bbbb-cccccccccccc";

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!([
                {"op": "add", "path": "/title", "value": "Charting"},
                {"op": "add", "path": "/description", "value": "Maps"},
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"].as_str().unwrap(), course_id);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn patch_create_with_an_incomplete_document_creates_nothing() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course_id = "018f4e9a-4444-7aaa-bbbb-cccccccccccc";

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!([{"op": "add", "path": "/description", "value": "No title"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_with_an_unknown_path_is_a_field_addressed_422() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course = create_course(&app, author_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!([{"op": "replace", "path": "/price", "value": "10"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["errors"]["/price"][0].is_string());
}

#[tokio::test]
async fn patch_with_a_malformed_document_is_400() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course = create_course(&app, author_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    // Not an array of operations.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/authors/{author_id}/courses/{course_id}"),
            json!({"op": "replace", "path": "/title", "value": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
}

// --- cascade delete ---

#[tokio::test]
async fn deleting_an_author_removes_its_courses() {
    let app = test_app().await;
    let author = create_author(&app, "Berry", "Eldritch", "Ships").await;
    let author_id = author["id"].as_str().unwrap();
    let course = create_course(&app, author_id, "Sailing", "Open water").await;
    let course_id = course["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(delete(&format!("/authors/{author_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get(&format!("/authors/{author_id}/courses/{course_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting again is 404, not idempotent success.
    let response = app
        .clone()
        .oneshot(delete(&format!("/authors/{author_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- demo seeding ---

#[tokio::test]
async fn seeding_populates_an_empty_store() {
    let mut settings = Settings::default();
    settings.store.seed_demo_data = true;

    let app = app(MemoryStore::new_shared(), &settings).await.unwrap();
    let response = app.oneshot(get("/authors")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let authors = body_json(response).await;
    assert_eq!(authors.as_array().unwrap().len(), 3);
}
