//! Response helpers shared by resource modules.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// 201 Created with a Location header and JSON body.
pub fn created(location: String, body: impl Serialize) -> Response {
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(body)).into_response()
}

/// 204 No Content.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_sets_location_header() {
        let response = created("/authors/abc".to_string(), json!({"id": "abc"}));

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/authors/abc")
        );
    }

    #[test]
    fn no_content_has_no_body_status() {
        assert_eq!(no_content().status(), StatusCode::NO_CONTENT);
    }
}
