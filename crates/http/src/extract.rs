//! Request extractors whose rejections use the [`AppError`] envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body; a malformed or incomplete body is a 400 validation error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters; an unparsable segment is a 400 validation error.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        pages: i32,
    }

    fn app() -> Router {
        Router::new()
            .route("/items", post(|AppJson(_): AppJson<Payload>| async { "ok" }))
            .route("/items/{id}", get(|AppPath(id): AppPath<Uuid>| async move { id.to_string() }))
    }

    async fn error_body(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_field_is_validation_error() {
        let (status, body) = error_body(
            Request::post("/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"][0]["field"], "body");
    }

    #[tokio::test]
    async fn wrong_type_and_missing_content_type_are_validation_errors() {
        let (status, _) = error_body(
            Request::post("/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"pages":"many"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = error_body(
            Request::post("/items")
                .body(Body::from(r#"{"pages":1}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn unparsable_path_is_validation_error() {
        let (status, body) =
            error_body(Request::get("/items/not-a-uuid").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "path");
    }
}
