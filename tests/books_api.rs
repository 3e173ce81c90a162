use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use libris_app::books::BooksModule;
use libris_kernel::{InitCtx, Module, ModuleRegistry, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    module: Arc<BooksModule<libris_app::books::InMemoryUnitOfWork>>,
}

fn app() -> TestApp {
    let module = Arc::new(BooksModule::in_memory());
    let mut registry = ModuleRegistry::new();
    registry.register(module.clone()).unwrap();
    let router = libris_http::build_router(&registry, &Settings::default());
    TestApp { router, module }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn clean_code() -> Value {
    json!({
        "title": "Clean Code",
        "author": "Robert C. Martin",
        "isbn": "978-0132350884",
        "published_date": "2008-08-01T00:00:00Z",
        "page_count": 464
    })
}

#[tokio::test]
async fn create_returns_201_with_location() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/books")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(clean_code().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let book: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(location, format!("/api/books/{}", book["id"].as_str().unwrap()));
    assert_eq!(book["status"], "available");
    assert_eq!(book["page_count"], 464);

    let (status, fetched) = send(&app.router, Method::GET, &location, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, book);
}

#[tokio::test]
async fn clean_code_scenario_over_http() {
    let app = app();
    let (status, created) = send(&app.router, Method::POST, "/api/books", Some(clean_code())).await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, updated) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(json!({ "title": "Clean Code (2nd)", "author": "Robert C. Martin", "page_count": 480 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["page_count"], 480);
    assert_eq!(updated["isbn"], "978-0132350884");
    assert!(updated["updated_at"].is_string());

    let (status, _) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_create_is_400_and_stores_nothing() {
    let app = app();
    let mut body = clean_code();
    body["title"] = json!("   ");

    let (status, error) = send(&app.router, Method::POST, "/api/books", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "validation_error");
    assert_eq!(error["error"]["details"][0]["field"], "title");

    let (status, list) = send(&app.router, Method::GET, "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn update_rejections() {
    let app = app();
    let missing = format!("/api/books/{}", uuid_like());
    let payload = json!({ "title": "T", "author": "A", "page_count": 10 });

    let (status, _) = send(&app.router, Method::PUT, &missing, Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, created) = send(&app.router, Method::POST, "/api/books", Some(clean_code())).await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());
    let (status, _) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(json!({ "title": "T", "author": "A", "page_count": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unchanged) = send(&app.router, Method::GET, &uri, None).await;
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn checkout_and_return_cycle() {
    let app = app();
    let (_, created) = send(&app.router, Method::POST, "/api/books", Some(clean_code())).await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, book) = send(&app.router, Method::POST, &format!("{uri}/checkout"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["status"], "checked_out");

    let (status, body) = send(&app.router, Method::POST, &format!("{uri}/checkout"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, book) = send(&app.router, Method::POST, &format!("{uri}/return"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["status"], "available");

    let (status, _) = send(&app.router, Method::POST, &format!("{uri}/return"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_id_is_rejected() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/api/books/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn incomplete_body_is_400_with_error_envelope() {
    let app = app();
    let mut body = clean_code();
    body.as_object_mut().unwrap().remove("page_count");

    let (status, error) = send(&app.router, Method::POST, "/api/books", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "validation_error");
    assert_eq!(error["error"]["details"][0]["field"], "body");

    let (_, created) = send(&app.router, Method::POST, "/api/books", Some(clean_code())).await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());
    let (status, error) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(json!({ "title": "T", "author": "A", "page_count": "many" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "validation_error");

    let (_, list) = send(&app.router, Method::GET, "/api/books", None).await;
    assert_eq!(list, json!([created]));
}

#[tokio::test]
async fn concurrent_checkouts_admit_one_borrower() {
    let app = app();
    let (_, created) = send(&app.router, Method::POST, "/api/books", Some(clean_code())).await;
    let uri = format!("/api/books/{}/checkout", created["id"].as_str().unwrap());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let router = app.router.clone();
            let uri = uri.clone();
            tokio::spawn(async move { send(&router, Method::POST, &uri, None).await.0 })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        7
    );
}

#[tokio::test]
async fn seeded_catalog_is_listed() {
    let app = app();
    let settings = Settings::default();
    app.module
        .start(&InitCtx {
            settings: &settings,
        })
        .await
        .unwrap();

    let (status, list) = send(&app.router, Method::GET, "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    let mut titles: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    assert_eq!(
        titles,
        vec!["Clean Code", "Design Patterns", "The Pragmatic Programmer"]
    );
}

#[tokio::test]
async fn requests_after_stop_are_unavailable() {
    let app = app();
    app.module.stop().await.unwrap();

    let (status, body) = send(&app.router, Method::POST, "/api/books", Some(clean_code())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "unavailable");
}

#[tokio::test]
async fn module_health_and_docs() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/books/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = send(&app.router, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/api/books"]["post"].is_object());
    assert!(spec["paths"]["/api/books/{id}/checkout"]["post"].is_object());
}

fn uuid_like() -> &'static str {
    "6f1c2a4e-8f0b-4c2d-9a51-3b7e0d6f9c11"
}
