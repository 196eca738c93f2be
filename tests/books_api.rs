use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bookstore_app::{build_registry, prepare_database};
use bookstore_kernel::settings::{Environment, Settings};
use bookstore_kernel::InitCtx;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
}

impl TestApp {
    /// Fresh in-memory store seeded with a single book.
    async fn seeded() -> Self {
        let settings = Settings::for_environment(Environment::Test);
        let registry = build_registry();
        let db = prepare_database(&settings, &registry).await.unwrap();

        sqlx::query(
            "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
             VALUES ('0691161518', 'http://a.co/eobPtX2', 'Matthew Lane', 'english', 264,
                     'Princeton University Press',
                     'Power-Up: Unlocking the Hidden Mathematics in Video Games', 2017)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        Self {
            router: bookstore_http::build_router(&registry, &ctx).unwrap(),
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

fn power_up() -> Value {
    json!({
        "isbn": "0691161518",
        "amazon_url": "http://a.co/eobPtX2",
        "author": "Matthew Lane",
        "language": "english",
        "pages": 264,
        "publisher": "Princeton University Press",
        "title": "Power-Up: Unlocking the Hidden Mathematics in Video Games",
        "year": 2017
    })
}

fn coding_job() -> Value {
    json!({
        "isbn": "1749129578",
        "amazon_url": "http://a_url",
        "author": "James Edwards",
        "language": "english",
        "pages": 300,
        "publisher": "Penguin Books",
        "title": "Finding a Coding Job (As a Non-Coder)",
        "year": 2023
    })
}

#[tokio::test]
async fn list_returns_all_books() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [power_up()] }));
}

#[tokio::test]
async fn create_with_valid_payload_echoes_book() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("POST", "/books", Some(coding_job())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": coding_job() }));

    let (status, body) = app.send("GET", "/books/1749129578", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": coding_job() }));
}

#[tokio::test]
async fn create_with_any_missing_field_is_rejected() {
    let app = TestApp::seeded().await;
    let fields: Vec<String> = coding_job().as_object().unwrap().keys().cloned().collect();
    assert_eq!(fields.len(), 8);

    for field in fields {
        let mut payload = coding_job();
        payload.as_object_mut().unwrap().remove(&field);

        let (status, body) = app.send("POST", "/books", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {field}");
        assert_eq!(body["error"]["status"], 400);
        assert_eq!(body["error"]["details"][0]["field"], field.as_str());
        assert_eq!(body["error"]["details"][0]["error"], "required");

        let (_, body) = app.send("GET", "/books", None).await;
        assert_eq!(body, json!({ "books": [power_up()] }), "missing {field}");
    }
}

#[tokio::test]
async fn create_with_wrong_types_is_rejected() {
    let app = TestApp::seeded().await;
    let mut payload = coding_job();
    payload["pages"] = json!(-1);
    payload["publisher"] = json!(42);
    payload["year"] = json!("not a number");

    let (status, body) = app.send("POST", "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 3);

    let (_, body) = app.send("GET", "/books", None).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_with_existing_isbn_fails_and_keeps_record() {
    let app = TestApp::seeded().await;
    let mut payload = power_up();
    payload["title"] = json!("A different title");

    let (status, body) = app.send("POST", "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "conflict");

    let (_, body) = app.send("GET", "/books/0691161518", None).await;
    assert_eq!(body, json!({ "book": power_up() }));
}

#[tokio::test]
async fn create_with_malformed_json_is_bad_request() {
    let app = TestApp::seeded().await;
    let request = Request::builder()
        .method("POST")
        .uri("/books")
        .header("content-type", "application/json")
        .body(Body::from("{\"isbn\": "))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_single_book() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("GET", "/books/0691161518", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": power_up() }));
}

#[tokio::test]
async fn get_unknown_isbn_is_not_found() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("GET", "/books/1234", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn put_with_full_mutable_set_updates_book() {
    let app = TestApp::seeded().await;
    let mut payload = power_up();
    payload.as_object_mut().unwrap().remove("isbn");
    payload["year"] = json!(2018);

    let (status, body) = app.send("PUT", "/books/0691161518", Some(payload)).await;
    let mut expected = power_up();
    expected["year"] = json!(2018);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": expected }));
}

#[tokio::test]
async fn put_with_partial_payload_leaves_other_fields() {
    let app = TestApp::seeded().await;
    let payload = json!({ "author": "Some Guy", "pages": 150, "title": "Some Book" });

    let (status, body) = app.send("PUT", "/books/0691161518", Some(payload)).await;
    let mut expected = power_up();
    expected["author"] = json!("Some Guy");
    expected["pages"] = json!(150);
    expected["title"] = json!("Some Book");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": expected.clone() }));

    let (_, body) = app.send("GET", "/books/0691161518", None).await;
    assert_eq!(body, json!({ "book": expected }));
}

#[tokio::test]
async fn put_with_constraint_violations_is_rejected() {
    let app = TestApp::seeded().await;
    let payload = json!({ "author": "Some Guy", "pages": -1, "title": 42 });

    let (status, _) = app.send("PUT", "/books/0691161518", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send("GET", "/books/0691161518", None).await;
    assert_eq!(body, json!({ "book": power_up() }));
}

#[tokio::test]
async fn put_with_isbn_is_rejected() {
    let app = TestApp::seeded().await;
    let payload = json!({
        "isbn": "0691161518",
        "author": "Some Guy",
        "pages": 150,
        "title": "Some Book"
    });

    let (status, body) = app.send("PUT", "/books/0691161518", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["error"], "immutable");
}

#[tokio::test]
async fn put_to_unknown_isbn_is_not_found() {
    let app = TestApp::seeded().await;
    let payload = json!({ "author": "Some Guy", "pages": 150, "title": "Some Book" });

    let (status, _) = app.send("PUT", "/books/1234", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_existing_book() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("DELETE", "/books/0691161518", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = app.send("GET", "/books/0691161518", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_book_is_not_found() {
    let app = TestApp::seeded().await;
    let (status, _) = app.send("DELETE", "/books/1234", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_lists_book_routes() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("GET", "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{isbn}"]["delete"].is_object());
}

#[tokio::test]
async fn swagger_document_lists_book_routes() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send("GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openapi"], "3.1.0");
    assert!(body["paths"]["/books"]["get"].is_object());
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{isbn}"]["put"].is_object());
    assert!(body["components"]["schemas"]["Book"].is_object());
}
