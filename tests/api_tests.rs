//! API tests driving the router in-process

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lending_server::{api, config::AppConfig, repository::Repository, AppState};

fn app() -> Router {
    api::router(AppState::new(AppConfig::default(), Repository::new()))
}

/// Send a request, returning status, the session cookie if one was set, and
/// the JSON body (Null when empty)
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let session = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, session, body)
}

async fn register(app: &Router, username: &str, role: &str) -> (String, i64) {
    let (status, cookie, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "username": username,
            "password": "secret",
            "role": role,
            "name": username,
            "email": format!("{}@example.org", username),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (cookie.expect("session cookie"), body["id"].as_i64().unwrap())
}

async fn create_book(app: &Router, cookie: &str, isbn: &str, quantity: i64, available: i64) -> i64 {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/books",
        Some(cookie),
        Some(json!({
            "title": "Dom Casmurro",
            "author": "Machado de Assis",
            "isbn": isbn,
            "quantity": quantity,
            "available": available,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

async fn available(app: &Router, cookie: &str, book_id: i64) -> i64 {
    let (status, _, body) = send(app, Method::GET, &format!("/api/books/{}", book_id), Some(cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    body["available"].as_i64().unwrap()
}

fn due_in_a_week() -> String {
    (chrono::Utc::now() + chrono::Duration::days(7)).to_rfc3339()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, _, body) = send(&app, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = app();

    for uri in ["/api/books", "/api/loans", "/api/users", "/api/user"] {
        let (status, _, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "Unauthorized");
    }

    let (status, _, _) = send(&app, Method::GET, "/api/books", Some("sid=bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gate() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let (student, _) = register(&app, "ana", "student").await;

    let book = json!({ "title": "1984", "author": "George Orwell", "isbn": "9788535914849" });
    let (status, _, body) = send(&app, Method::POST, "/api/books", Some(&student), Some(book.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _, _) = send(&app, Method::GET, "/api/users", Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(&app, Method::POST, "/api/books", Some(&admin), Some(book)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 1);
    assert_eq!(body["available"], 1);

    let (status, _, _) = send(&app, Method::DELETE, &format!("/api/books/{}", body["id"]), Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(&app, Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("password").is_none());
}

#[tokio::test]
async fn test_elevated_self_registration_refused() {
    let app = app();
    register(&app, "admin", "admin").await;

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "username": "mallory",
            "password": "secret",
            "role": "admin",
            "name": "Mallory",
            "email": "mallory@example.org",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_loan_lifecycle() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let (student, student_id) = register(&app, "ana", "student").await;
    let book_id = create_book(&app, &admin, "9788535910682", 5, 5).await;

    let (status, _, loan) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&student),
        Some(json!({ "bookId": book_id, "dueDate": due_in_a_week() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", loan);
    assert_eq!(loan["userId"], student_id);
    assert!(loan["returnDate"].is_null());
    assert_eq!(available(&app, &admin, book_id).await, 4);

    let loan_uri = format!("/api/loans/{}", loan["id"]);
    let returned = json!({ "returnDate": chrono::Utc::now().to_rfc3339() });

    // Students cannot edit loans
    let (status, _, _) = send(&app, Method::PUT, &loan_uri, Some(&student), Some(returned.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(available(&app, &admin, book_id).await, 4);

    let (status, _, body) = send(&app, Method::PUT, &loan_uri, Some(&admin), Some(returned.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["returnDate"].is_string());
    assert_eq!(available(&app, &admin, book_id).await, 5);

    let (status, _, body) = send(&app, Method::PUT, &loan_uri, Some(&admin), Some(returned)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "StateError");
    assert_eq!(available(&app, &admin, book_id).await, 5);
}

#[tokio::test]
async fn test_borrower_returns_own_loan() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let (student, _) = register(&app, "ana", "student").await;
    let book_id = create_book(&app, &admin, "9788574068794", 3, 3).await;

    let (_, _, loan) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&student),
        Some(json!({ "bookId": book_id, "dueDate": due_in_a_week() })),
    )
    .await;

    let uri = format!("/api/loans/{}/return", loan["id"]);
    let (status, _, body) = send(&app, Method::POST, &uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["returnDate"].is_string());
    assert_eq!(available(&app, &admin, book_id).await, 3);

    let (status, _, _) = send(&app, Method::POST, &uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_return_is_rejected() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let book_id = create_book(&app, &admin, "9788574068794", 3, 3).await;

    let (_, _, loan) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&admin),
        Some(json!({ "bookId": book_id, "dueDate": due_in_a_week() })),
    )
    .await;
    assert_eq!(available(&app, &admin, book_id).await, 2);

    let uri = format!("/api/loans/{}/return", loan["id"]);
    let (status, _, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&admin),
        Some(json!({ "returnDate": "not-a-date" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let (_, _, current) = send(&app, Method::GET, &format!("/api/loans/{}", loan["id"]), Some(&admin), None).await;
    assert!(current["returnDate"].is_null());
    assert_eq!(available(&app, &admin, book_id).await, 2);

    // An explicit empty object still defaults the date
    let (status, _, body) = send(&app, Method::POST, &uri, Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["returnDate"].is_string());
    assert_eq!(available(&app, &admin, book_id).await, 3);
}

#[tokio::test]
async fn test_role_checked_before_payload() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let (student, _) = register(&app, "ana", "student").await;
    let book_id = create_book(&app, &admin, "9788535910682", 1, 1).await;

    let garbage = json!({ "title": 42 });
    let cases = [
        (Method::POST, "/api/books".to_string()),
        (Method::PUT, format!("/api/books/{}", book_id)),
        (Method::POST, "/api/users".to_string()),
        (Method::PUT, "/api/users/1".to_string()),
        (Method::PUT, "/api/loans/1".to_string()),
    ];
    for (method, uri) in cases {
        let (status, _, body) = send(&app, method, &uri, Some(&student), Some(garbage.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["error"], "Forbidden");
    }

    let (status, _, _) = send(&app, Method::POST, "/api/books", None, Some(garbage)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_copy_available() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let (student, _) = register(&app, "ana", "student").await;
    let book_id = create_book(&app, &admin, "9788535914849", 2, 0).await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&student),
        Some(json!({ "bookId": book_id, "dueDate": due_in_a_week() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(available(&app, &admin, book_id).await, 0);

    let (_, _, loans) = send(&app, Method::GET, "/api/loans", Some(&admin), None).await;
    assert!(loans.as_array().unwrap().is_empty());

    // Unknown book
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&student),
        Some(json!({ "bookId": 999, "dueDate": due_in_a_week() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_loan_listing_is_private() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;
    let (ana, ana_id) = register(&app, "ana", "student").await;
    let (bob, bob_id) = register(&app, "bob", "visitor").await;
    let book_id = create_book(&app, &admin, "9788535910682", 5, 5).await;

    for cookie in [&ana, &bob] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/loans",
            Some(cookie),
            Some(json!({ "bookId": book_id, "dueDate": due_in_a_week() })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Borrowing on behalf of someone else is reserved to staff
    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&ana),
        Some(json!({ "userId": bob_id, "bookId": book_id, "dueDate": due_in_a_week() })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for (cookie, id) in [(&ana, ana_id), (&bob, bob_id)] {
        let (_, _, loans) = send(&app, Method::GET, "/api/loans", Some(cookie), None).await;
        let loans = loans.as_array().unwrap();
        assert_eq!(loans.len(), 1);
        assert!(loans.iter().all(|l| l["userId"] == id));
    }

    let (_, _, loans) = send(&app, Method::GET, "/api/loans", Some(&admin), None).await;
    assert_eq!(loans.as_array().unwrap().len(), 2);

    let (_, _, stats) = send(&app, Method::GET, "/api/stats", Some(&ana), None).await;
    assert_eq!(stats["activeLoans"], 1);
    assert!(stats["users"].is_null());

    let (_, _, stats) = send(&app, Method::GET, "/api/stats", Some(&admin), None).await;
    assert_eq!(stats["activeLoans"], 2);
    assert_eq!(stats["availableCopies"], 3);
    assert_eq!(stats["users"], 3);
}

#[tokio::test]
async fn test_malformed_payloads() {
    let app = app();
    let (admin, _) = register(&app, "admin", "admin").await;

    let (status, _, body) = send(&app, Method::POST, "/api/books", Some(&admin), Some(json!({ "title": "No ISBN" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(&admin),
        Some(json!({ "title": "T", "author": "A", "isbn": "1", "quantity": 1, "available": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, Method::PUT, "/api/books/42", Some(&admin), Some(json!({ "title": "Gone" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = app();
    let (first, _) = register(&app, "ana", "student").await;

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "ana", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "ana", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "student");
    let cookie = cookie.unwrap();

    let (status, _, body) = send(&app, Method::GET, "/api/user", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ana");

    let (status, _, _) = send(&app, Method::POST, "/api/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, Method::GET, "/api/user", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Other sessions stay open
    let (status, _, _) = send(&app, Method::GET, "/api/user", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
}
