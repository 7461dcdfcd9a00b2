use serde_json::json;
use std::sync::Arc;
use tm::api::ApiClient;
use tm::store::{MemoryStore, Session};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_over(store: Arc<MemoryStore>, api: &str) -> ApiClient {
    let session = Session::new(store).with_api_override(Some(api.to_string()));
    ApiClient::new(session).unwrap()
}

#[tokio::test]
async fn test_captured_cookie_is_replayed_on_later_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "tm_session=abc; Path=/; HttpOnly")
                .set_body_json(json!({"user": {"email": "ada@example.com"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("cookie", "tm_session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_over(Arc::new(MemoryStore::new()), &server.uri());
    client
        .post("/auth/login", &json!({"email": "ada@example.com", "password": "pw"}))
        .await
        .unwrap();
    client.get("/orders").await.unwrap();
}

#[tokio::test]
async fn test_cookie_survives_into_a_new_client_over_the_same_store() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "tm_session=persisted; Path=/")
                .set_body_json(json!({"user": {}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .and(header("cookie", "tm_session=persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let first = client_over(store.clone(), &server.uri());
    first
        .post("/auth/login", &json!({"email": "x@y.z", "password": "pw"}))
        .await
        .unwrap();

    let second = client_over(store, &server.uri());
    second.get("/cart").await.unwrap();
}

#[tokio::test]
async fn test_rotated_cookie_replaces_the_stored_one() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "tm_session=first; Path=/")
                .set_body_json(json!({"user": {}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "tm_session=second; Path=/")
                .set_body_json(json!({"authenticated": true})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("cookie", "tm_session=second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_over(Arc::new(MemoryStore::new()), &server.uri());
    client
        .post("/auth/login", &json!({"email": "x@y.z", "password": "pw"}))
        .await
        .unwrap();
    client.get("/auth/status").await.unwrap();
    client.get("/orders").await.unwrap();
}

#[tokio::test]
async fn test_csrf_token_is_attached_to_mutations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/csrf-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"csrfToken": "tok123"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/watch-rules"))
        .and(header("x-csrf-token", "tok123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_over(Arc::new(MemoryStore::new()), &server.uri());
    client.fetch_csrf_token().await.unwrap();
    client
        .post("/watch-rules", &json!({"query": "coffee"}))
        .await
        .unwrap();
}
