use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use rolodex_accounts::Account;
use rolodex_db::{create_pool, run_migrations, DbRuntimeSettings, Record};
use rolodex_server::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_app() -> (axum::Router, rolodex_db::DbPool) {
    // Single pooled connection: every checkout sees the same in-memory db.
    let settings = DbRuntimeSettings {
        pool_max_size: 1,
        ..Default::default()
    };
    let pool = create_pool(":memory:", settings).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }
    (app(AppState { pool: pool.clone() }), pool)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("PUT")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("DELETE")
        .body(Body::empty())
        .unwrap()
}

fn sample_payload(name: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "address": "221B Baker Street",
        "phone_number": "+1-555-0101",
        "date_joined": "2024-06-10",
    })
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (app, _pool) = setup_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_account() {
    let (app, pool) = setup_app();

    let response = app
        .oneshot(post_json("/accounts", &sample_payload("Kai")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response
        .headers()
        .get("location")
        .expect("created response should carry a Location header")
        .to_str()
        .unwrap()
        .to_string();

    let body = body_json(response).await;
    let id = body["id"].as_i64().expect("created account should have an id");
    assert_eq!(location, format!("/accounts/{id}"));
    assert_eq!(body["name"], "Kai");
    assert_eq!(body["email"], "kai@example.com");
    assert_eq!(body["date_joined"], "2024-06-10");

    // Verify DB
    {
        let conn = pool.get().unwrap();
        let account = Account::find(&conn, id).unwrap().expect("should be persisted");
        assert_eq!(account.name, "Kai");
        assert_eq!(account.phone_number.as_deref(), Some("+1-555-0101"));
    }
}

#[tokio::test]
async fn test_get_account() {
    let (app, _pool) = setup_app();

    let response = app
        .clone()
        .oneshot(post_json("/accounts", &sample_payload("Noor")))
        .await
        .unwrap();
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .oneshot(get(&format!("/accounts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, created);
}

#[tokio::test]
async fn test_get_account_not_found() {
    let (app, _pool) = setup_app();

    let response = app.oneshot(get("/accounts/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_accounts() {
    let (app, _pool) = setup_app();

    let response = app.clone().oneshot(get("/accounts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    for n in 1..=5 {
        let response = app
            .clone()
            .oneshot(post_json("/accounts", &sample_payload(&format!("Member{n}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.clone().oneshot(get("/accounts")).await.unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 5);

    // Deleting one drops the count to four
    let victim = listed[2]["id"].as_i64().unwrap();
    let response = app
        .clone()
        .oneshot(delete(&format!("/accounts/{victim}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/accounts")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_list_accounts_by_name() {
    let (app, _pool) = setup_app();

    for name in ["Kai", "Kai", "Noor"] {
        let response = app
            .clone()
            .oneshot(post_json("/accounts", &sample_payload(name)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.clone().oneshot(get("/accounts?name=Kai")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let matches = body.as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|acc| acc["name"] == "Kai"));

    // Exact match only, and no-match is an empty list rather than an error
    let response = app.clone().oneshot(get("/accounts?name=kai")).await.unwrap();
    assert_eq!(body_json(response).await, json!([]));

    let response = app.oneshot(get("/accounts?name=Zed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_update_account() {
    let (app, _pool) = setup_app();

    let response = app
        .clone()
        .oneshot(post_json("/accounts", &sample_payload("Mara")))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_i64().unwrap();

    let mut updated = sample_payload("Mara");
    updated["email"] = json!("new@example.com");
    let response = app
        .clone()
        .oneshot(put_json(&format!("/accounts/{id}"), &updated))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], id);
    assert_eq!(body["email"], "new@example.com");

    let response = app.oneshot(get(&format!("/accounts/{id}"))).await.unwrap();
    assert_eq!(body_json(response).await["email"], "new@example.com");
}

#[tokio::test]
async fn test_update_account_not_found() {
    let (app, _pool) = setup_app();

    let response = app
        .oneshot(put_json("/accounts/424242", &sample_payload("Mara")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_account_is_idempotent() {
    let (app, _pool) = setup_app();

    let response = app
        .clone()
        .oneshot(post_json("/accounts", &sample_payload("Rhea")))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(delete(&format!("/accounts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/accounts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting again is still 204
    let response = app
        .oneshot(delete(&format!("/accounts/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
