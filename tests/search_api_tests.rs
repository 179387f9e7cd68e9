mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, post_json, spawn_app, user_payload};
use tower::ServiceExt;

async fn seed_users(app: &Router) {
    let rows = [
        ("key-a001", "alice01", "alice@example.com", 10115),
        ("key-a002", "bob0002", "bob@example.com", 20095),
        ("key-a003", "carol03", "carol@example.com", 80331),
        ("key-a004", "dave004", "dave@example.com", 1067),
        ("key-a005", "erin005", "erin@example.com", 50667),
    ];

    for (key, name, email, postal) in rows {
        let mut payload = user_payload(key, name, email);
        payload["postal_code"] = serde_json::json!(postal);
        let response = post_json(app, "/api/v1/users", &payload).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_search_default_request() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let body = body_json(post_json(&app, "/api/v1/users/search", &serde_json::json!({})).await).await;

    let data = &body["data"];
    assert_eq!(data["totalElements"], 5);
    assert_eq!(data["totalPages"], 1);
    assert_eq!(data["page"], 0);
    assert_eq!(data["size"], 10);
    assert_eq!(data["last"], true);
    assert_eq!(data["content"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_search_filter_coerces_string_numbers() {
    let app = spawn_app().await;
    seed_users(&app).await;

    // String "10000" against an integer column still compares numerically.
    let request = serde_json::json!({
        "filters": [{ "field": "postalCode", "operator": "gte", "value": "10000" }],
        "sortBy": "postal_code"
    });

    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    let content = body["data"]["content"].as_array().unwrap();
    assert_eq!(content.len(), 4);
    assert_eq!(content[0]["postal_code"], 10115);
}

#[tokio::test]
async fn test_search_like_operator() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({
        "filters": [{ "field": "email", "operator": "like", "value": "carol" }]
    });

    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    let content = body["data"]["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["user_name"], "carol03");
}

#[tokio::test]
async fn test_search_in_operator() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({
        "filters": [{ "field": "user_name", "operator": "in", "value": ["alice01", "erin005"] }]
    });

    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    assert_eq!(body["data"]["totalElements"], 2);
}

#[tokio::test]
async fn test_search_unknown_field_is_rejected() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({
        "filters": [{ "field": "favoriteColor", "operator": "eq", "value": "blue" }]
    });

    let response = post_json(&app, "/api/v1/users/search", &request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_like_on_non_text_is_rejected() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({
        "filters": [{ "field": "postal_code", "operator": "like", "value": "10" }]
    });

    let response = post_json(&app, "/api/v1/users/search", &request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_password_is_not_filterable() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({
        "filters": [{ "field": "password", "operator": "eq", "value": "x" }]
    });

    let response = post_json(&app, "/api/v1/users/search", &request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_bogus_sort_falls_back_to_id() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({ "sortBy": "doesNotExist" });

    let response = post_json(&app, "/api/v1/users/search", &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let content = body["data"]["content"].as_array().unwrap();
    let ids: Vec<i64> = content
        .iter()
        .map(|u| u["user_id"].as_i64().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn test_search_sort_descending() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({ "sortBy": "user_name", "sortDir": "desc" });

    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    let content = body["data"]["content"].as_array().unwrap();
    assert_eq!(content[0]["user_name"], "erin005");
    assert_eq!(content[4]["user_name"], "alice01");
}

#[tokio::test]
async fn test_search_free_text() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({ "search": "dave" });

    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    assert_eq!(body["data"]["totalElements"], 1);
    assert_eq!(body["data"]["content"][0]["user_name"], "dave004");
}

#[tokio::test]
async fn test_search_pagination_metadata() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({ "page": 0, "size": 2, "sortBy": "user_name" });
    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    assert_eq!(body["data"]["totalElements"], 5);
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(body["data"]["last"], false);

    let request = serde_json::json!({ "page": 2, "size": 2, "sortBy": "user_name" });
    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    assert_eq!(body["data"]["content"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["last"], true);
}

#[tokio::test]
async fn test_search_is_repeatable() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({ "sortBy": "email", "size": 3 });

    let first = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    let second = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn test_search_zero_size_is_rejected() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let request = serde_json::json!({ "size": 0 });

    let response = post_json(&app, "/api/v1/users/search", &request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_filters_soft_deleted_via_audit_path() {
    let app = spawn_app().await;
    seed_users(&app).await;

    let victims = body_json(
        post_json(
            &app,
            "/api/v1/users/search",
            &serde_json::json!({
                "filters": [{ "field": "user_name", "operator": "eq", "value": "bob0002" }]
            }),
        )
        .await,
    )
    .await;
    let id = victims["data"]["content"][0]["user_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/users/{id}/deactivate"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = serde_json::json!({
        "filters": [{ "field": "audit.deleted", "operator": "eq", "value": true }]
    });
    let body = body_json(post_json(&app, "/api/v1/users/search", &request).await).await;
    assert_eq!(body["data"]["totalElements"], 1);
    assert_eq!(body["data"]["content"][0]["user_name"], "bob0002");

    // Soft-deleted rows still show up in an unfiltered search.
    let body =
        body_json(post_json(&app, "/api/v1/users/search", &serde_json::json!({})).await).await;
    assert_eq!(body["data"]["totalElements"], 5);
}
