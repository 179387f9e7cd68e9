use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use userhub::config::Config;
use userhub::db::Store;
use userhub::storage::ObjectStore;

/// In-memory stand-in for the S3 store so tests never need a live endpoint.
pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn remove_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expiry: Duration) -> anyhow::Result<String> {
        Ok(format!(
            "https://example.test/{}/{}?X-Amz-Expires={}",
            self.bucket,
            key,
            expiry.as_secs()
        ))
    }
}

pub async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();

    // Single connection so every query sees the same in-memory database.
    let store = Store::with_pool_options(&config.general.database_url, 1, 1)
        .await
        .expect("Failed to create store");

    let storage = Arc::new(MemoryObjectStore::new(&config.storage.bucket));

    let state = userhub::api::create_app_state(store, storage, config);
    userhub::api::router(state)
}

pub fn user_payload(key: &str, name: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "idempotency_key": key,
        "user_name": name,
        "email": email,
        "password": "hunter2!",
        "date_of_birth": "1990-05-01",
        "date_of_leaving": "2031-05-01",
        "postal_code": 10115
    })
}

pub async fn post_json(app: &Router, uri: &str, body: &serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
