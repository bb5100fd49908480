#![allow(dead_code)]

use std::sync::Arc;

use reqwest::Client;
use tempfile::TempDir;
use tokio::net::TcpListener;

use signed_users::api::create_router;
use signed_users::{AppState, Config, KeyStore};

/// Running server plus the directory holding its keys
pub struct TestServer {
    pub base_url: String,
    pub state: Arc<AppState>,
    pub keys: KeyStore,
    pub keys_dir: TempDir,
}

/// Start a test server on a random port with a fresh key pair
pub async fn start_test_server() -> TestServer {
    let keys_dir = TempDir::new().expect("Failed to create temp dir");
    let keys = KeyStore::obtain(keys_dir.path()).expect("Failed to obtain keys");

    let config = Config {
        host: "127.0.0.1".into(),
        port: 0,
        keys_dir: keys_dir.path().to_path_buf(),
        ..Config::default()
    };
    let state = AppState::new(config, &keys);
    let app = create_router(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestServer {
        base_url: format!("http://{}", addr),
        state,
        keys,
        keys_dir,
    }
}

/// Test client for JSON API calls
pub struct TestClient {
    pub base_url: String,
    pub client: Client,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            client: Client::new(),
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn patch<T: serde::Serialize>(&self, path: &str, body: &T) -> reqwest::Response {
        self.client
            .patch(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Create a user and return its id
    pub async fn create_user(&self, email: &str) -> i64 {
        let resp = self
            .post("/users", &serde_json::json!({ "email": email }))
            .await;
        assert_eq!(resp.status(), 201, "create {} failed", email);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }
}
