//! Common test utilities for integration tests
//!
//! Every test gets a fresh router over an in-memory store, seeded with two
//! users (each holding one live token) and three tasks: two owned by the first
//! user, one by the second. Mail goes to a [`RecordingNotifier`].

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tasknest_api::app::{build_router, AppState};
use tasknest_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MailConfig, UploadConfig};
use tasknest_shared::auth::password::hash_password;
use tasknest_shared::auth::tokens::TokenService;
use tasknest_shared::models::task::{CreateTask, Task};
use tasknest_shared::models::user::{CreateUser, User};
use tasknest_shared::notify::{Message, Notifier, NotifyError};
use tasknest_shared::store::{memory::MemoryStore, Store, TaskStore, UserStore};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const MULTIPART_BOUNDARY: &str = "tasknest-test-boundary";

/// A seeded account with its plaintext password and live token
pub struct Seeded {
    pub user: User,
    pub password: String,
    pub token: String,
}

/// Notifier that keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Message>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<Message> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub app: axum::Router,
    pub user_one: Seeded,
    pub user_two: Seeded,
    pub task_one: Task,
    pub task_two: Task,
    pub task_three: Task,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
            readme_path: "no-such-dir/README.md".to_string(),
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        mail: MailConfig {
            sendgrid_api_key: None,
            from: "noreply@tasknest.local".to_string(),
        },
        upload: UploadConfig {
            avatar_max_bytes: 1_000_000,
        },
    }
}

async fn seed_user(
    store: &Arc<MemoryStore>,
    tokens: &TokenService,
    name: &str,
    email: &str,
    password: &str,
) -> Seeded {
    let user = store
        .create_user(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            age: 0,
        })
        .await
        .unwrap();
    let token = tokens.issue(&user).await.unwrap();

    Seeded {
        user,
        password: password.to_string(),
        token,
    }
}

async fn seed_task(store: &Arc<MemoryStore>, owner: &User, description: &str, completed: bool) -> Task {
    store
        .create_task(CreateTask {
            owner_id: owner.id,
            description: description.to_string(),
            completed,
        })
        .await
        .unwrap()
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Same seed data, served with a custom configuration
    pub async fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let dyn_store: Arc<dyn Store> = store.clone();
        let tokens = TokenService::new(SECRET, dyn_store.clone());

        let user_one = seed_user(&store, &tokens, "Mike", "mike@example.com", "56what!!").await;
        let user_two = seed_user(&store, &tokens, "Jess", "jess@example.com", "myhouse099@@").await;

        let task_one = seed_task(&store, &user_one.user, "First task", false).await;
        let task_two = seed_task(&store, &user_one.user, "Second task", true).await;
        let task_three = seed_task(&store, &user_two.user, "Third task", true).await;

        let state = AppState::new(dyn_store, notifier.clone(), config);
        let app = build_router(state);

        TestContext {
            store,
            notifier,
            app,
            user_one,
            user_two,
            task_one,
            task_two,
            task_three,
        }
    }

    /// Sends a request and returns the status and the JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                panic!("non-JSON body with {}: {}", status, String::from_utf8_lossy(&body))
            })
        };

        (status, json)
    }

    /// JSON request with an optional bearer token
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(json_request(method, uri, token, body)).await
    }

    pub async fn find_user(&self, user: &User) -> Option<User> {
        self.store.find_user(user.id).await.unwrap()
    }

    pub async fn find_task(&self, task: &Task) -> Option<Task> {
        self.store.find_task(task.id, task.owner_id).await.unwrap()
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// `multipart/form-data` body with a single file field
pub fn multipart_request(uri: &str, token: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A small PNG picture
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 144, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Helper to wait for condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout_secs: u64) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);

    loop {
        if condition().await {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Timeout waiting for condition");
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
