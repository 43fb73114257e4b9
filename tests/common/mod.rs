//! Test utilities and common setup.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chat_relay::completion::{
    ChatMessage, ChunkStream, CompletionChunk, CompletionClient, CompletionError,
};
use chat_relay::config::RetryPolicy;
use chat_relay::{db, router, AppState};
use futures::StreamExt;
use serde_json::Value;
use sqlx::AnyPool;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// What the scripted completion service does on one call.
pub enum Attempt {
    Refuse(CompletionError),
    Chunks(Vec<Result<CompletionChunk, CompletionError>>),
}

impl Attempt {
    pub fn text(parts: &[&str]) -> Self {
        Attempt::Chunks(parts.iter().map(|p| Ok(CompletionChunk::text(*p))).collect())
    }
}

/// Completion service that replays a fixed script and records what it was asked.
pub struct ScriptedCompletion {
    attempts: Mutex<VecDeque<Attempt>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match self.attempts.lock().unwrap().pop_front() {
            Some(Attempt::Refuse(err)) => Err(err),
            Some(Attempt::Chunks(chunks)) => Ok(futures::stream::iter(chunks).boxed()),
            None => Ok(futures::stream::empty().boxed()),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: AnyPool,
    pub completion: Arc<ScriptedCompletion>,
}

/// Create a test application backed by an in-memory database.
pub async fn test_app(attempts: Vec<Attempt>) -> TestApp {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let completion = Arc::new(ScriptedCompletion::new(attempts));
    let state = Arc::new(AppState {
        db_pool: pool.clone(),
        completion: completion.clone(),
        retry: RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(5),
        },
    });

    TestApp {
        router: router(state, Vec::new()),
        pool,
        completion,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn create_room(&self) -> String {
        let response = self.request(Method::POST, "/chat/rooms", None).await;
        let json = body_json(response).await;
        json["id"].as_str().unwrap().to_string()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Collect the `data:` frames of a finished event stream.
pub async fn stream_frames(response: Response<Body>) -> Vec<Value> {
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    text.split("\n\n")
        .filter_map(|frame| frame.trim().strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}
