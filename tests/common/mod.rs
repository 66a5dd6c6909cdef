#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bytes::Bytes;
use proxy_shelf::engine::{FetchError, ListFetcher};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

/// Fetcher that replays a queue of scripted results per URL.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, VecDeque<Result<Vec<u8>, String>>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, url: &str, body: &[u8]) {
        self.push(url, Ok(body.to_vec()));
    }

    pub fn push_err(&self, url: &str, cause: &str) {
        self.push(url, Err(cause.to_string()));
    }

    fn push(&self, url: &str, result: Result<Vec<u8>, String>) {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(url.as_str())
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(body)) => Ok(Bytes::from(body)),
            Some(Err(cause)) => Err(FetchError::Other(cause)),
            None => Err(FetchError::Other(format!("unscripted fetch of {}", url))),
        }
    }
}

/// Serves `app` on an ephemeral localhost port.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
