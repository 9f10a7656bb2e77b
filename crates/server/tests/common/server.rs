//! Server test utilities.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use grove_core::config::AppConfig;
use grove_server::{AppState, create_router};
use grove_store::{SqliteStore, Store};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server backed by a temporary SQLite file.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let db_path = temp_dir.path().join("grove.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create store"),
        );

        let mut config = AppConfig::for_testing();
        config.store.path = db_path;
        modifier(&mut config);

        let state = AppState::new(config, store);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying store.
    pub fn store(&self) -> Arc<dyn Store> {
        self.state.store.clone()
    }

    /// Log in as `username`, creating the account on first use, and return
    /// the raw session token for use as a bearer token.
    pub async fn login(&self, username: &str) -> String {
        let (status, headers, _body) = request_with_headers(
            &self.router,
            "POST",
            "/auth/login",
            Some(json!({ "username": username })),
            &[],
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed for '{username}'");

        let cookie = headers
            .get(header::SET_COOKIE)
            .expect("Login response had no Set-Cookie")
            .to_str()
            .expect("Set-Cookie was not valid UTF-8");
        session_token_from_cookie(cookie)
    }
}

/// Pull the raw session token out of a Set-Cookie header value.
#[allow(dead_code)]
pub fn session_token_from_cookie(set_cookie: &str) -> String {
    let pair = set_cookie
        .split(';')
        .next()
        .expect("Set-Cookie had no cookie pair");
    let (_name, token) = pair.split_once('=').expect("Cookie pair had no '='");
    token.to_string()
}

/// Make a request with arbitrary extra headers. Returns status, response
/// headers, and the parsed JSON body (Null when empty or not JSON).
#[allow(dead_code)]
pub async fn request_with_headers(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, String)],
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let response_headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, response_headers, json)
}

/// Make a JSON request, optionally authenticated with a bearer token.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let headers: Vec<(&str, String)> = match auth_token {
        Some(token) => vec![("Authorization", format!("Bearer {token}"))],
        None => Vec::new(),
    };

    let (status, _headers, json) =
        request_with_headers(router, method, uri, body, &headers).await;
    (status, json)
}
