// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared test fixtures: an in-process fake hub/proxy and log capture.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::config::HubAuthConfig;

/// A request received by [`FakeHub`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

struct FakeHubState {
    cookie_status: StatusCode,
    cookie_body: String,
    user_status: StatusCode,
    user_body: Value,
    start_status: StatusCode,
    admin_status: StatusCode,
    admin_set_cookie: Option<String>,
    route_status: StatusCode,
    ping_status: StatusCode,
    requests: Vec<RecordedRequest>,
}

/// Scriptable stand-in for the hub API and the proxy API.
///
/// Both services are served from the same listener; they are told apart by
/// path (`/hub/api/...` vs `/api/routes/...`).
#[derive(Clone)]
pub struct FakeHub {
    inner: Arc<Mutex<FakeHubState>>,
}

impl FakeHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeHubState {
                cookie_status: StatusCode::OK,
                cookie_body: json!({"name": "alice"}).to_string(),
                user_status: StatusCode::OK,
                user_body: json!({"name": "alice", "server": "/user/alice/", "pending": null}),
                start_status: StatusCode::CREATED,
                admin_status: StatusCode::OK,
                admin_set_cookie: None,
                route_status: StatusCode::CREATED,
                ping_status: StatusCode::OK,
                requests: Vec::new(),
            })),
        }
    }

    pub fn set_cookie_response(&self, status: StatusCode, body: Value) {
        self.set_cookie_raw_body(status, &body.to_string());
    }

    pub fn set_cookie_raw_body(&self, status: StatusCode, body: &str) {
        let mut state = self.inner.lock().unwrap();
        state.cookie_status = status;
        state.cookie_body = body.to_string();
    }

    pub fn set_user_response(&self, status: StatusCode, body: Value) {
        let mut state = self.inner.lock().unwrap();
        state.user_status = status;
        state.user_body = body;
    }

    pub fn set_start_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().start_status = status;
    }

    pub fn set_admin_response(&self, status: StatusCode, set_cookie: Option<&str>) {
        let mut state = self.inner.lock().unwrap();
        state.admin_status = status;
        state.admin_set_cookie = set_cookie.map(str::to_string);
    }

    pub fn set_route_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().route_status = status;
    }

    pub fn set_ping_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().ping_status = status;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Number of recorded requests whose method and path match.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Serve on an ephemeral localhost port and return its base URL.
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn handle(
    State(hub): State<FakeHub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let mut state = hub.inner.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    if path.starts_with("/api/routes/") {
        let status = state.route_status;
        let body = if status == StatusCode::CREATED {
            String::new()
        } else {
            "route refused".to_string()
        };
        return (status, body).into_response();
    }
    if path.starts_with("/hub/api/authorizations/cookie/") {
        return (
            state.cookie_status,
            [(header::CONTENT_TYPE, "application/json")],
            state.cookie_body.clone(),
        )
            .into_response();
    }
    if path == "/hub/api" {
        return (state.ping_status, axum::Json(json!({"version": "4.1.0"}))).into_response();
    }
    if let Some(rest) = path.strip_prefix("/hub/api/users/") {
        if rest.ends_with("/admin-access") {
            let mut response = state.admin_status.into_response();
            if let Some(cookie) = &state.admin_set_cookie {
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, cookie.parse().unwrap());
            }
            return response;
        }
        if rest.ends_with("/server") {
            return state.start_status.into_response();
        }
        return (state.user_status, axum::Json(state.user_body.clone())).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

/// Base URL of a localhost port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Configuration pointing the hub API and proxy at `upstream_base`
/// (as returned by [`FakeHub::spawn`]), plus any `overrides`.
pub fn config_for(upstream_base: &str, overrides: &[(&str, &str)]) -> HubAuthConfig {
    let authority = upstream_base.trim_start_matches("http://");
    let (host, port) = authority.rsplit_once(':').unwrap();

    let mut vars: HashMap<String, String> = [
        ("HOST", "127.0.0.1"),
        ("PORT", "5000"),
        ("HUBAUTH_HUB_BASE_URL", "http://hub.example"),
        ("HUBAUTH_HUBAPI_ADDRESS", host),
        ("HUBAUTH_HUBAPI_PORT", port),
        ("HUBAUTH_PROXY_ADDRESS", host),
        ("HUBAUTH_PROXY_PORT", port),
        ("HUBAUTH_GRADERS", "alice,bob"),
        ("HUBAUTH_HUBAPI_TOKEN", "hub-secret"),
        ("HUBAUTH_PROXY_TOKEN", "proxy-secret"),
        ("COURSE_ID", "course101"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    HubAuthConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// In-memory log sink for asserting on emitted tracing events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of log lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing events into a buffer until the guard drops.
///
/// `#[tokio::test]` runs on a current-thread runtime, so events emitted by
/// the code under test land in the buffer.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
