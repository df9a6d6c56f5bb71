// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock servers for the backend content service and Gemini.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use fittrack::services::{BackendClient, GeminiClient};
use fittrack::storage::{MemoryStorage, SharedStorage};
use fittrack::Session;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const VALID_TOKEN: &str = "valid-jwt";
pub const PASSWORD: &str = "hunter22";
pub const EMAIL: &str = "sam@example.com";

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{}", addr)
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "data": null,
            "error": { "status": status.as_u16(), "name": "Error", "message": message }
        })),
    )
        .into_response()
}

// ─── Backend ─────────────────────────────────────────────────

/// Mutable state of the mock backend.
#[derive(Debug, Default)]
pub struct BackendState {
    /// The one registered account, if any
    pub user: Option<Value>,
    pub foods: Vec<Value>,
    pub activities: Vec<Value>,
    pub next_id: u64,
    /// `METHOD path` of every request, in order
    pub requests: Vec<String>,
    /// Body of the most recent write
    pub last_body: Option<Value>,
}

impl BackendState {
    /// State with an account for [`EMAIL`] / [`PASSWORD`].
    pub fn with_user(user: Value) -> Self {
        Self {
            user: Some(user),
            next_id: 100,
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type SharedBackend = Arc<Mutex<BackendState>>;

/// A user with a completed profile.
pub fn onboarded_user() -> Value {
    json!({
        "id": 1,
        "documentId": "user-doc-1",
        "username": "sam",
        "email": EMAIL,
        "provider": "local",
        "confirmed": true,
        "blocked": false,
        "age": 34,
        "weight": 80.5,
        "height": 178,
        "goal": "lose",
        "dailyCalorieIntake": 1800,
        "dailyCalorieBurn": 500
    })
}

/// A freshly registered user with no profile.
pub fn new_user() -> Value {
    json!({
        "id": 1,
        "documentId": "user-doc-1",
        "username": "sam",
        "email": EMAIL,
        "age": null,
        "weight": null,
        "goal": null
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", VALID_TOKEN).as_str())
}

fn record(state: &SharedBackend, line: String) -> std::sync::MutexGuard<'_, BackendState> {
    let mut guard = state.lock().unwrap();
    guard.requests.push(line);
    guard
}

async fn login(State(state): State<SharedBackend>, Json(body): Json<Value>) -> Response {
    let mut s = record(&state, "POST /api/auth/local".to_string());
    s.last_body = Some(body.clone());
    let Some(user) = s.user.clone() else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid identifier or password");
    };
    if body["identifier"] == user["email"] && body["password"] == PASSWORD {
        Json(json!({ "jwt": VALID_TOKEN, "user": user })).into_response()
    } else {
        error_body(StatusCode::BAD_REQUEST, "Invalid identifier or password")
    }
}

async fn register(State(state): State<SharedBackend>, Json(body): Json<Value>) -> Response {
    let mut s = record(&state, "POST /api/auth/local/register".to_string());
    s.last_body = Some(body.clone());
    if s.user.as_ref().is_some_and(|u| u["email"] == body["email"]) {
        return error_body(StatusCode::BAD_REQUEST, "Email or Username are already taken");
    }
    let user = json!({
        "id": 1,
        "documentId": "user-doc-1",
        "username": body["username"],
        "email": body["email"],
        "age": null,
        "weight": null,
        "goal": null
    });
    s.user = Some(user.clone());
    Json(json!({ "jwt": VALID_TOKEN, "user": user })).into_response()
}

async fn me(State(state): State<SharedBackend>, headers: HeaderMap) -> Response {
    let s = record(&state, "GET /api/users/me".to_string());
    if !authorized(&headers) {
        return error_body(StatusCode::UNAUTHORIZED, "Missing or invalid credentials");
    }
    match &s.user {
        Some(user) => Json(user.clone()).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn update_user(
    State(state): State<SharedBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, format!("PUT /api/users/{}", id));
    s.last_body = Some(body.clone());
    if !authorized(&headers) {
        return error_body(StatusCode::UNAUTHORIZED, "Missing or invalid credentials");
    }
    let Some(user) = s.user.as_mut() else {
        return error_body(StatusCode::NOT_FOUND, "Not Found");
    };
    if let (Some(user), Some(fields)) = (user.as_object_mut(), body.as_object()) {
        for (key, value) in fields {
            user.insert(key.clone(), value.clone());
        }
    }
    Json(user.clone()).into_response()
}

fn list_response(items: &[Value]) -> Response {
    Json(json!({
        "data": items,
        "meta": { "pagination": { "page": 1, "pageSize": 25, "pageCount": 1, "total": items.len() } }
    }))
    .into_response()
}

async fn list_foods(State(state): State<SharedBackend>, headers: HeaderMap) -> Response {
    let s = record(&state, "GET /api/foodlogs".to_string());
    if !authorized(&headers) {
        return error_body(StatusCode::FORBIDDEN, "Forbidden");
    }
    list_response(&s.foods)
}

async fn create_food(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, "POST /api/foodlogs".to_string());
    s.last_body = Some(body.clone());
    if !authorized(&headers) {
        return error_body(StatusCode::FORBIDDEN, "Forbidden");
    }
    let id = s.next_id();
    let mut entry = body["data"].clone();
    entry["id"] = json!(id);
    entry["documentId"] = json!(format!("food-{}", id));
    entry["createdAt"] = json!("2024-01-02T08:00:00.000Z");
    s.foods.push(entry.clone());
    Json(json!({ "data": entry, "meta": {} })).into_response()
}

async fn delete_food(
    State(state): State<SharedBackend>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut s = record(&state, format!("DELETE /api/foodlogs/{}", document_id));
    if !authorized(&headers) {
        return error_body(StatusCode::FORBIDDEN, "Forbidden");
    }
    match s.foods.iter().position(|f| f["documentId"] == document_id.as_str()) {
        Some(index) => {
            let removed = s.foods.remove(index);
            Json(json!({ "data": removed, "meta": {} })).into_response()
        }
        None => error_body(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn list_activities(State(state): State<SharedBackend>, headers: HeaderMap) -> Response {
    let s = record(&state, "GET /api/activity-logs".to_string());
    if !authorized(&headers) {
        return error_body(StatusCode::FORBIDDEN, "Forbidden");
    }
    list_response(&s.activities)
}

async fn create_activity(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, "POST /api/activity-logs".to_string());
    s.last_body = Some(body.clone());
    if !authorized(&headers) {
        return error_body(StatusCode::FORBIDDEN, "Forbidden");
    }
    let id = s.next_id();
    let mut entry = body["data"].clone();
    entry["id"] = json!(id);
    entry["documentId"] = json!(format!("act-{}", id));
    entry["createdAt"] = json!("2024-01-02T09:00:00.000Z");
    s.activities.push(entry.clone());
    Json(json!({ "data": entry, "meta": {} })).into_response()
}

/// Deletes answer 204 with no body here, like the current backend does.
async fn delete_activity(
    State(state): State<SharedBackend>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut s = record(&state, format!("DELETE /api/activity-logs/{}", document_id));
    if !authorized(&headers) {
        return error_body(StatusCode::FORBIDDEN, "Forbidden");
    }
    match s.activities.iter().position(|a| a["documentId"] == document_id.as_str()) {
        Some(index) => {
            s.activities.remove(index);
            StatusCode::NO_CONTENT.into_response()
        }
        None => error_body(StatusCode::NOT_FOUND, "Not Found"),
    }
}

/// Router emulating the backend content service.
pub fn backend_router(state: SharedBackend) -> Router {
    Router::new()
        .route("/api/auth/local", post(login))
        .route("/api/auth/local/register", post(register))
        .route("/api/users/me", get(me))
        .route("/api/users/{id}", put(update_user))
        .route("/api/foodlogs", get(list_foods).post(create_food))
        .route("/api/foodlogs/{document_id}", delete(delete_food))
        .route("/api/activity-logs", get(list_activities).post(create_activity))
        .route("/api/activity-logs/{document_id}", delete(delete_activity))
        .with_state(state)
}

/// A running mock backend plus client storage to point sessions at it.
pub struct TestBackend {
    pub url: String,
    pub state: SharedBackend,
    pub storage: Arc<MemoryStorage>,
}

impl TestBackend {
    pub async fn start(state: BackendState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let url = spawn(backend_router(state.clone())).await;
        Self {
            url,
            state,
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    pub fn shared_storage(&self) -> SharedStorage {
        self.storage.clone()
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(self.url.clone(), self.shared_storage())
    }

    pub fn session(&self) -> Session {
        Session::new(self.client(), self.shared_storage())
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.state.lock().unwrap().last_body.clone()
    }
}

// ─── Gemini ──────────────────────────────────────────────────

/// Canned Gemini responses keyed by model name.
#[derive(Debug, Default)]
pub struct GeminiState {
    pub responses: HashMap<String, (u16, Value)>,
    /// Models called, in order
    pub attempts: Vec<String>,
    pub last_key: Option<String>,
    pub last_body: Option<Value>,
}

pub type SharedGemini = Arc<Mutex<GeminiState>>;

/// A successful generateContent body whose first part is `text`.
pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

/// Gemini's error envelope.
pub fn gemini_error(code: u16, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message, "status": "ERROR" } })
}

async fn generate(
    State(state): State<SharedGemini>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let model = action
        .strip_suffix(":generateContent")
        .unwrap_or(&action)
        .to_string();
    let mut s = state.lock().unwrap();
    s.attempts.push(model.clone());
    s.last_key = query.get("key").cloned();
    s.last_body = Some(body);

    match s.responses.get(&model) {
        Some((status, body)) => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body.clone()),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(gemini_error(404, &format!("models/{} is not found", model))),
        )
            .into_response(),
    }
}

/// A running mock Gemini endpoint.
pub struct TestGemini {
    pub url: String,
    pub state: SharedGemini,
}

impl TestGemini {
    pub async fn start(responses: Vec<(&str, u16, Value)>) -> Self {
        let state = Arc::new(Mutex::new(GeminiState {
            responses: responses
                .into_iter()
                .map(|(model, status, body)| (model.to_string(), (status, body)))
                .collect(),
            ..Default::default()
        }));
        let app = Router::new()
            .route("/v1beta/models/{action}", post(generate))
            .with_state(state.clone());
        let url = spawn(app).await;
        Self {
            url: format!("{}/v1beta", url),
            state,
        }
    }

    /// Client trying `models` in order.
    pub fn client(&self, models: &[&str]) -> GeminiClient {
        GeminiClient::new("test-api-key", models.iter().map(|m| m.to_string()).collect())
            .with_base_url(self.url.clone())
    }

    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().attempts.clone()
    }
}
