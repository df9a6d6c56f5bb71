// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend content service client.
//!
//! Handles:
//! - Bearer token injection (read from client storage on every call)
//! - Error extraction from `{ "error": { "message": ... } }` bodies
//! - `{ "data": ... }` envelopes on list and create
//! - Normalizing raw records into typed entries

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    ActivityEntry, AuthResponse, Credentials, DocumentId, EntryId, FoodEntry, MealType,
    NewActivityEntry, NewFoodEntry, ProfileUpdate, User, UserId,
};
use crate::storage::{read_token, SharedStorage};
use crate::time_utils::today_local;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;

/// Client for the backend REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    storage: SharedStorage,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `http://localhost:1337`).
    pub fn new(base_url: impl Into<String>, storage: SharedStorage) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, storage)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        storage: SharedStorage,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            storage,
        }
    }

    /// Build a client honoring the configured URL and timeout.
    pub fn from_config(config: &Config, storage: SharedStorage) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http(http, config.backend_url.clone(), storage))
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    pub fn user(&self) -> UserApi<'_> {
        UserApi { client: self }
    }

    pub fn food_logs(&self) -> LogsApi<'_, FoodEntry> {
        LogsApi {
            client: self,
            _record: PhantomData,
        }
    }

    pub fn activity_logs(&self) -> LogsApi<'_, ActivityEntry> {
        LogsApi {
            client: self,
            _record: PhantomData,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Start a request, attaching the stored token if there is one.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let builder = self.http.request(method, self.url(path));
        Ok(match read_token(self.storage.as_ref())? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Start a request that must not carry a token (login, registration).
    fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a request and parse the JSON body, mapping failures.
    ///
    /// The body is read whatever the status; a non-2xx response becomes
    /// [`AppError::Http`] carrying `error.message` when the server gave one.
    /// A successful response with an empty body yields `Value::Null`.
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(request = what, error = %e, "Backend request failed");
            AppError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await?;
        let json: Option<Value> = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body).ok()
        };

        if !status.is_success() {
            let message = json
                .as_ref()
                .and_then(|j| j.pointer("/error/message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty());
            tracing::warn!(
                request = what,
                status = status.as_u16(),
                server_message = message,
                "Backend error"
            );
            return Err(match message {
                Some(message) => AppError::Http {
                    status: status.as_u16(),
                    message: message.to_string(),
                },
                None => AppError::request_failed(status.as_u16()),
            });
        }

        tracing::debug!(request = what, status = status.as_u16(), "Backend response");

        match json {
            Some(json) => Ok(json),
            None if body.trim().is_empty() => Ok(Value::Null),
            None => Err(AppError::InvalidRecord(format!("{}: body is not JSON", what))),
        }
    }
}

/// Parse a value into `T`, naming the record kind on failure.
fn parse_record<T: DeserializeOwned>(value: Value, kind: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AppError::InvalidRecord(format!("{}: {}", kind, e)))
}

/// Take the `data` member of an envelope.
fn unwrap_data(mut json: Value, kind: &str) -> Result<Value> {
    match json.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(AppError::InvalidRecord(format!(
            "{}: response has no data",
            kind
        ))),
        Some(data) => Ok(data),
    }
}

// ─── Auth ────────────────────────────────────────────────────

/// `auth/local` and `auth/local/register`.
pub struct AuthApi<'a> {
    client: &'a BackendClient,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: String,
    email: &'a str,
    password: &'a str,
}

impl AuthApi<'_> {
    /// Exchange credentials for a token and the user profile.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let body = LoginBody {
            identifier: &credentials.email,
            password: &credentials.password,
        };
        let json = self
            .client
            .send(
                self.client.anonymous(Method::POST, "auth/local").json(&body),
                "POST auth/local",
            )
            .await?;
        parse_record(json, "login response")
    }

    /// Create an account. The username defaults to the email's local part.
    pub async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let body = RegisterBody {
            username: credentials.registration_username(),
            email: &credentials.email,
            password: &credentials.password,
        };
        let json = self
            .client
            .send(
                self.client
                    .anonymous(Method::POST, "auth/local/register")
                    .json(&body),
                "POST auth/local/register",
            )
            .await?;
        parse_record(json, "registration response")
    }
}

// ─── User ────────────────────────────────────────────────────

/// `users/me` and `users/{id}`. Both respond with flat objects.
pub struct UserApi<'a> {
    client: &'a BackendClient,
}

impl UserApi<'_> {
    /// Profile of the user owning the stored token.
    pub async fn me(&self) -> Result<User> {
        let json = self
            .client
            .send(self.client.request(Method::GET, "users/me")?, "GET users/me")
            .await?;
        parse_record(json, "user")
    }

    /// Apply a flat partial update and return the updated profile.
    pub async fn update(&self, id: UserId, update: &ProfileUpdate) -> Result<User> {
        let path = format!("users/{}", id);
        let json = self
            .client
            .send(
                self.client.request(Method::PUT, &path)?.json(update),
                "PUT users/{id}",
            )
            .await?;
        parse_record(json, "user")
    }
}

// ─── Log collections ─────────────────────────────────────────

/// A log entry type stored in a backend collection.
pub trait LogRecord: Sized {
    /// Create payload
    type New: Serialize + Clone;

    /// Collection path below `/api/`.
    const PATH: &'static str;

    /// Record kind for error messages.
    const KIND: &'static str;

    /// Fill in the date of a create payload when the caller left it out.
    fn with_default_date(new: &Self::New, today: NaiveDate) -> Self::New;

    /// Parse a raw backend record, defaulting a missing date to `today`.
    fn normalize(raw: Value, today: NaiveDate) -> Result<Self>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFoodLog {
    id: EntryId,
    document_id: DocumentId,
    name: String,
    calories: u32,
    meal_type: MealType,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl LogRecord for FoodEntry {
    type New = NewFoodEntry;
    const PATH: &'static str = "foodlogs";
    const KIND: &'static str = "food log";

    fn with_default_date(new: &NewFoodEntry, today: NaiveDate) -> NewFoodEntry {
        NewFoodEntry {
            date: Some(new.date.unwrap_or(today)),
            ..new.clone()
        }
    }

    fn normalize(raw: Value, today: NaiveDate) -> Result<Self> {
        let raw: RawFoodLog = parse_record(raw, Self::KIND)?;
        Ok(FoodEntry {
            id: raw.id,
            document_id: raw.document_id,
            name: raw.name,
            calories: raw.calories,
            meal_type: raw.meal_type,
            date: raw.date.unwrap_or(today),
            created_at: raw.created_at,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActivityLog {
    id: EntryId,
    document_id: DocumentId,
    name: String,
    duration: u32,
    calories: u32,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl LogRecord for ActivityEntry {
    type New = NewActivityEntry;
    const PATH: &'static str = "activity-logs";
    const KIND: &'static str = "activity log";

    fn with_default_date(new: &NewActivityEntry, today: NaiveDate) -> NewActivityEntry {
        NewActivityEntry {
            date: Some(new.date.unwrap_or(today)),
            ..new.clone()
        }
    }

    fn normalize(raw: Value, today: NaiveDate) -> Result<Self> {
        let raw: RawActivityLog = parse_record(raw, Self::KIND)?;
        Ok(ActivityEntry {
            id: raw.id,
            document_id: raw.document_id,
            name: raw.name,
            duration: raw.duration,
            calories: raw.calories,
            date: raw.date.unwrap_or(today),
            created_at: raw.created_at,
        })
    }
}

/// List, create and delete on one log collection.
pub struct LogsApi<'a, R> {
    client: &'a BackendClient,
    _record: PhantomData<R>,
}

#[derive(Serialize)]
struct Envelope<T> {
    data: T,
}

impl<R: LogRecord> LogsApi<'_, R> {
    /// Every entry of the signed-in user. No pagination.
    pub async fn list(&self) -> Result<Vec<R>> {
        let what = format!("GET {}", R::PATH);
        let mut json = self
            .client
            .send(self.client.request(Method::GET, R::PATH)?, &what)
            .await?;

        let today = today_local();
        match json.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| R::normalize(item, today))
                .collect(),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(AppError::InvalidRecord(format!(
                "{} list: expected an array, got {}",
                R::KIND,
                other
            ))),
        }
    }

    /// Create an entry; a missing date becomes today.
    pub async fn create(&self, new: &R::New) -> Result<R> {
        let today = today_local();
        let body = Envelope {
            data: R::with_default_date(new, today),
        };
        let what = format!("POST {}", R::PATH);
        let json = self
            .client
            .send(self.client.request(Method::POST, R::PATH)?.json(&body), &what)
            .await?;
        R::normalize(unwrap_data(json, R::KIND)?, today)
    }

    /// Delete by document id, returning the server's acknowledgement.
    pub async fn delete(&self, document_id: &DocumentId) -> Result<Value> {
        let path = format!("{}/{}", R::PATH, urlencoding::encode(document_id.as_str()));
        let what = format!("DELETE {}", R::PATH);
        let mut json = self
            .client
            .send(self.client.request(Method::DELETE, &path)?, &what)
            .await?;
        Ok(json
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}
