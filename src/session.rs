// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client session: who is signed in and what they have logged.
//!
//! The session is an explicit object handed to whatever renders the UI.
//! Its bootstrap lifecycle is a tagged state:
//!
//! ```text
//! Init ──bootstrap──▶ Restoring ──me ok──▶ Authenticated
//!   │                     └──me failed──▶ Anonymous (token discarded)
//!   └──no stored token──────────────────▶ Anonymous
//! ```
//!
//! Signup and login move straight to `Authenticated`; logout goes back to
//! `Anonymous`.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    ActivityEntry, AuthResponse, Credentials, DailySummary, DocumentId, FoodEntry, Goals,
    NewActivityEntry, NewFoodEntry, ProfileUpdate, User,
};
use crate::services::BackendClient;
use crate::storage::{
    read_token, FileStorage, SharedStorage, PROFILE_SNAPSHOT_KEY, TOKEN_KEY,
};
use crate::time_utils::{format_utc_rfc3339, today_local};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// Signed-in user plus onboarding status.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub user: User,
    pub onboarding_completed: bool,
}

/// Bootstrap lifecycle of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Created, bootstrap not started.
    Init,
    /// A stored token is being checked against the backend.
    Restoring,
    /// No valid token; nobody is signed in.
    Anonymous,
    Authenticated(Account),
}

/// What the UI should show for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    Loading,
    Anonymous,
    NeedsOnboarding,
    Ready,
}

/// Top-level destinations the session can send the UI to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Onboarding,
    Dashboard,
}

impl SessionView {
    /// Where the UI belongs for this view, if anywhere yet.
    pub fn route(self) -> Option<Route> {
        match self {
            SessionView::Loading => None,
            SessionView::Anonymous => Some(Route::Root),
            SessionView::NeedsOnboarding => Some(Route::Onboarding),
            SessionView::Ready => Some(Route::Dashboard),
        }
    }
}

/// Profile snapshot written to client storage when onboarding completes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSnapshot<'a> {
    #[serde(flatten)]
    profile: &'a ProfileUpdate,
    created_at: String,
}

/// Session store.
pub struct Session {
    backend: BackendClient,
    storage: SharedStorage,
    state: SessionState,
    food_logs: Vec<FoodEntry>,
    activity_logs: Vec<ActivityEntry>,
}

impl Session {
    /// Create a session. `storage` must be the one `backend` reads tokens from.
    pub fn new(backend: BackendClient, storage: SharedStorage) -> Self {
        Self {
            backend,
            storage,
            state: SessionState::Init,
            food_logs: Vec::new(),
            activity_logs: Vec::new(),
        }
    }

    /// Session backed by file storage in the configured state directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: SharedStorage = Arc::new(FileStorage::in_dir(&config.state_dir));
        let backend = BackendClient::from_config(config, storage.clone())?;
        Ok(Self::new(backend, storage))
    }

    // ─── State ───────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True once bootstrap has settled, whatever the outcome.
    pub fn is_user_fetched(&self) -> bool {
        matches!(
            self.state,
            SessionState::Anonymous | SessionState::Authenticated(_)
        )
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(account) => Some(&account.user),
            _ => None,
        }
    }

    pub fn onboarding_completed(&self) -> bool {
        match &self.state {
            SessionState::Authenticated(account) => account.onboarding_completed,
            _ => false,
        }
    }

    pub fn view(&self) -> SessionView {
        match &self.state {
            SessionState::Init | SessionState::Restoring => SessionView::Loading,
            SessionState::Anonymous => SessionView::Anonymous,
            SessionState::Authenticated(account) if !account.onboarding_completed => {
                SessionView::NeedsOnboarding
            }
            SessionState::Authenticated(_) => SessionView::Ready,
        }
    }

    pub fn food_logs(&self) -> &[FoodEntry] {
        &self.food_logs
    }

    pub fn activity_logs(&self) -> &[ActivityEntry] {
        &self.activity_logs
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    // ─── Mutators ────────────────────────────────────────────────

    /// Replace the signed-in user, keeping the onboarding flag.
    ///
    /// When nobody was signed in, the flag is derived from the profile.
    pub fn set_user(&mut self, user: User) {
        let onboarding_completed = match &self.state {
            SessionState::Authenticated(account) => account.onboarding_completed,
            _ => user.is_onboarded(),
        };
        self.state = SessionState::Authenticated(Account {
            user,
            onboarding_completed,
        });
    }

    /// Set the onboarding flag. Ignored when nobody is signed in.
    pub fn set_onboarding_completed(&mut self, completed: bool) {
        if let SessionState::Authenticated(account) = &mut self.state {
            account.onboarding_completed = completed;
        }
    }

    pub fn set_all_food_logs(&mut self, logs: Vec<FoodEntry>) {
        self.food_logs = logs;
    }

    pub fn set_all_activity_logs(&mut self, logs: Vec<ActivityEntry>) {
        self.activity_logs = logs;
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Restore the session from a stored token, if there is one.
    ///
    /// Never fails: any problem leaves the session anonymous. Calling it
    /// again after the first run does nothing.
    pub async fn bootstrap(&mut self) -> SessionView {
        if !matches!(self.state, SessionState::Init) {
            tracing::debug!(view = ?self.view(), "Session already bootstrapped");
            return self.view();
        }

        match read_token(self.storage.as_ref()) {
            Ok(Some(token)) => self.fetch_user(&token).await,
            Ok(None) => {
                tracing::info!("No stored token, starting anonymous session");
                self.state = SessionState::Anonymous;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored token, starting anonymous session");
                self.state = SessionState::Anonymous;
            }
        }

        self.view()
    }

    /// Load the profile for `token`.
    ///
    /// On failure the stored token is discarded and the session becomes
    /// anonymous; the error is not surfaced.
    pub async fn fetch_user(&mut self, token: &str) {
        self.state = SessionState::Restoring;

        match self.backend.user().me().await {
            Ok(user) => {
                let onboarding_completed = user.is_onboarded();
                tracing::info!(
                    user_id = %user.id,
                    onboarding_completed,
                    "Session restored"
                );
                self.state = SessionState::Authenticated(Account {
                    user: user.with_token(token),
                    onboarding_completed,
                });
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored token rejected, session is anonymous");
                if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
                    tracing::warn!(error = %e, "Failed to discard stored token");
                }
                self.state = SessionState::Anonymous;
            }
        }
    }

    /// Register a new account and sign in.
    pub async fn signup(&mut self, credentials: &Credentials) -> Result<()> {
        credentials.validate()?;
        let auth = self.backend.auth().register(credentials).await?;
        self.establish(auth)
    }

    /// Sign in with existing credentials.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        credentials.validate()?;
        let auth = self.backend.auth().login(credentials).await?;
        self.establish(auth)
    }

    fn establish(&mut self, auth: AuthResponse) -> Result<()> {
        self.storage.set_item(TOKEN_KEY, &auth.jwt)?;

        let onboarding_completed = auth.user.is_onboarded();
        tracing::info!(user_id = %auth.user.id, onboarding_completed, "Signed in");
        self.state = SessionState::Authenticated(Account {
            user: auth.user.with_token(auth.jwt),
            onboarding_completed,
        });
        Ok(())
    }

    /// Sign out and return the route to show next.
    ///
    /// Cached logs are dropped; the next session fetches its own.
    pub fn logout(&mut self) -> Route {
        if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
        if let Some(user) = self.user() {
            tracing::info!(user_id = %user.id, "Signed out");
        }
        self.state = SessionState::Anonymous;
        self.food_logs.clear();
        self.activity_logs.clear();
        Route::Root
    }

    // ─── Logs ────────────────────────────────────────────────────

    /// Replace the food log cache with the backend's list.
    pub async fn fetch_food_logs(&mut self) -> Result<()> {
        self.food_logs = self.backend.food_logs().list().await?;
        tracing::debug!(count = self.food_logs.len(), "Food logs fetched");
        Ok(())
    }

    /// Replace the activity log cache with the backend's list.
    pub async fn fetch_activity_logs(&mut self) -> Result<()> {
        self.activity_logs = self.backend.activity_logs().list().await?;
        tracing::debug!(count = self.activity_logs.len(), "Activity logs fetched");
        Ok(())
    }

    /// Validate, create and append a food entry.
    pub async fn add_food(&mut self, entry: &NewFoodEntry) -> Result<FoodEntry> {
        entry.validate()?;
        let created = self.backend.food_logs().create(entry).await?;
        self.food_logs.push(created.clone());
        Ok(created)
    }

    /// Delete a food entry and drop it from the cache.
    pub async fn remove_food(&mut self, document_id: &DocumentId) -> Result<()> {
        self.backend.food_logs().delete(document_id).await?;
        self.food_logs.retain(|f| &f.document_id != document_id);
        Ok(())
    }

    /// Validate, create and append an activity entry.
    pub async fn add_activity(&mut self, entry: &NewActivityEntry) -> Result<ActivityEntry> {
        entry.validate()?;
        let created = self.backend.activity_logs().create(entry).await?;
        self.activity_logs.push(created.clone());
        Ok(created)
    }

    /// Delete an activity entry and drop it from the cache.
    pub async fn remove_activity(&mut self, document_id: &DocumentId) -> Result<()> {
        self.backend.activity_logs().delete(document_id).await?;
        self.activity_logs.retain(|a| &a.document_id != document_id);
        Ok(())
    }

    // ─── Profile ─────────────────────────────────────────────────

    fn account(&self) -> Result<&Account> {
        match &self.state {
            SessionState::Authenticated(account) => Ok(account),
            _ => Err(AppError::NotAuthenticated),
        }
    }

    /// Save profile edits and merge the result into the session.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<User> {
        let account = self.account()?;
        if update.is_empty() {
            return Ok(account.user.clone());
        }

        let token = account.user.token.clone();
        let mut updated = self.backend.user().update(account.user.id, update).await?;
        updated.token = token;

        tracing::info!(user_id = %updated.id, "Profile updated");
        self.set_user(updated.clone());
        Ok(updated)
    }

    /// Save the onboarding profile, mark onboarding complete and reload the user.
    pub async fn complete_onboarding(&mut self, profile: &ProfileUpdate) -> Result<()> {
        let account = self.account()?;
        let user_id = account.user.id;
        let token = account.user.token.clone();

        let snapshot = ProfileSnapshot {
            profile,
            created_at: format_utc_rfc3339(Utc::now()),
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => self.storage.set_item(PROFILE_SNAPSHOT_KEY, &json)?,
            Err(e) => tracing::warn!(error = %e, "Failed to encode profile snapshot"),
        }

        self.backend.user().update(user_id, profile).await?;
        self.set_onboarding_completed(true);
        tracing::info!(user_id = %user_id, "Onboarding completed");

        if let Some(token) = token {
            self.fetch_user(&token).await;
        }
        Ok(())
    }

    // ─── Aggregates ──────────────────────────────────────────────

    /// Totals for `day` against the user's goals.
    pub fn summary_for(&self, day: NaiveDate) -> DailySummary {
        DailySummary::compute(
            &self.food_logs,
            &self.activity_logs,
            day,
            Goals::from_user(self.user()),
        )
    }

    pub fn today_summary(&self) -> DailySummary {
        self.summary_for(today_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn offline_session() -> Session {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        // Nothing listens here; tests below never reach the network.
        let backend = BackendClient::new("http://127.0.0.1:9", storage.clone());
        Session::new(backend, storage)
    }

    fn user(onboarded: bool) -> User {
        let mut json = serde_json::json!({"id": 5, "username": "kim", "email": "kim@example.com"});
        if onboarded {
            json["age"] = 28.into();
            json["weight"] = 61.0.into();
            json["goal"] = "maintain".into();
        }
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_new_session_is_loading() {
        let session = offline_session();
        assert_eq!(session.state(), &SessionState::Init);
        assert!(!session.is_user_fetched());
        assert_eq!(session.view(), SessionView::Loading);
        assert_eq!(session.view().route(), None);
    }

    #[tokio::test]
    async fn test_bootstrap_without_token_is_anonymous() {
        let mut session = offline_session();
        assert_eq!(session.bootstrap().await, SessionView::Anonymous);
        assert!(session.is_user_fetched());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_set_user_derives_then_keeps_flag() {
        let mut session = offline_session();
        session.set_user(user(false));
        assert_eq!(session.view(), SessionView::NeedsOnboarding);

        session.set_onboarding_completed(true);
        session.set_user(user(false));
        assert!(session.onboarding_completed());
        assert_eq!(session.view().route(), Some(Route::Dashboard));
    }

    #[test]
    fn test_set_onboarding_ignored_when_anonymous() {
        let mut session = offline_session();
        session.set_onboarding_completed(true);
        assert!(!session.onboarding_completed());
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut session = offline_session();
        session.storage().set_item(TOKEN_KEY, "jwt").unwrap();
        session.set_user(user(true));

        assert_eq!(session.logout(), Route::Root);

        assert!(session.user().is_none());
        assert!(!session.onboarding_completed());
        assert_eq!(session.storage().get_item(TOKEN_KEY).unwrap(), None);
        assert!(session.food_logs().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entries_never_reach_backend() {
        let mut session = offline_session();
        let err = session
            .add_food(&NewFoodEntry::new("", 100, crate::models::MealType::Lunch))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = session
            .add_activity(&NewActivityEntry::new("Run", 0, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_profile_update_requires_sign_in() {
        let mut session = offline_session();
        let err = session
            .update_profile(&ProfileUpdate {
                age: Some(30),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
    }
}
