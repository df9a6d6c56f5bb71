//! User model and profile payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::UserId;

/// Fitness goal chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Goal::Lose => "Lose Weight",
            Goal::Maintain => "Maintain Weight",
            Goal::Gain => "Gain Muscle",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            other => Err(format!("unknown goal '{}' (expected lose, maintain or gain)", other)),
        }
    }
}

/// Signed-in user as returned by `users/me` and the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Session token; held client-side only, never serialized.
    #[serde(skip)]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    pub token: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    /// Kilograms
    #[serde(default)]
    pub weight: Option<f64>,
    /// Centimeters
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub goal: Option<Goal>,
    #[serde(default)]
    pub daily_calorie_intake: Option<u32>,
    #[serde(default)]
    pub daily_calorie_burn: Option<u32>,
}

impl User {
    /// A profile with age, weight and goal set has finished onboarding.
    pub fn is_onboarded(&self) -> bool {
        self.age.is_some_and(|a| a > 0)
            && self.weight.is_some_and(|w| w > 0.0)
            && self.goal.is_some()
    }

    /// Attach a session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Login or registration input. Never persisted.
#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    /// Email address (or username, for login)
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Registration only; derived from the email when absent
    pub username: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Username sent at registration: the explicit one, else the email's local part.
    pub fn registration_username(&self) -> String {
        match self.username.as_deref().filter(|u| !u.is_empty()) {
            Some(username) => username.to_string(),
            None => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Strip whitespace from a username; the backend rejects names containing it.
pub fn sanitize_username(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Successful response of `auth/local` and `auth/local/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: User,
}

/// Flat partial profile sent to `PUT users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_intake: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_burn: Option<u32>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "documentId": "u7doc",
            "username": "sam",
            "email": "sam@example.com",
            "confirmed": true,
            "age": 30,
            "weight": 72.5,
            "height": null,
            "goal": "lose",
            "dailyCalorieIntake": 1900,
            "dailyCalorieBurn": null
        })
    }

    #[test]
    fn test_user_parses_backend_shape() {
        let user: User = serde_json::from_value(user_json()).unwrap();
        assert_eq!(user.id, UserId(7));
        assert_eq!(user.goal, Some(Goal::Lose));
        assert_eq!(user.height, None);
        assert_eq!(user.daily_calorie_intake, Some(1900));
        assert!(user.token.is_none());
        assert!(user.is_onboarded());
    }

    #[test]
    fn test_onboarding_requires_age_weight_and_goal() {
        let complete: User = serde_json::from_value(user_json()).unwrap();

        let mut no_age = complete.clone();
        no_age.age = None;
        let mut no_weight = complete.clone();
        no_weight.weight = None;
        let mut no_goal = complete.clone();
        no_goal.goal = None;
        let mut zero_age = complete.clone();
        zero_age.age = Some(0);

        assert!(complete.is_onboarded());
        assert!(!no_age.is_onboarded());
        assert!(!no_weight.is_onboarded());
        assert!(!no_goal.is_onboarded());
        assert!(!zero_age.is_onboarded());
    }

    #[test]
    fn test_token_is_not_serialized() {
        let user: User = serde_json::from_value(user_json()).unwrap();
        let json = serde_json::to_value(user.with_token("secret")).unwrap();
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_registration_username_defaults_to_email_local_part() {
        let creds = Credentials::new("jane.doe@example.com", "pw");
        assert_eq!(creds.registration_username(), "jane.doe");

        let creds = creds.with_username("jd");
        assert_eq!(creds.registration_username(), "jd");
    }

    #[test]
    fn test_sanitize_username() {
        assert_eq!(sanitize_username(" Jane  Doe\t"), "JaneDoe");
    }

    #[test]
    fn test_profile_update_serializes_flat_camel_case() {
        let update = ProfileUpdate {
            age: Some(40),
            goal: Some(Goal::Gain),
            daily_calorie_burn: Some(500),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"age": 40, "goal": "gain", "dailyCalorieBurn": 500})
        );
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_goal_from_str() {
        assert_eq!("Maintain".parse::<Goal>(), Ok(Goal::Maintain));
        assert!("bulk".parse::<Goal>().is_err());
    }
}
