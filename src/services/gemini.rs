// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini API client for food recognition and diet plans.
//!
//! Handles:
//! - Food photo analysis (inline base64 image)
//! - Food description analysis
//! - Free-text diet plan generation
//! - Model fallback when a model is out of quota (429)

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Goal, MealType, NewFoodEntry, User};
use crate::models::stats::DEFAULT_INTAKE_GOAL;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Shown when a photo answer cannot be parsed.
pub const IMAGE_PARSE_ERROR: &str = "Could not parse AI response. Try a clearer photo.";

/// Shown when a description answer cannot be parsed.
pub const DESCRIPTION_PARSE_ERROR: &str =
    "Could not parse AI response. Try a more specific description.";

/// Returned when the model answers without any text.
pub const EMPTY_DIET_PLAN: &str = "Unable to generate diet plan";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    models: Vec<String>,
}

impl GeminiClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: crate::config::DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: api_key.into(),
            models,
        }
    }

    /// Point the client at another endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Build a client from configuration; fails without an API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_gemini_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.clone(),
            api_key: api_key.to_string(),
            models: config.gemini_models.clone(),
        })
    }

    /// Identify the food in a base64-encoded photo.
    pub async fn analyze_food_image(&self, base64_data: &str, mime_type: &str) -> Result<FoodGuess> {
        let prompt = "You are a nutrition expert. Identify every food item visible in this image.\n\
            Reply ONLY with one JSON object, no markdown and no explanation, in exactly this form:\n\
            {\"name\": \"<food name>\", \"calories\": <total calories as number>, \
            \"protein\": <grams as number>, \"carbs\": <grams as number>, \"fat\": <grams as number>}\n\
            Estimate realistic values for the single serving shown.";

        let request = GenerateRequest::single(vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: base64_data.to_string(),
                },
            },
            Part::Text {
                text: prompt.to_string(),
            },
        ]);

        let response = self.generate(&request).await?;
        parse_food_guess(response.first_text(), IMAGE_PARSE_ERROR)
    }

    /// Identify the food in raw image bytes.
    pub async fn analyze_food_image_bytes(&self, bytes: &[u8], mime_type: &str) -> Result<FoodGuess> {
        self.analyze_food_image(&BASE64.encode(bytes), mime_type).await
    }

    /// Estimate calories for a free-text description.
    pub async fn analyze_food_description(&self, description: &str) -> Result<FoodGuess> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("Please describe your food".to_string()));
        }

        let prompt = format!(
            "You are a nutrition expert. The user described a food item: \"{}\".\n\
             Reply ONLY with one JSON object, no markdown and no explanation, in exactly this form:\n\
             {{\"name\": \"<food name>\", \"calories\": <number>}}\n\
             Estimate realistic calories for a standard single serving.",
            description
        );

        let response = self.generate(&GenerateRequest::text(prompt)).await?;
        parse_food_guess(response.first_text(), DESCRIPTION_PARSE_ERROR)
    }

    /// Generate a personalized diet plan as display-ready text.
    pub async fn generate_diet_plan(&self, profile: &DietPlanRequest) -> Result<String> {
        let response = self
            .generate(&GenerateRequest::text(profile.prompt()))
            .await?;

        let text = response.first_text().trim();
        if text.is_empty() {
            Ok(EMPTY_DIET_PLAN.to_string())
        } else {
            Ok(text.to_string())
        }
    }

    /// Send a request, trying each model in order.
    ///
    /// A 429 or a quota message moves on to the next model; any other
    /// failure is returned immediately.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        for model in &self.models {
            let url = format!("{}/models/{}:generateContent", self.base_url, model);

            let response = self
                .http
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(request)
                .send()
                .await
                .map_err(|e| AppError::Network(format!("Gemini request failed: {}", e)))?;

            let status = response.status();
            let body = response.text().await?;
            let json: Option<Value> = serde_json::from_str(&body).ok();

            if status.is_success() {
                tracing::debug!(model = %model, "Gemini response received");
                let json = json.ok_or_else(|| {
                    AppError::InvalidRecord("Gemini response is not JSON".to_string())
                })?;
                return serde_json::from_value(json)
                    .map_err(|e| AppError::InvalidRecord(format!("Gemini response: {}", e)));
            }

            let error_message = json
                .as_ref()
                .and_then(|j| j.pointer("/error/message"))
                .and_then(Value::as_str)
                .unwrap_or_default();

            if status.as_u16() == 429 || error_message.to_lowercase().contains("quota") {
                tracing::warn!(model = %model, status = status.as_u16(), "Gemini quota exceeded, trying next model");
                continue;
            }

            tracing::warn!(model = %model, status = status.as_u16(), error = error_message, "Gemini API error");
            return Err(AppError::Http {
                status: status.as_u16(),
                message: if error_message.is_empty() {
                    format!("Request failed: {}", status.as_u16())
                } else {
                    error_message.to_string()
                },
            });
        }

        Err(AppError::QuotaExhausted)
    }
}

// ─── Results ─────────────────────────────────────────────────

/// Food identified by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodGuess {
    pub name: String,
    #[serde(deserialize_with = "deserialize_calories")]
    pub calories: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

impl FoodGuess {
    /// Prefill a food entry from the guess.
    pub fn to_new_entry(&self, meal_type: MealType) -> NewFoodEntry {
        NewFoodEntry::new(self.name.clone(), self.calories, meal_type)
    }

    /// Short macro summary such as `P 12g · C 30g · F 8g`, if any were given.
    pub fn macros_summary(&self) -> Option<String> {
        let parts: Vec<String> = [("P", self.protein), ("C", self.carbs), ("F", self.fat)]
            .into_iter()
            .filter_map(|(label, grams)| grams.map(|g| format!("{} {}g", label, g.round())))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" · "))
        }
    }
}

/// Calories may come back fractional; round them, but refuse negatives.
fn deserialize_calories<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(serde::de::Error::custom(format!("invalid calories: {}", value)));
    }
    Ok(value.round() as u32)
}

/// Remove markdown code fences around a JSON answer.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a model answer into a [`FoodGuess`], failing with `hint` on bad output.
pub fn parse_food_guess(text: &str, hint: &str) -> Result<FoodGuess> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(error = %e, "Could not parse food guess");
        AppError::AiParse(hint.to_string())
    })
}

// ─── Diet plan ───────────────────────────────────────────────

/// Profile facts a diet plan is based on.
#[derive(Debug, Clone, PartialEq)]
pub struct DietPlanRequest {
    pub age: u32,
    /// Kilograms
    pub weight: f64,
    /// Centimeters
    pub height: f64,
    pub goal: Goal,
    pub daily_calorie_intake: u32,
}

impl DietPlanRequest {
    /// Build from a profile; age, weight, height and goal are required.
    pub fn from_user(user: &User) -> Result<Self> {
        match (user.age, user.weight, user.height, user.goal) {
            (Some(age), Some(weight), Some(height), Some(goal))
                if age > 0 && weight > 0.0 && height > 0.0 =>
            {
                Ok(Self {
                    age,
                    weight,
                    height,
                    goal,
                    daily_calorie_intake: user
                        .daily_calorie_intake
                        .filter(|&v| v > 0)
                        .unwrap_or(DEFAULT_INTAKE_GOAL),
                })
            }
            _ => Err(AppError::Validation(
                "Please complete your profile (age, weight, height and goal) first".to_string(),
            )),
        }
    }

    fn prompt(&self) -> String {
        format!(
            "You are a professional nutritionist. Create a personalized weekly diet plan for this user.\n\n\
             User Profile:\n\
             - Age: {} years\n\
             - Weight: {} kg\n\
             - Height: {} cm\n\
             - Goal: {}\n\
             - Daily Calorie Target: {} kcal\n\n\
             Please provide:\n\
             1. Brief personalized recommendations (2-3 sentences)\n\
             2. A simple meal plan with breakfast, lunch and dinner for 3 days\n\
             3. Top 5 foods to focus on\n\
             4. Foods to avoid or limit\n\n\
             Format the response in a clear, readable way.",
            self.age,
            self.weight,
            self.height,
            self.goal.label(),
            self.daily_calorie_intake
        )
    }
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn single(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
        }
    }

    fn text(text: String) -> Self {
        Self::single(vec![Part::Text { text }])
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, or `""`.
    fn first_text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .unwrap_or_default()
    }
}
