// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food log entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{DocumentId, EntryId};

/// Meal a food entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Display order for grouped views.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown meal type '{}'", s))
    }
}

/// A logged meal, normalized from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodEntry {
    pub id: EntryId,
    pub document_id: DocumentId,
    pub name: String,
    pub calories: u32,
    pub meal_type: MealType,
    /// Calendar day the meal counts toward
    pub date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a food entry.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodEntry {
    #[validate(length(min = 1, message = "Please fill all fields"))]
    pub name: String,
    #[validate(range(min = 1, message = "Calories must be at least 1"))]
    pub calories: u32,
    pub meal_type: MealType,
    /// Defaults to today when not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl NewFoodEntry {
    pub fn new(name: impl Into<String>, calories: u32, meal_type: MealType) -> Self {
        Self {
            name: name.into().trim().to_string(),
            calories,
            meal_type,
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}
