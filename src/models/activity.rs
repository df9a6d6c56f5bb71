// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity log entries and quick-add presets.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{DocumentId, EntryId};

/// Calories per minute used when an activity has no preset.
pub const DEFAULT_BURN_RATE: f64 = 8.0;

/// Duration a quick-add preset starts with (minutes).
pub const QUICK_ADD_MINUTES: u32 = 30;

/// A logged exercise, normalized from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityEntry {
    pub id: EntryId,
    pub document_id: DocumentId,
    pub name: String,
    /// Minutes
    pub duration: u32,
    /// Calories burned
    pub calories: u32,
    pub date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating an activity entry.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewActivityEntry {
    #[validate(length(min = 1, message = "Please fill all fields"))]
    pub name: String,
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub duration: u32,
    #[validate(range(min = 1, message = "Calories must be at least 1"))]
    pub calories: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl NewActivityEntry {
    pub fn new(name: impl Into<String>, duration: u32, calories: u32) -> Self {
        Self {
            name: name.into().trim().to_string(),
            duration,
            calories,
            date: None,
        }
    }

    /// Build an entry whose calories come from the preset table.
    pub fn estimated(name: impl Into<String>, duration: u32) -> Self {
        let name = name.into();
        let rate = burn_rate(&name);
        Self::new(name, duration, calories_for(rate, duration))
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Quick-add activity with a known burn rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityPreset {
    pub name: &'static str,
    /// Calories per minute
    pub rate: f64,
}

impl ActivityPreset {
    /// The entry a quick-add tap creates.
    pub fn quick_add(&self) -> NewActivityEntry {
        NewActivityEntry::new(self.name, QUICK_ADD_MINUTES, calories_for(self.rate, QUICK_ADD_MINUTES))
    }
}

pub const QUICK_ACTIVITIES: &[ActivityPreset] = &[
    ActivityPreset { name: "Walking", rate: 5.0 },
    ActivityPreset { name: "Running", rate: 10.0 },
    ActivityPreset { name: "Cycling", rate: 8.0 },
    ActivityPreset { name: "Swimming", rate: 9.0 },
    ActivityPreset { name: "Yoga", rate: 4.0 },
    ActivityPreset { name: "Weight Training", rate: 6.0 },
    ActivityPreset { name: "HIIT", rate: 12.0 },
    ActivityPreset { name: "Dancing", rate: 7.0 },
];

/// Look up a preset by name, ignoring case.
pub fn find_preset(name: &str) -> Option<&'static ActivityPreset> {
    let name = name.trim();
    QUICK_ACTIVITIES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Burn rate for an activity name, falling back to [`DEFAULT_BURN_RATE`].
pub fn burn_rate(name: &str) -> f64 {
    find_preset(name).map_or(DEFAULT_BURN_RATE, |p| p.rate)
}

/// Calories burned at `rate` per minute over `duration` minutes, rounded.
pub fn calories_for(rate: f64, duration: u32) -> u32 {
    (rate * f64::from(duration)).round().max(0.0) as u32
}
