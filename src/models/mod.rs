// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod food;
pub mod ids;
pub mod stats;
pub mod user;

pub use activity::{ActivityEntry, ActivityPreset, NewActivityEntry, QUICK_ACTIVITIES};
pub use food::{FoodEntry, MealType, NewFoodEntry};
pub use ids::{DocumentId, EntryId, UserId};
pub use stats::{DailySummary, Goals};
pub use user::{AuthResponse, Credentials, Goal, ProfileUpdate, User};
