// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - remote APIs.

pub mod backend;
pub mod gemini;

pub use backend::{BackendClient, LogRecord, LogsApi};
pub use gemini::{DietPlanRequest, FoodGuess, GeminiClient};
