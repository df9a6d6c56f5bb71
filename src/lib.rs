// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitTrack: food and activity logging client.
//!
//! This crate provides the client core behind the FitTrack views: the
//! session store, the backend content service gateway, the Gemini food
//! recognition wrapper and the daily aggregates shown on the dashboard.

pub mod config;
pub mod error;
pub mod models;
pub mod onboarding;
pub mod services;
pub mod session;
pub mod storage;
pub mod time_utils;

pub use error::{AppError, Result};
pub use session::{Route, Session, SessionState, SessionView};
