// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding wizard.
//!
//! Four linear steps: age, measurements, goal, daily targets. The age and
//! measurement steps are gated, and the last step re-checks the whole form
//! before handing back the finished profile.

use crate::error::{AppError, Result};
use crate::models::{Goal, ProfileUpdate};
use validator::Validate;

pub const TOTAL_STEPS: u8 = 4;

const AGE_MESSAGE: &str = "Age is required (13-120)";
const WEIGHT_MESSAGE: &str = "Weight must be greater than 0";

/// Profile being filled in, with the wizard's starting values.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ProfileForm {
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: u32,
    /// Kilograms
    #[validate(range(exclusive_min = 0.0, message = "Weight must be greater than 0"))]
    pub weight: f64,
    /// Centimeters; optional
    pub height: Option<f64>,
    pub goal: Goal,
    pub daily_calorie_intake: u32,
    pub daily_calorie_burn: u32,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            age: 25,
            weight: 70.0,
            height: Some(170.0),
            goal: Goal::Maintain,
            daily_calorie_intake: 2000,
            daily_calorie_burn: 400,
        }
    }
}

impl ProfileForm {
    /// The flat profile update sent on completion. A zero height is dropped.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            age: Some(self.age),
            weight: Some(self.weight),
            height: self.height.filter(|h| *h > 0.0),
            goal: Some(self.goal),
            daily_calorie_intake: Some(self.daily_calorie_intake),
            daily_calorie_burn: Some(self.daily_calorie_burn),
        }
    }
}

/// Result of advancing the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the given step.
    Step(u8),
    /// The last step was confirmed; save this profile.
    Complete(ProfileUpdate),
}

/// Wizard position and form state.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingWizard {
    step: u8,
    pub form: ProfileForm,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self {
            step: 1,
            form: ProfileForm::default(),
        }
    }
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step, 1-based.
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == TOTAL_STEPS
    }

    /// Move forward.
    ///
    /// Step 1 refuses ages outside 13..=120, step 2 a non-positive weight;
    /// the wizard stays put on failure. Completion requires both.
    pub fn next(&mut self) -> Result<Advance> {
        if let Some(message) = self.blocking_error() {
            return Err(AppError::Validation(message.to_string()));
        }

        if self.step < TOTAL_STEPS {
            self.step += 1;
            Ok(Advance::Step(self.step))
        } else {
            Ok(Advance::Complete(self.form.to_update()))
        }
    }

    fn blocking_error(&self) -> Option<&'static str> {
        let errors = self.form.validate().err()?;
        let failed = errors.field_errors();
        let bad_age = failed.contains_key("age");
        let bad_weight = failed.contains_key("weight");

        match self.step {
            1 if bad_age => Some(AGE_MESSAGE),
            2 if bad_weight => Some(WEIGHT_MESSAGE),
            TOTAL_STEPS if bad_age => Some(AGE_MESSAGE),
            TOTAL_STEPS if bad_weight => Some(WEIGHT_MESSAGE),
            _ => None,
        }
    }

    /// Move back one step; stays on step 1.
    pub fn back(&mut self) -> u8 {
        if self.step > 1 {
            self.step -= 1;
        }
        self.step
    }
}
