//! Daily aggregates for the dashboard and log views.
//!
//! Everything here is a pure function of the in-memory collections and a
//! calendar day, recomputed on every render.

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{ActivityEntry, FoodEntry, MealType, User};
use crate::time_utils::trailing_days;

/// Intake goal used when the profile has none.
pub const DEFAULT_INTAKE_GOAL: u32 = 2200;
/// Burn goal used when the profile has none.
pub const DEFAULT_BURN_GOAL: u32 = 400;

/// Entries that count toward a calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for FoodEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for ActivityEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Entries logged on `day`, in collection order.
pub fn entries_on<'a, T: Dated>(
    entries: &'a [T],
    day: NaiveDate,
) -> impl Iterator<Item = &'a T> + 'a {
    entries.iter().filter(move |e| e.date() == day)
}

/// Daily targets from the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goals {
    pub intake: u32,
    pub burn: u32,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            intake: DEFAULT_INTAKE_GOAL,
            burn: DEFAULT_BURN_GOAL,
        }
    }
}

impl Goals {
    /// Goals from the profile; unset or zero values use the defaults.
    pub fn from_user(user: Option<&User>) -> Self {
        let defaults = Self::default();
        Self {
            intake: user
                .and_then(|u| u.daily_calorie_intake)
                .filter(|&v| v > 0)
                .unwrap_or(defaults.intake),
            burn: user
                .and_then(|u| u.daily_calorie_burn)
                .filter(|&v| v > 0)
                .unwrap_or(defaults.burn),
        }
    }
}

/// `total` as a percentage of `goal`; zero when there is no goal.
pub fn progress_percent(total: u64, goal: u32) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    total as f64 / f64::from(goal) * 100.0
}

/// Per-entry values are `u32`; day totals are summed as `u64` so they cannot wrap.
fn widen(value: u32) -> u64 {
    u64::from(value)
}

/// Totals for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub calories_consumed: u64,
    pub calories_burned: u64,
    pub active_minutes: u64,
    /// consumed − burned
    pub net_calories: i64,
    pub meals_logged: usize,
    pub activities_logged: usize,
    pub intake_goal: u32,
    pub burn_goal: u32,
    pub intake_progress: f64,
    pub burn_progress: f64,
}

impl DailySummary {
    pub fn compute(
        foods: &[FoodEntry],
        activities: &[ActivityEntry],
        day: NaiveDate,
        goals: Goals,
    ) -> Self {
        let (calories_consumed, meals_logged) = entries_on(foods, day)
            .fold((0u64, 0usize), |(sum, n), f| (sum + widen(f.calories), n + 1));

        let (calories_burned, active_minutes, activities_logged) = entries_on(activities, day)
            .fold((0u64, 0u64, 0usize), |(cal, min, n), a| {
                (cal + widen(a.calories), min + widen(a.duration), n + 1)
            });

        Self {
            date: day,
            calories_consumed,
            calories_burned,
            active_minutes,
            net_calories: i64::try_from(calories_consumed).unwrap_or(i64::MAX)
                - i64::try_from(calories_burned).unwrap_or(i64::MAX),
            meals_logged,
            activities_logged,
            intake_goal: goals.intake,
            burn_goal: goals.burn,
            intake_progress: progress_percent(calories_consumed, goals.intake),
            burn_progress: progress_percent(calories_burned, goals.burn),
        }
    }
}

/// Intake and burn for one day of the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct DayTotals {
    pub date: NaiveDate,
    pub intake: u64,
    pub burn: u64,
}

/// Intake vs burn for the `days` days ending at `end`, oldest first.
pub fn daily_series(
    foods: &[FoodEntry],
    activities: &[ActivityEntry],
    end: NaiveDate,
    days: u32,
) -> Vec<DayTotals> {
    trailing_days(end, days)
        .into_iter()
        .map(|date| DayTotals {
            date,
            intake: entries_on(foods, date).map(|f| widen(f.calories)).sum(),
            burn: entries_on(activities, date).map(|a| widen(a.calories)).sum(),
        })
        .collect()
}

/// A day's food entries for one meal.
#[derive(Debug, Clone, PartialEq)]
pub struct MealGroup<'a> {
    pub meal_type: MealType,
    pub entries: Vec<&'a FoodEntry>,
    pub total_calories: u64,
}

/// Group a day's food entries by meal, in breakfast..snack order, skipping empty meals.
pub fn group_by_meal(foods: &[FoodEntry], day: NaiveDate) -> Vec<MealGroup<'_>> {
    MealType::ALL
        .into_iter()
        .filter_map(|meal_type| {
            let entries: Vec<&FoodEntry> = entries_on(foods, day)
                .filter(|f| f.meal_type == meal_type)
                .collect();
            if entries.is_empty() {
                return None;
            }
            let total_calories = entries.iter().map(|f| widen(f.calories)).sum();
            Some(MealGroup {
                meal_type,
                entries,
                total_calories,
            })
        })
        .collect()
}
