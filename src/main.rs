// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitTrack terminal client.
//!
//! Drives the same session operations as the web views: sign in, log food
//! and activities, onboarding, profile and the daily dashboard.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fittrack::{
    config::Config,
    models::{
        activity::find_preset,
        stats::{daily_series, group_by_meal},
        user::sanitize_username,
        Credentials, DocumentId, Goal, MealType, NewActivityEntry, NewFoodEntry, ProfileUpdate,
        QUICK_ACTIVITIES,
    },
    onboarding::{Advance, OnboardingWizard},
    services::{DietPlanRequest, GeminiClient},
    time_utils::{format_iso_date, today_local},
    Session, SessionView,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fittrack", about = "Track meals and workouts from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in
    Signup {
        email: String,
        #[arg(long, env = "FITTRACK_PASSWORD")]
        password: String,
        /// Defaults to the part of the email before '@'
        #[arg(long)]
        username: Option<String>,
    },
    /// Sign in
    Login {
        email: String,
        #[arg(long, env = "FITTRACK_PASSWORD")]
        password: String,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Daily totals, progress and the last 7 days
    Dashboard {
        /// Day to summarize (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Food log
    Food {
        #[command(subcommand)]
        action: FoodCommand,
    },
    /// Activity log
    Activity {
        #[command(subcommand)]
        action: ActivityCommand,
    },
    /// Complete onboarding
    Onboard {
        #[arg(long)]
        age: u32,
        /// Kilograms
        #[arg(long)]
        weight: f64,
        /// Centimeters
        #[arg(long)]
        height: Option<f64>,
        /// lose, maintain or gain
        #[arg(long, default_value = "maintain")]
        goal: Goal,
        #[arg(long, default_value_t = 2000)]
        intake: u32,
        #[arg(long, default_value_t = 400)]
        burn: u32,
    },
    /// Edit the profile
    Profile {
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        goal: Option<Goal>,
        #[arg(long)]
        intake: Option<u32>,
        #[arg(long)]
        burn: Option<u32>,
    },
    /// Generate a diet plan from the profile
    DietPlan,
}

#[derive(Subcommand, Debug)]
enum FoodCommand {
    /// List a day's meals grouped by meal type
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Log a meal
    Add {
        name: String,
        calories: u32,
        /// breakfast, lunch, dinner or snack
        #[arg(long)]
        meal: MealType,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a meal by document id
    Delete { document_id: String },
    /// Recognize food in a photo
    Snap {
        path: std::path::PathBuf,
        #[arg(long, default_value = "snack")]
        meal: MealType,
        /// Log the recognized food
        #[arg(long)]
        save: bool,
    },
    /// Estimate calories from a description
    Describe {
        description: String,
        #[arg(long, default_value = "snack")]
        meal: MealType,
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ActivityCommand {
    /// List a day's activities
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Log an activity; calories are estimated when omitted
    Add {
        name: String,
        /// Minutes
        duration: u32,
        #[arg(long)]
        calories: Option<u32>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Log a 30-minute preset
    Quick { name: String },
    /// Delete an activity by document id
    Delete { document_id: String },
    /// Show quick-add presets
    Presets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let config = Config::from_env().context("loading configuration")?;
    tracing::debug!(backend = %config.backend_url, "Starting FitTrack client");

    let mut session = Session::from_config(&config)?;
    let view = session.bootstrap().await;

    match args.command {
        Command::Signup {
            email,
            password,
            username,
        } => {
            let mut credentials = Credentials::new(email, password);
            if let Some(username) = username {
                credentials = credentials.with_username(sanitize_username(&username));
            }
            session.signup(&credentials).await?;
            println!("Account created. Welcome!");
            print_next_step(&session);
        }
        Command::Login { email, password } => {
            session.login(&Credentials::new(email, password)).await?;
            println!("Logged in.");
            print_next_step(&session);
        }
        Command::Logout => {
            session.logout();
            println!("Logged out.");
        }
        Command::Whoami => match session.user() {
            Some(user) => {
                println!("{} <{}>", user.username, user.email);
                println!("  Age: {}", display_opt(user.age));
                println!("  Weight: {}", display_opt(user.weight.map(|w| format!("{} kg", w))));
                println!("  Height: {}", display_opt(user.height.map(|h| format!("{} cm", h))));
                println!("  Goal: {}", display_opt(user.goal));
                println!(
                    "  Daily calorie intake: {}",
                    display_opt(user.daily_calorie_intake.map(|v| format!("{} kcal", v)))
                );
                println!(
                    "  Daily calorie burn: {}",
                    display_opt(user.daily_calorie_burn.map(|v| format!("{} kcal", v)))
                );
            }
            None => println!("Not logged in."),
        },
        command => {
            require_signed_in(view)?;
            run_signed_in(&mut session, &config, command).await?;
        }
    }

    Ok(())
}

async fn run_signed_in(session: &mut Session, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Dashboard { date } => {
            session.fetch_food_logs().await?;
            session.fetch_activity_logs().await?;
            let day = date.unwrap_or_else(today_local);
            let summary = session.summary_for(day);

            let name = session.user().map_or("User", |u| u.username.as_str());
            println!("Welcome back, {} ({})", name, format_iso_date(day));
            println!(
                "  Consumed: {} / {} kcal ({:.0}%)",
                summary.calories_consumed, summary.intake_goal, summary.intake_progress
            );
            println!(
                "  Burned:   {} / {} kcal ({:.0}%)",
                summary.calories_burned, summary.burn_goal, summary.burn_progress
            );
            println!("  Net:      {} kcal", summary.net_calories);
            println!("  Active:   {} min", summary.active_minutes);
            println!();
            println!("Last 7 days (intake / burn):");
            for totals in daily_series(session.food_logs(), session.activity_logs(), day, 7) {
                println!("  {}  {:>5} / {:<5}", format_iso_date(totals.date), totals.intake, totals.burn);
            }
        }
        Command::Food { action } => run_food(session, config, action).await?,
        Command::Activity { action } => run_activity(session, action).await?,
        Command::Onboard {
            age,
            weight,
            height,
            goal,
            intake,
            burn,
        } => {
            let mut wizard = OnboardingWizard::new();
            wizard.form.age = age;
            wizard.form.weight = weight;
            wizard.form.height = height;
            wizard.form.goal = goal;
            wizard.form.daily_calorie_intake = intake;
            wizard.form.daily_calorie_burn = burn;

            let profile = loop {
                if let Advance::Complete(profile) = wizard.next()? {
                    break profile;
                }
            };
            session.complete_onboarding(&profile).await?;
            println!("Profile setup complete!");
        }
        Command::Profile {
            age,
            weight,
            height,
            goal,
            intake,
            burn,
        } => {
            let update = ProfileUpdate {
                age,
                weight,
                height,
                goal,
                daily_calorie_intake: intake,
                daily_calorie_burn: burn,
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            session.update_profile(&update).await?;
            println!("Profile updated!");
        }
        Command::DietPlan => {
            let user = session.user().context("not logged in")?;
            let request = DietPlanRequest::from_user(user)?;
            let gemini = GeminiClient::from_config(config)?;
            println!("{}", gemini.generate_diet_plan(&request).await?);
        }
        Command::Signup { .. } | Command::Login { .. } | Command::Logout | Command::Whoami => {
            unreachable!("handled before sign-in check")
        }
    }
    Ok(())
}

async fn run_food(session: &mut Session, config: &Config, action: FoodCommand) -> anyhow::Result<()> {
    match action {
        FoodCommand::List { date } => {
            session.fetch_food_logs().await?;
            let day = date.unwrap_or_else(today_local);
            let groups = group_by_meal(session.food_logs(), day);
            if groups.is_empty() {
                println!("No food logged on {}.", format_iso_date(day));
            }
            for group in groups {
                println!("{} ({} kcal)", group.meal_type, group.total_calories);
                for entry in group.entries {
                    println!("  {:<24} {:>5} kcal  [{}]", entry.name, entry.calories, entry.document_id);
                }
            }
            println!("Total: {} kcal", session.summary_for(day).calories_consumed);
        }
        FoodCommand::Add {
            name,
            calories,
            meal,
            date,
        } => {
            let mut entry = NewFoodEntry::new(name, calories, meal);
            entry.date = date;
            let created = session.add_food(&entry).await?;
            println!("Food added: {} ({} kcal) [{}]", created.name, created.calories, created.document_id);
        }
        FoodCommand::Delete { document_id } => {
            session.remove_food(&DocumentId::new(document_id)).await?;
            println!("Food deleted.");
        }
        FoodCommand::Snap { path, meal, save } => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let gemini = GeminiClient::from_config(config)?;
            let guess = gemini
                .analyze_food_image_bytes(&bytes, image_mime_type(&path))
                .await?;
            match guess.macros_summary() {
                Some(macros) => println!("Detected: {} (~{} kcal, {})", guess.name, guess.calories, macros),
                None => println!("Detected: {} (~{} kcal)", guess.name, guess.calories),
            }
            if save {
                let created = session.add_food(&guess.to_new_entry(meal)).await?;
                println!("Food added [{}]", created.document_id);
            }
        }
        FoodCommand::Describe {
            description,
            meal,
            save,
        } => {
            let gemini = GeminiClient::from_config(config)?;
            let guess = gemini.analyze_food_description(&description).await?;
            println!("Detected: {} (~{} kcal)", guess.name, guess.calories);
            if save {
                let created = session.add_food(&guess.to_new_entry(meal)).await?;
                println!("Food added [{}]", created.document_id);
            }
        }
    }
    Ok(())
}

async fn run_activity(session: &mut Session, action: ActivityCommand) -> anyhow::Result<()> {
    match action {
        ActivityCommand::List { date } => {
            session.fetch_activity_logs().await?;
            let day = date.unwrap_or_else(today_local);
            let summary = session.summary_for(day);
            for entry in fittrack::models::stats::entries_on(session.activity_logs(), day) {
                println!(
                    "  {:<20} {:>4} min {:>5} kcal  [{}]",
                    entry.name, entry.duration, entry.calories, entry.document_id
                );
            }
            println!(
                "Burned today: {} kcal, active time: {} min",
                summary.calories_burned, summary.active_minutes
            );
        }
        ActivityCommand::Add {
            name,
            duration,
            calories,
            date,
        } => {
            let mut entry = match calories {
                Some(calories) => NewActivityEntry::new(name, duration, calories),
                None => NewActivityEntry::estimated(name, duration),
            };
            entry.date = date;
            let created = session.add_activity(&entry).await?;
            println!(
                "Activity added: {} ({} min, {} kcal) [{}]",
                created.name, created.duration, created.calories, created.document_id
            );
        }
        ActivityCommand::Quick { name } => {
            let Some(preset) = find_preset(&name) else {
                bail!("unknown preset '{}'; see `fittrack activity presets`", name);
            };
            let created = session.add_activity(&preset.quick_add()).await?;
            println!(
                "Activity added: {} ({} min, {} kcal)",
                created.name, created.duration, created.calories
            );
        }
        ActivityCommand::Delete { document_id } => {
            session.remove_activity(&DocumentId::new(document_id)).await?;
            println!("Activity deleted.");
        }
        ActivityCommand::Presets => {
            for preset in QUICK_ACTIVITIES {
                println!("  {:<16} {} cal/min", preset.name, preset.rate);
            }
        }
    }
    Ok(())
}

fn require_signed_in(view: SessionView) -> anyhow::Result<()> {
    if view == SessionView::Anonymous || view == SessionView::Loading {
        return Err(fittrack::AppError::NotAuthenticated.into());
    }
    Ok(())
}

fn print_next_step(session: &Session) {
    if session.view() == SessionView::NeedsOnboarding {
        println!("Next: complete your profile with `fittrack onboard --age .. --weight ..`");
    }
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn image_mime_type(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Initialize logging to stderr; `FITTRACK_LOG_FORMAT=json` selects JSON lines.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fittrack=info,warn"));

    let json = std::env::var("FITTRACK_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
