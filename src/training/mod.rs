//! Training Module
//!
//! Pitch ear-training rules and per-user statistics.
//!
//! # Contents
//! - [`pitch`]: notes, difficulty timers, scoring, exercise generation
//! - [`attempt`]: stored attempts under `users/{id}/attempts`
//! - [`progress`], [`streak`], [`accuracy`], [`history`]: summaries derived from attempts
//! - [`TrainingService`]: ties the above to a document store

pub mod accuracy;
pub mod attempt;
pub mod history;
pub mod pitch;
pub mod progress;
pub mod service;
pub mod streak;

pub use accuracy::Accuracy;
pub use attempt::Attempt;
pub use history::{HistoryQuery, SortOrder};
pub use pitch::{evaluate, new_exercise, Difficulty, Exercise, Note, Outcome};
pub use progress::Progress;
pub use service::{AttemptInput, Profile, RecordedAttempt, TrainingService};
pub use streak::Streak;
