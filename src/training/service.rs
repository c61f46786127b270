//! Training service: records attempts and derives per-user summaries from
//! the document store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::accuracy::{accuracy, Accuracy};
use super::attempt::{attempts_collection, Attempt};
use super::history::{history, HistoryQuery};
use super::pitch::{evaluate, Difficulty, Note, Outcome};
use super::progress::{progress, Progress};
use super::streak::{streak, Streak};
use crate::error::{AppError, Result};
use crate::store::{validate_segment, DocumentPath, DocumentStore};

/// Attempts shown on the profile.
pub const RECENT_ATTEMPTS: usize = 3;

/// Largest `elapsed_ms` accepted; stored integers are signed 64-bit.
pub const MAX_ELAPSED_MS: u64 = i64::MAX as u64;

/// Answer submitted by the app.
#[derive(Debug, Clone)]
pub struct AttemptInput {
    pub difficulty: Difficulty,
    pub target: Note,
    pub answer: Option<Note>,
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedAttempt {
    pub attempt: Attempt,
    pub outcome: Outcome,
    pub progress: Progress,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next: u64,
    pub streak_days: u32,
    pub accuracy_7d: f64,
    pub recent_attempts: Vec<Attempt>,
}

// == Training Service ==
#[derive(Clone)]
pub struct TrainingService {
    store: Arc<dyn DocumentStore>,
}

impl TrainingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Scores and stores an attempt.
    pub async fn record_attempt(&self, user_id: &str, input: AttemptInput) -> Result<RecordedAttempt> {
        validate_segment(user_id)?;
        if input.elapsed_ms.is_some_and(|ms| ms > MAX_ELAPSED_MS) {
            return Err(AppError::InvalidRequest(format!(
                "elapsed_ms must be at most {}",
                MAX_ELAPSED_MS
            )));
        }

        let outcome = evaluate(input.target, input.answer, input.difficulty, input.elapsed_ms);
        let attempt = Attempt::new(
            input.difficulty,
            input.target,
            input.answer,
            input.elapsed_ms,
            &outcome,
            Utc::now(),
        );

        let path = DocumentPath::new(attempts_collection(user_id), attempt.id.clone())?;
        self.store.set(&path, attempt.to_fields()?).await?;
        info!(
            "Recorded attempt {} for {}: {} vs {} ({}), score {}",
            attempt.id,
            user_id,
            attempt.target,
            attempt
                .answer
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            attempt.difficulty,
            attempt.score
        );

        let attempts = self.attempts(user_id).await?;
        Ok(RecordedAttempt {
            progress: progress(&attempts, Utc::now()),
            attempt,
            outcome,
        })
    }

    /// Every stored attempt for a user. Malformed documents are skipped.
    pub async fn attempts(&self, user_id: &str) -> Result<Vec<Attempt>> {
        validate_segment(user_id)?;

        let documents = self.store.list(&attempts_collection(user_id)).await?;
        Ok(documents
            .iter()
            .filter_map(|doc| match Attempt::from_document(doc) {
                Ok(attempt) => Some(attempt),
                Err(err) => {
                    warn!("Skipping attempt for {}: {}", user_id, err);
                    None
                }
            })
            .collect())
    }

    pub async fn history(&self, user_id: &str, query: &HistoryQuery) -> Result<Vec<Attempt>> {
        Ok(history(self.attempts(user_id).await?, query))
    }

    pub async fn progress(&self, user_id: &str) -> Result<Progress> {
        Ok(progress(&self.attempts(user_id).await?, Utc::now()))
    }

    pub async fn streak(&self, user_id: &str) -> Result<Streak> {
        Ok(streak(&self.attempts(user_id).await?, Utc::now().date_naive()))
    }

    pub async fn accuracy(&self, user_id: &str) -> Result<Accuracy> {
        Ok(accuracy(&self.attempts(user_id).await?, Utc::now()))
    }

    /// Profile summary as of now.
    ///
    /// A user with neither a `users/{id}` document nor any attempts is not found.
    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        self.profile_at(user_id, Utc::now()).await
    }

    pub async fn profile_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<Profile> {
        let user_path = DocumentPath::new("users", user_id)?;
        let user = self.store.get(&user_path).await?;
        let attempts = self.attempts(user_id).await?;

        if user.is_none() && attempts.is_empty() {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }

        let display_name = user
            .as_ref()
            .and_then(|doc| doc.get_str("display_name").or_else(|| doc.get_str("displayName")))
            .unwrap_or(user_id)
            .to_string();

        let progress = progress(&attempts, now);
        let streak = streak(&attempts, now.date_naive());
        let accuracy = accuracy(&attempts, now);
        let recent = history(
            attempts,
            &HistoryQuery {
                limit: RECENT_ATTEMPTS,
                ..HistoryQuery::default()
            },
        );

        Ok(Profile {
            user_id: user_id.to_string(),
            display_name,
            level: progress.level,
            xp: progress.xp,
            xp_to_next: progress.xp_to_next,
            streak_days: streak.current,
            accuracy_7d: accuracy.overall.accuracy,
            recent_attempts: recent,
        })
    }
}
