//! Attempt history filtering and ordering.

use std::str::FromStr;

use serde::Serialize;

use super::attempt::Attempt;
use super::pitch::Difficulty;
use crate::error::AppError;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first
    #[default]
    Time,
    /// Highest score first, newest first among equal scores
    Score,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(SortOrder::Time),
            "score" => Ok(SortOrder::Score),
            other => Err(AppError::InvalidRequest(format!(
                "Unknown sort '{}', expected 'time' or 'score'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub difficulty: Option<Difficulty>,
    pub sort: SortOrder,
    pub limit: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            difficulty: None,
            sort: SortOrder::Time,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Filters, orders, and truncates attempts.
pub fn history(mut attempts: Vec<Attempt>, query: &HistoryQuery) -> Vec<Attempt> {
    if let Some(difficulty) = query.difficulty {
        attempts.retain(|a| a.difficulty == difficulty);
    }

    match query.sort {
        SortOrder::Time => attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Score => attempts.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }

    attempts.truncate(query.limit.clamp(1, MAX_HISTORY_LIMIT));
    attempts
}
