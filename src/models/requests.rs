//! Request DTOs
//!
//! Incoming HTTP bodies and query strings.

use serde::Deserialize;

use crate::error::Result;
use crate::store::Fields;
use crate::training::{AttemptInput, Difficulty, HistoryQuery, Note, SortOrder};

/// Body for `PUT /documents/*path`
#[derive(Debug, Clone, Deserialize)]
pub struct PutDocumentRequest {
    /// Complete field set; replaces the stored document
    pub fields: Fields,
}

/// Body for `POST /users/:user_id/attempts`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAttemptRequest {
    pub difficulty: Difficulty,
    pub target: Note,
    /// Missing when the timer ran out
    #[serde(default)]
    pub answer: Option<Note>,
    /// Time from prompt to answer
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

impl From<SubmitAttemptRequest> for AttemptInput {
    fn from(req: SubmitAttemptRequest) -> Self {
        AttemptInput {
            difficulty: req.difficulty,
            target: req.target,
            answer: req.answer,
            elapsed_ms: req.elapsed_ms,
        }
    }
}

/// Query for `GET /users/:user_id/attempts`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub difficulty: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

impl HistoryParams {
    /// Parses the loose query strings into a typed query.
    pub fn to_query(&self) -> Result<HistoryQuery> {
        let defaults = HistoryQuery::default();
        Ok(HistoryQuery {
            difficulty: self
                .difficulty
                .as_deref()
                .map(str::parse::<Difficulty>)
                .transpose()?,
            sort: self
                .sort
                .as_deref()
                .map(str::parse::<SortOrder>)
                .transpose()?
                .unwrap_or(SortOrder::Time),
            limit: self.limit.unwrap_or(defaults.limit),
        })
    }
}

/// Query for `GET /exercises/pitch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseParams {
    pub difficulty: Option<String>,
}

impl ExerciseParams {
    pub fn difficulty(&self) -> Result<Difficulty> {
        Ok(self
            .difficulty
            .as_deref()
            .map(str::parse::<Difficulty>)
            .transpose()?
            .unwrap_or_default())
    }
}
