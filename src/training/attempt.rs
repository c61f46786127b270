//! Stored exercise attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::pitch::{Difficulty, Note, Outcome};
use crate::error::{AppError, Result};
use crate::store::{Document, Fields};

/// Collection holding a user's attempts.
pub fn attempts_collection(user_id: &str) -> String {
    format!("users/{}/attempts", user_id)
}

// == Attempt ==
/// One answered, or timed-out, pitch exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub target: Note,
    pub answer: Option<Note>,
    pub correct: bool,
    pub score: u32,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

impl Attempt {
    /// Builds a new attempt from a scored answer.
    pub fn new(
        difficulty: Difficulty,
        target: Note,
        answer: Option<Note>,
        elapsed_ms: Option<u64>,
        outcome: &Outcome,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            difficulty,
            target,
            answer,
            correct: outcome.correct,
            score: outcome.score,
            elapsed_ms,
        }
    }

    /// Document fields; the id lives in the document path.
    pub fn to_fields(&self) -> Result<Fields> {
        match serde_json::to_value(self).map_err(|e| AppError::Internal(e.to_string()))? {
            Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            _ => Err(AppError::Internal("attempt did not serialize to an object".into())),
        }
    }

    /// Reads an attempt back from its document.
    pub fn from_document(document: &Document) -> Result<Self> {
        let mut fields = document.fields.clone();
        fields.insert("id".into(), Value::String(document.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            AppError::Upstream(format!("malformed attempt {}: {}", document.id, e))
        })
    }
}
