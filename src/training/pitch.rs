//! Pitch exercise rules: notes, difficulty timers, and answer scoring.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Score for a correct answer
pub const CORRECT_SCORE: u32 = 100;
/// Score for a wrong answer given in time
pub const WRONG_SCORE: u32 = 40;
/// Score when time runs out
pub const TIMEOUT_SCORE: u32 = 0;

// == Note ==
/// Natural notes offered by the exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Note {
    pub const ALL: [Note; 7] = [Note::C, Note::D, Note::E, Note::F, Note::G, Note::A, Note::B];

    pub fn as_str(self) -> &'static str {
        match self {
            Note::C => "C",
            Note::D => "D",
            Note::E => "E",
            Note::F => "F",
            Note::G => "G",
            Note::A => "A",
            Note::B => "B",
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Note {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidRequest(format!("Unknown note '{}'", s)))
    }
}

// == Difficulty ==
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Seconds the player has to answer.
    pub fn time_limit_secs(self) -> u64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 6,
            Difficulty::Hard => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidRequest(format!("Unknown difficulty '{}'", s)))
    }
}

// == Outcome ==
/// Result of scoring one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub correct: bool,
    pub timed_out: bool,
    pub score: u32,
    pub feedback: String,
}

/// Scores an answer.
///
/// No answer, or an answer after the difficulty's time limit, is a timeout.
pub fn evaluate(
    target: Note,
    answer: Option<Note>,
    difficulty: Difficulty,
    elapsed_ms: Option<u64>,
) -> Outcome {
    let limit_ms = difficulty.time_limit_secs() * 1000;
    let late = elapsed_ms.is_some_and(|ms| ms > limit_ms);

    match answer {
        Some(answer) if !late => {
            let correct = answer == target;
            Outcome {
                correct,
                timed_out: false,
                score: if correct { CORRECT_SCORE } else { WRONG_SCORE },
                feedback: if correct {
                    "Nice! You got it.".to_string()
                } else {
                    format!("Close, it was {}.", target)
                },
            }
        }
        _ => Outcome {
            correct: false,
            timed_out: true,
            score: TIMEOUT_SCORE,
            feedback: "Time's up!".to_string(),
        },
    }
}

// == Exercise ==
/// A freshly generated pitch exercise.
#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub difficulty: Difficulty,
    pub time_limit_secs: u64,
    pub target: Note,
    pub options: Vec<Note>,
}

/// Picks a random target note for `difficulty`.
pub fn new_exercise(difficulty: Difficulty) -> Exercise {
    let target = *Note::ALL
        .choose(&mut rand::thread_rng())
        .unwrap_or(&Note::C);

    Exercise {
        difficulty,
        time_limit_secs: difficulty.time_limit_secs(),
        target,
        options: Note::ALL.to_vec(),
    }
}
