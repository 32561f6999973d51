//! GAD-7 scoring.
//!
//! The questionnaire shape is structural: exactly 7 questions, each answered
//! on a 0-3 scale, total score 0-21 as the plain sum. Pure functions, no
//! state.

use crate::error::{Error, Result};

/// Number of questions in the GAD-7 battery.
pub const QUESTION_COUNT: usize = 7;

/// Highest value a single answer may take.
pub const MAX_ANSWER: u8 = 3;

/// Highest possible total score.
pub const MAX_SCORE: u8 = QUESTION_COUNT as u8 * MAX_ANSWER;

/// Compute the total score for a completed questionnaire.
///
/// Fails with a validation error unless `answers` has exactly
/// [`QUESTION_COUNT`] entries, each in `[0, MAX_ANSWER]`.
pub fn score_test(answers: &[u8]) -> Result<u8> {
    if answers.len() != QUESTION_COUNT {
        return Err(Error::validation(format!(
            "expected {} answers, got {}",
            QUESTION_COUNT,
            answers.len()
        )));
    }

    for (i, &answer) in answers.iter().enumerate() {
        if answer > MAX_ANSWER {
            return Err(Error::validation(format!(
                "answer {} is {}, must be between 0 and {}",
                i + 1,
                answer,
                MAX_ANSWER
            )));
        }
    }

    Ok(answers.iter().sum())
}

/// GAD-7 severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Band for a total score. Callers are expected to pass a score produced
    /// by [`score_test`]; anything above [`MAX_SCORE`] is clamped to severe.
    pub fn for_score(score: u8) -> Self {
        match score {
            0..=4 => Severity::Minimal,
            5..=9 => Severity::Mild,
            10..=14 => Severity::Moderate,
            _ => Severity::Severe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minimal => "minimal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    /// Translation key for the band label.
    pub fn translation_key(&self) -> &'static str {
        match self {
            Severity::Minimal => "anxiety.severity.minimal",
            Severity::Mild => "anxiety.severity.mild",
            Severity::Moderate => "anxiety.severity.moderate",
            Severity::Severe => "anxiety.severity.severe",
        }
    }
}
