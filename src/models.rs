//! Entity types shared by the repository and service layers.
//!
//! Each entity is owned by exactly one repository; services read, transform,
//! and write back through that repository without caching copies.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ==================== User ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Salted hash, never the plain password. Format: `hex(salt)$hex(digest)`.
    pub password_hash: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Fields an admin may change on a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

// ==================== Stress log ====================

#[derive(Debug, Clone, PartialEq)]
pub struct StressLog {
    pub id: i64,
    pub user_id: i64,
    /// ISO date (YYYY-MM-DD) the entry refers to.
    pub date: String,
    /// Bounded scale, 1 (calm) to 10 (extreme).
    pub stress_level: i64,
    pub notes: Option<String>,
    pub sleep_hours: Option<f64>,
    /// Minutes of physical activity.
    pub physical_activity: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewStressLog {
    pub user_id: i64,
    pub date: String,
    pub stress_level: i64,
    pub notes: Option<String>,
    pub sleep_hours: Option<f64>,
    pub physical_activity: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct StressLogPatch {
    pub stress_level: Option<i64>,
    pub notes: Option<String>,
    pub sleep_hours: Option<f64>,
    pub physical_activity: Option<i64>,
}

// ==================== Exercise ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Breathing,
    Meditation,
    GuidedRelaxation,
    Music,
}

impl ExerciseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Breathing => "breathing",
            ExerciseCategory::Meditation => "meditation",
            ExerciseCategory::GuidedRelaxation => "guided_relaxation",
            ExerciseCategory::Music => "music",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "breathing" => Ok(ExerciseCategory::Breathing),
            "meditation" => Ok(ExerciseCategory::Meditation),
            "guided_relaxation" => Ok(ExerciseCategory::GuidedRelaxation),
            "music" => Ok(ExerciseCategory::Music),
            other => Err(Error::validation(format!(
                "unknown exercise category '{}'",
                other
            ))),
        }
    }

    /// Translation key for the category label.
    pub fn translation_key(&self) -> &'static str {
        match self {
            ExerciseCategory::Breathing => "exercise.breathing",
            ExerciseCategory::Meditation => "exercise.meditation",
            ExerciseCategory::GuidedRelaxation => "exercise.guided_relaxation",
            ExerciseCategory::Music => "exercise.music",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Planned duration in minutes.
    pub duration: i64,
    pub category: ExerciseCategory,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub duration: i64,
    pub category: ExerciseCategory,
}

#[derive(Debug, Clone, Default)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i64>,
    pub category: Option<ExerciseCategory>,
    pub is_active: Option<bool>,
}

// ==================== Session ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Incomplete,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Completed => "completed",
            SessionStatus::Incomplete => "incomplete",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "completed" => Ok(SessionStatus::Completed),
            "incomplete" => Ok(SessionStatus::Incomplete),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(Error::validation(format!(
                "unknown session status '{}'",
                other
            ))),
        }
    }
}

/// One finished (or broken-off) run of an exercise. Read-only after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub exercise_id: i64,
    pub completed_at: String,
    /// Minutes actually spent, which may differ from the exercise's plan.
    pub duration: i64,
    pub status: SessionStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub exercise_id: i64,
    pub duration: i64,
    pub status: SessionStatus,
    pub notes: Option<String>,
}

// ==================== Anxiety test ====================

/// One of the seven fixed GAD-7 questions. Only the text is admin-editable;
/// the count and the 0-3 answer scale are structural.
#[derive(Debug, Clone, PartialEq)]
pub struct AnxietyQuestion {
    pub id: i64,
    /// 1-based position in the questionnaire, unique, in [1, 7].
    pub position: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NewAnxietyQuestion {
    pub position: i64,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnxietyQuestionPatch {
    pub text: Option<String>,
}

/// A completed GAD-7 questionnaire. The score is derived from the answers on
/// every read, never trusted from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct AnxietyTestResult {
    pub id: i64,
    pub user_id: i64,
    pub taken_at: String,
    /// Exactly 7 answers, each in [0, 3].
    pub answers: Vec<u8>,
    /// Sum of the answers, in [0, 21]. Recomputed on read.
    pub score: u8,
}

#[derive(Debug, Clone)]
pub struct NewAnxietyTestResult {
    pub user_id: i64,
    pub answers: Vec<u8>,
}
