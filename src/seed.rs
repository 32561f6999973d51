//! First-run data: the default admin account, a starter exercise library,
//! and the seven standard questionnaire items.
//!
//! Seeding is idempotent. Each item is created only if absent, so running
//! the binary twice (or running both binaries against the same file) leaves
//! the store unchanged.

use tracing::{info, warn};

use crate::auth::hash_password;
use crate::db::Database;
use crate::error::Result;
use crate::models::{ExerciseCategory, NewAnxietyQuestion, NewExercise, NewUser, Role};
use crate::repository::{
    AnxietyQuestionRepository, ExerciseFilter, ExerciseRepository, QuestionFilter, Repository,
    UserRepository,
};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Meant to be changed after first login; the admin binary prints a warning
/// until it is.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// The standard seven-item anxiety questionnaire, in order.
const QUESTION_TEXTS: [&str; 7] = [
    "Feeling nervous, anxious, or on edge",
    "Not being able to stop or control worrying",
    "Worrying too much about different things",
    "Trouble relaxing",
    "Being so restless that it is hard to sit still",
    "Becoming easily annoyed or irritable",
    "Feeling afraid as if something awful might happen",
];

const STARTER_EXERCISES: [(&str, ExerciseCategory, i64); 4] = [
    ("Box Breathing", ExerciseCategory::Breathing, 5),
    ("Body Scan Meditation", ExerciseCategory::Meditation, 15),
    ("Progressive Muscle Relaxation", ExerciseCategory::GuidedRelaxation, 20),
    ("Calm Piano Session", ExerciseCategory::Music, 10),
];

/// Populate an empty store with its defaults. Safe to call on every startup.
pub fn seed_defaults(db: &Database) -> Result<()> {
    seed_admin(db)?;
    seed_exercises(db)?;
    seed_questions(db)?;
    Ok(())
}

fn seed_admin(db: &Database) -> Result<()> {
    let users = UserRepository::new(db.clone());
    if users.username_exists(DEFAULT_ADMIN_USERNAME)? {
        return Ok(());
    }

    users.create(&NewUser {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
        email: None,
        role: Role::Admin,
    })?;
    warn!(
        username = DEFAULT_ADMIN_USERNAME,
        "Default admin created with the default password; change it"
    );
    Ok(())
}

fn seed_exercises(db: &Database) -> Result<()> {
    let exercises = ExerciseRepository::new(db.clone());
    let existing = exercises.list(&ExerciseFilter {
        category: None,
        include_inactive: true,
    })?;
    if !existing.is_empty() {
        return Ok(());
    }

    for (name, category, duration) in STARTER_EXERCISES {
        exercises.create(&NewExercise {
            name: name.to_string(),
            description: None,
            duration,
            category,
        })?;
    }
    info!(count = STARTER_EXERCISES.len(), "Starter exercises seeded");
    Ok(())
}

fn seed_questions(db: &Database) -> Result<()> {
    let questions = AnxietyQuestionRepository::new(db.clone());
    let existing = questions.list(&QuestionFilter)?;
    if !existing.is_empty() {
        return Ok(());
    }

    for (index, text) in QUESTION_TEXTS.iter().enumerate() {
        questions.create(&NewAnxietyQuestion {
            position: index as i64 + 1,
            text: text.to_string(),
        })?;
    }
    info!("Questionnaire seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::open_in_memory().expect("db");
        seed_defaults(&db).expect("first seed");
        seed_defaults(&db).expect("second seed");

        let counts: std::collections::HashMap<_, _> =
            db.table_counts().expect("counts").into_iter().collect();
        assert_eq!(counts["users"], 1);
        assert_eq!(counts["exercises"], 4);
        assert_eq!(counts["anxiety_questions"], 7);
    }

    #[test]
    fn test_default_admin_can_log_in() {
        let db = Database::open_in_memory().expect("db");
        seed_defaults(&db).expect("seed");

        let auth = AuthService::new(UserRepository::new(db));
        let admin = auth
            .authenticate(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .expect("login");
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn test_seeded_questions_are_in_order() {
        let db = Database::open_in_memory().expect("db");
        seed_defaults(&db).expect("seed");

        let questions = AnxietyQuestionRepository::new(db)
            .list(&QuestionFilter)
            .expect("list");
        assert_eq!(questions.len(), 7);
        assert_eq!(questions[0].text, QUESTION_TEXTS[0]);
        assert_eq!(questions[6].text, QUESTION_TEXTS[6]);
    }
}
