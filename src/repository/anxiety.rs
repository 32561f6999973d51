//! Repositories for the GAD-7 questionnaire: the fixed question set and the
//! per-user results.
//!
//! The questionnaire shape (7 questions, 0-3 answer scale) is structural.
//! Question text is admin-editable; adding an eighth question or deleting
//! one is a validation error, not an admin capability. A result's score is
//! recomputed from its stored answers on every read so the two can never
//! drift apart.

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{map_constraint, now, Repository};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    AnxietyQuestion, AnxietyQuestionPatch, AnxietyTestResult, NewAnxietyQuestion,
    NewAnxietyTestResult,
};
use crate::scoring::{self, QUESTION_COUNT};

// ==================== Questions ====================

#[derive(Clone)]
pub struct AnxietyQuestionRepository {
    db: Database,
}

/// Questions have no listing options; the set is fixed and always returned
/// in questionnaire order.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter;

fn map_question(row: &Row) -> rusqlite::Result<AnxietyQuestion> {
    Ok(AnxietyQuestion {
        id: row.get("id")?,
        position: row.get("position")?,
        text: row.get("text")?,
    })
}

impl AnxietyQuestionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Repository for AnxietyQuestionRepository {
    type Entity = AnxietyQuestion;
    type New = NewAnxietyQuestion;
    type Patch = AnxietyQuestionPatch;
    type Filter = QuestionFilter;

    const ENTITY: &'static str = "anxiety question";

    /// Insert a question at a free position. Used by the seeder; once all
    /// seven positions are occupied every further create fails, which keeps
    /// the battery at exactly seven questions.
    fn create(&self, new: &NewAnxietyQuestion) -> Result<i64> {
        if !(1..=QUESTION_COUNT as i64).contains(&new.position) {
            return Err(Error::validation(format!(
                "question position {} is out of range 1..={}",
                new.position, QUESTION_COUNT
            )));
        }
        if new.text.trim().is_empty() {
            return Err(Error::validation("question text must not be empty"));
        }

        self.db.with_tx(|tx| {
            let id = tx
                .query_row(
                    "INSERT INTO anxiety_questions (position, text)
                     VALUES (?1, ?2)
                     RETURNING id",
                    params![new.position, new.text],
                    |row| row.get(0),
                )
                .map_err(|e| {
                    map_constraint(
                        e,
                        &format!("question position {} is already occupied", new.position),
                    )
                })?;

            info!(position = new.position, "Anxiety question created");
            Ok(id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<AnxietyQuestion>> {
        self.db.with_tx(|tx| {
            tx.query_row(
                "SELECT * FROM anxiety_questions WHERE id = ?1",
                params![id],
                map_question,
            )
            .optional()
            .map_err(Error::Storage)
        })
    }

    fn list(&self, _filter: &QuestionFilter) -> Result<Vec<AnxietyQuestion>> {
        self.db.with_tx(|tx| {
            let mut stmt = tx.prepare("SELECT * FROM anxiety_questions ORDER BY position ASC")?;
            let questions = stmt
                .query_map([], map_question)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(questions)
        })
    }

    /// Only the text is editable.
    fn update(&self, id: i64, patch: &AnxietyQuestionPatch) -> Result<AnxietyQuestion> {
        let text = match &patch.text {
            Some(text) if !text.trim().is_empty() => text.clone(),
            Some(_) => return Err(Error::validation("question text must not be empty")),
            None => return Err(Error::validation("update patch has no fields")),
        };

        self.db.with_tx(|tx| {
            let affected = tx.execute(
                "UPDATE anxiety_questions SET text = ?1 WHERE id = ?2",
                params![text, id],
            )?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }

            info!(id, "Anxiety question text updated");
            tx.query_row(
                "SELECT * FROM anxiety_questions WHERE id = ?1",
                params![id],
                map_question,
            )
            .map_err(Error::Storage)
        })
    }

    fn delete(&self, _id: i64) -> Result<()> {
        Err(Error::validation(
            "the questionnaire has a fixed set of 7 questions; edit the text instead",
        ))
    }
}

// ==================== Results ====================

#[derive(Clone)]
pub struct AnxietyResultRepository {
    db: Database,
}

/// Options for listing test results.
#[derive(Debug, Clone, Default)]
pub struct AnxietyResultFilter {
    pub user_id: Option<i64>,
    pub limit: Option<i64>,
}

/// The score column is never read back; it exists only for ad-hoc SQL
/// inspection. The authoritative score is recomputed from the answers here.
fn map_result(row: &Row) -> rusqlite::Result<AnxietyTestResult> {
    let raw: String = row.get("answers")?;
    let answers: Vec<u8> = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    let score = scoring::score_test(&answers).map_err(super::column_error)?;

    Ok(AnxietyTestResult {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        taken_at: row.get("taken_at")?,
        answers,
        score,
    })
}

impl AnxietyResultRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Repository for AnxietyResultRepository {
    type Entity = AnxietyTestResult;
    type New = NewAnxietyTestResult;
    // A completed questionnaire is a fact; there is nothing to edit.
    type Patch = ();
    type Filter = AnxietyResultFilter;

    const ENTITY: &'static str = "anxiety test result";

    fn create(&self, new: &NewAnxietyTestResult) -> Result<i64> {
        let score = scoring::score_test(&new.answers)?;
        let answers_json =
            serde_json::to_string(&new.answers).map_err(|e| Error::validation(e.to_string()))?;

        self.db.with_tx(|tx| {
            let id = tx
                .query_row(
                    "INSERT INTO anxiety_results (user_id, taken_at, answers, score)
                     VALUES (?1, ?2, ?3, ?4)
                     RETURNING id",
                    params![new.user_id, now(), answers_json, score],
                    |row| row.get(0),
                )
                .map_err(|e| map_constraint(e, "test result references an unknown user"))?;

            info!(user_id = new.user_id, score, "Anxiety test result recorded");
            Ok(id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<AnxietyTestResult>> {
        self.db.with_tx(|tx| {
            tx.query_row(
                "SELECT * FROM anxiety_results WHERE id = ?1",
                params![id],
                map_result,
            )
            .optional()
            .map_err(Error::Storage)
        })
    }

    fn list(&self, filter: &AnxietyResultFilter) -> Result<Vec<AnxietyTestResult>> {
        self.db.with_tx(|tx| {
            let mut query = String::from("SELECT * FROM anxiety_results WHERE 1=1");
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(user_id) = filter.user_id {
                query.push_str(" AND user_id = ?");
                params.push(Box::new(user_id));
            }
            query.push_str(" ORDER BY taken_at DESC, id DESC");
            if let Some(limit) = filter.limit {
                query.push_str(" LIMIT ?");
                params.push(Box::new(limit));
            }

            let mut stmt = tx.prepare(&query)?;
            let results = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), map_result)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(results)
        })
    }

    fn update(&self, _id: i64, _patch: &()) -> Result<AnxietyTestResult> {
        Err(Error::validation(
            "test results are read-only after creation",
        ))
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.db.with_tx(|tx| {
            let affected = tx.execute("DELETE FROM anxiety_results WHERE id = ?1", params![id])?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }
            info!(id, "Anxiety test result deleted");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, Role};
    use crate::repository::UserRepository;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().expect("db");
        let user_id = UserRepository::new(db.clone())
            .create(&NewUser {
                username: "alice".to_string(),
                password_hash: "h".to_string(),
                email: None,
                role: Role::User,
            })
            .expect("user");
        (db, user_id)
    }

    fn seed_questions(repo: &AnxietyQuestionRepository) {
        for position in 1..=7 {
            repo.create(&NewAnxietyQuestion {
                position,
                text: format!("Question {}", position),
            })
            .expect("seed question");
        }
    }

    // ==================== Question Tests ====================

    #[test]
    fn test_questions_listed_in_position_order() {
        let (db, _) = setup();
        let repo = AnxietyQuestionRepository::new(db);
        // Insert out of order on purpose.
        for position in [3, 1, 2, 7, 5, 4, 6] {
            repo.create(&NewAnxietyQuestion {
                position,
                text: format!("Question {}", position),
            })
            .expect("create");
        }

        let questions = repo.list(&QuestionFilter).expect("list");
        let positions: Vec<i64> = questions.iter().map(|q| q.position).collect();
        assert_eq!(positions, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_eighth_question_rejected() {
        let (db, _) = setup();
        let repo = AnxietyQuestionRepository::new(db);
        seed_questions(&repo);

        let result = repo.create(&NewAnxietyQuestion {
            position: 8,
            text: "One too many".to_string(),
        });
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_occupied_position_rejected() {
        let (db, _) = setup();
        let repo = AnxietyQuestionRepository::new(db);
        seed_questions(&repo);

        let result = repo.create(&NewAnxietyQuestion {
            position: 3,
            text: "Duplicate".to_string(),
        });
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(repo.list(&QuestionFilter).expect("list").len(), 7);
    }

    #[test]
    fn test_question_text_is_editable() {
        let (db, _) = setup();
        let repo = AnxietyQuestionRepository::new(db);
        seed_questions(&repo);
        let first = &repo.list(&QuestionFilter).expect("list")[0];

        let updated = repo
            .update(
                first.id,
                &AnxietyQuestionPatch {
                    text: Some("Feeling nervous, anxious, or on edge".to_string()),
                },
            )
            .expect("update");
        assert_eq!(updated.text, "Feeling nervous, anxious, or on edge");
        assert_eq!(updated.position, first.position);
    }

    #[test]
    fn test_question_delete_is_refused() {
        let (db, _) = setup();
        let repo = AnxietyQuestionRepository::new(db);
        seed_questions(&repo);
        let first_id = repo.list(&QuestionFilter).expect("list")[0].id;

        assert!(matches!(repo.delete(first_id), Err(Error::Validation(_))));
        assert_eq!(repo.list(&QuestionFilter).expect("list").len(), 7);
    }

    // ==================== Result Tests ====================

    #[test]
    fn test_create_then_get_recomputes_score() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db);

        let id = repo
            .create(&NewAnxietyTestResult {
                user_id,
                answers: vec![0, 1, 2, 3, 2, 1, 0],
            })
            .expect("create");

        let result = repo.get_by_id(id).expect("get");
        assert_eq!(result.answers, vec![0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(result.score, 9);
    }

    #[test]
    fn test_score_never_trusted_from_storage() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db.clone());
        let id = repo
            .create(&NewAnxietyTestResult {
                user_id,
                answers: vec![1, 1, 1, 1, 1, 1, 1],
            })
            .expect("create");

        // Corrupt the stored score column directly; the read side must
        // still report the sum of the answers.
        db.with_tx(|tx| {
            tx.execute(
                "UPDATE anxiety_results SET score = 99 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .expect("corrupt");

        let result = repo.get_by_id(id).expect("get");
        assert_eq!(result.score, 7);
    }

    #[test]
    fn test_create_invalid_answers_rejected() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db);

        assert!(repo
            .create(&NewAnxietyTestResult {
                user_id,
                answers: vec![1, 2, 3],
            })
            .is_err());
        assert!(repo
            .create(&NewAnxietyTestResult {
                user_id,
                answers: vec![0, 0, 0, 4, 0, 0, 0],
            })
            .is_err());
    }

    #[test]
    fn test_results_are_read_only() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db);
        let id = repo
            .create(&NewAnxietyTestResult {
                user_id,
                answers: vec![0; 7],
            })
            .expect("create");

        assert!(matches!(repo.update(id, &()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_delete_is_hard() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db);
        let id = repo
            .create(&NewAnxietyTestResult {
                user_id,
                answers: vec![0; 7],
            })
            .expect("create");

        repo.delete(id).expect("delete");
        assert!(repo.find_by_id(id).expect("query").is_none());
    }

    #[test]
    fn test_list_filters_by_user_with_limit() {
        let (db, user_id) = setup();
        let repo = AnxietyResultRepository::new(db);
        for _ in 0..3 {
            repo.create(&NewAnxietyTestResult {
                user_id,
                answers: vec![1; 7],
            })
            .expect("create");
        }

        let results = repo
            .list(&AnxietyResultFilter {
                user_id: Some(user_id),
                limit: Some(2),
            })
            .expect("list");
        assert_eq!(results.len(), 2);
    }
}
