use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{column_error, now, Repository};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Exercise, ExerciseCategory, ExercisePatch, NewExercise};

#[derive(Clone)]
pub struct ExerciseRepository {
    db: Database,
}

/// Options for listing exercises.
#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub category: Option<ExerciseCategory>,
    pub include_inactive: bool,
}

fn map_exercise(row: &Row) -> rusqlite::Result<Exercise> {
    let category: String = row.get("category")?;
    Ok(Exercise {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        duration: row.get("duration")?,
        category: ExerciseCategory::from_str(&category).map_err(column_error)?,
        is_active: row.get::<_, i64>("is_active")? != 0,
        created_at: row.get("created_at")?,
    })
}

impl ExerciseRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Repository for ExerciseRepository {
    type Entity = Exercise;
    type New = NewExercise;
    type Patch = ExercisePatch;
    type Filter = ExerciseFilter;

    const ENTITY: &'static str = "exercise";

    fn create(&self, new: &NewExercise) -> Result<i64> {
        if new.name.trim().is_empty() {
            return Err(Error::validation("exercise name must not be empty"));
        }
        if new.duration <= 0 {
            return Err(Error::validation("exercise duration must be positive"));
        }

        self.db.with_tx(|tx| {
            let id = tx.query_row(
                "INSERT INTO exercises (name, description, duration, category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id",
                params![
                    new.name,
                    new.description,
                    new.duration,
                    new.category.as_str(),
                    now()
                ],
                |row| row.get(0),
            )?;

            info!(name = %new.name, id, "Exercise created");
            Ok(id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Exercise>> {
        self.db.with_tx(|tx| {
            tx.query_row(
                "SELECT * FROM exercises WHERE id = ?1",
                params![id],
                map_exercise,
            )
            .optional()
            .map_err(Error::Storage)
        })
    }

    fn list(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>> {
        self.db.with_tx(|tx| {
            let mut query = String::from("SELECT * FROM exercises WHERE 1=1");
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if !filter.include_inactive {
                query.push_str(" AND is_active = 1");
            }
            if let Some(category) = filter.category {
                query.push_str(" AND category = ?");
                params.push(Box::new(category.as_str().to_string()));
            }
            query.push_str(" ORDER BY name ASC, id ASC");

            let mut stmt = tx.prepare(&query)?;
            let exercises = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), map_exercise)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(exercises)
        })
    }

    fn update(&self, id: i64, patch: &ExercisePatch) -> Result<Exercise> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(Error::validation("exercise name must not be empty"));
            }
            sets.push("name = ?");
            values.push(Box::new(name.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(duration) = patch.duration {
            if duration <= 0 {
                return Err(Error::validation("exercise duration must be positive"));
            }
            sets.push("duration = ?");
            values.push(Box::new(duration));
        }
        if let Some(category) = patch.category {
            sets.push("category = ?");
            values.push(Box::new(category.as_str().to_string()));
        }
        if let Some(is_active) = patch.is_active {
            sets.push("is_active = ?");
            values.push(Box::new(is_active as i64));
        }

        if sets.is_empty() {
            return Err(Error::validation("update patch has no fields"));
        }

        self.db.with_tx(|tx| {
            let query = format!("UPDATE exercises SET {} WHERE id = ?", sets.join(", "));
            values.push(Box::new(id));

            let affected = tx.execute(&query, rusqlite::params_from_iter(values.iter()))?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }

            info!(id, "Exercise updated");
            tx.query_row(
                "SELECT * FROM exercises WHERE id = ?1",
                params![id],
                map_exercise,
            )
            .map_err(Error::Storage)
        })
    }

    /// Disable rather than delete when sessions reference the exercise.
    fn delete(&self, id: i64) -> Result<()> {
        self.db.with_tx(|tx| {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM exercises WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }

            let referenced: i64 = tx.query_row(
                "SELECT COUNT(*) FROM sessions WHERE exercise_id = ?1",
                params![id],
                |row| row.get(0),
            )?;

            if referenced > 0 {
                tx.execute(
                    "UPDATE exercises SET is_active = 0 WHERE id = ?1",
                    params![id],
                )?;
                info!(id, "Exercise disabled (has sessions)");
            } else {
                tx.execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
                info!(id, "Exercise deleted");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ExerciseRepository {
        ExerciseRepository::new(Database::open_in_memory().expect("db"))
    }

    fn new_exercise(name: &str, category: ExerciseCategory) -> NewExercise {
        NewExercise {
            name: name.to_string(),
            description: Some("description".to_string()),
            duration: 10,
            category,
        }
    }

    #[test]
    fn test_create_then_get_round_trips() {
        let repo = repo();
        let id = repo
            .create(&new_exercise("Box breathing", ExerciseCategory::Breathing))
            .expect("create");

        let exercise = repo.get_by_id(id).expect("get");
        assert_eq!(exercise.name, "Box breathing");
        assert_eq!(exercise.category, ExerciseCategory::Breathing);
        assert_eq!(exercise.duration, 10);
        assert!(exercise.is_active);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let repo = repo();
        assert!(repo
            .create(&new_exercise("", ExerciseCategory::Music))
            .is_err());
        assert!(repo
            .create(&NewExercise {
                duration: 0,
                ..new_exercise("Zero", ExerciseCategory::Music)
            })
            .is_err());
    }

    #[test]
    fn test_list_filters_by_category() {
        let repo = repo();
        repo.create(&new_exercise("Box breathing", ExerciseCategory::Breathing))
            .expect("a");
        repo.create(&new_exercise("Body scan", ExerciseCategory::Meditation))
            .expect("b");

        let breathing = repo
            .list(&ExerciseFilter {
                category: Some(ExerciseCategory::Breathing),
                ..Default::default()
            })
            .expect("list");
        assert_eq!(breathing.len(), 1);
        assert_eq!(breathing[0].name, "Box breathing");
    }

    #[test]
    fn test_list_orders_by_name() {
        let repo = repo();
        repo.create(&new_exercise("Zen walk", ExerciseCategory::Meditation))
            .expect("a");
        repo.create(&new_exercise("Box breathing", ExerciseCategory::Breathing))
            .expect("b");

        let all = repo.list(&ExerciseFilter::default()).expect("list");
        assert_eq!(all[0].name, "Box breathing");
        assert_eq!(all[1].name, "Zen walk");
    }

    #[test]
    fn test_disable_hides_from_default_list() {
        let repo = repo();
        let id = repo
            .create(&new_exercise("Box breathing", ExerciseCategory::Breathing))
            .expect("create");

        repo.update(
            id,
            &ExercisePatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .expect("disable");

        assert!(repo.list(&ExerciseFilter::default()).expect("list").is_empty());
        assert_eq!(
            repo.list(&ExerciseFilter {
                include_inactive: true,
                ..Default::default()
            })
            .expect("list")
            .len(),
            1
        );
    }

    #[test]
    fn test_delete_unreferenced_is_hard() {
        let repo = repo();
        let id = repo
            .create(&new_exercise("Box breathing", ExerciseCategory::Breathing))
            .expect("create");

        repo.delete(id).expect("delete");
        assert!(repo.find_by_id(id).expect("query").is_none());
    }
}
