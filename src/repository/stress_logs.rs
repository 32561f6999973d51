use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{map_constraint, now, Repository};
use crate::config::{STRESS_LEVEL_MAX, STRESS_LEVEL_MIN};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewStressLog, StressLog, StressLogPatch};

#[derive(Clone)]
pub struct StressLogRepository {
    db: Database,
}

/// Options for listing stress logs.
#[derive(Debug, Clone, Default)]
pub struct StressLogFilter {
    pub user_id: Option<i64>,
    /// Inclusive ISO date lower bound.
    pub start_date: Option<String>,
    /// Inclusive ISO date upper bound.
    pub end_date: Option<String>,
    pub limit: Option<i64>,
}

fn map_log(row: &Row) -> rusqlite::Result<StressLog> {
    Ok(StressLog {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        date: row.get("date")?,
        stress_level: row.get("stress_level")?,
        notes: row.get("notes")?,
        sleep_hours: row.get("sleep_hours")?,
        physical_activity: row.get("physical_activity")?,
        created_at: row.get("created_at")?,
    })
}

fn validate_level(level: i64) -> Result<()> {
    if !(STRESS_LEVEL_MIN..=STRESS_LEVEL_MAX).contains(&level) {
        return Err(Error::validation(format!(
            "stress level {} is out of range {}..={}",
            level, STRESS_LEVEL_MIN, STRESS_LEVEL_MAX
        )));
    }
    Ok(())
}

impl StressLogRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Average stress level over the user's logs dated within the last
    /// `days` days, or `None` when there is no data.
    pub fn average_for_user(&self, user_id: i64, days: i64) -> Result<Option<f64>> {
        self.db.with_tx(|tx| {
            let avg: Option<f64> = tx.query_row(
                "SELECT AVG(stress_level) FROM stress_logs
                 WHERE user_id = ?1 AND date >= date('now', '-' || ?2 || ' days')",
                params![user_id, days],
                |row| row.get(0),
            )?;
            Ok(avg)
        })
    }
}

impl Repository for StressLogRepository {
    type Entity = StressLog;
    type New = NewStressLog;
    type Patch = StressLogPatch;
    type Filter = StressLogFilter;

    const ENTITY: &'static str = "stress log";

    fn create(&self, new: &NewStressLog) -> Result<i64> {
        validate_level(new.stress_level)?;
        if new.date.trim().is_empty() {
            return Err(Error::validation("log date must not be empty"));
        }
        if let Some(hours) = new.sleep_hours {
            if !(0.0..=24.0).contains(&hours) {
                return Err(Error::validation(format!(
                    "sleep hours {} is out of range 0..=24",
                    hours
                )));
            }
        }

        self.db.with_tx(|tx| {
            let id = tx
                .query_row(
                    "INSERT INTO stress_logs
                     (user_id, date, stress_level, notes, sleep_hours, physical_activity, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     RETURNING id",
                    params![
                        new.user_id,
                        new.date,
                        new.stress_level,
                        new.notes,
                        new.sleep_hours,
                        new.physical_activity,
                        now()
                    ],
                    |row| row.get(0),
                )
                .map_err(|e| map_constraint(e, "stress log references an unknown user"))?;

            info!(user_id = new.user_id, level = new.stress_level, "Stress log created");
            Ok(id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<StressLog>> {
        self.db.with_tx(|tx| {
            tx.query_row(
                "SELECT * FROM stress_logs WHERE id = ?1",
                params![id],
                map_log,
            )
            .optional()
            .map_err(Error::Storage)
        })
    }

    fn list(&self, filter: &StressLogFilter) -> Result<Vec<StressLog>> {
        self.db.with_tx(|tx| {
            let mut query = String::from("SELECT * FROM stress_logs WHERE 1=1");
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(user_id) = filter.user_id {
                query.push_str(" AND user_id = ?");
                params.push(Box::new(user_id));
            }
            if let Some(start) = &filter.start_date {
                query.push_str(" AND date >= ?");
                params.push(Box::new(start.clone()));
            }
            if let Some(end) = &filter.end_date {
                query.push_str(" AND date <= ?");
                params.push(Box::new(end.clone()));
            }
            query.push_str(" ORDER BY date DESC, id DESC");
            if let Some(limit) = filter.limit {
                query.push_str(" LIMIT ?");
                params.push(Box::new(limit));
            }

            let mut stmt = tx.prepare(&query)?;
            let logs = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), map_log)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(logs)
        })
    }

    fn update(&self, id: i64, patch: &StressLogPatch) -> Result<StressLog> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(level) = patch.stress_level {
            validate_level(level)?;
            sets.push("stress_level = ?");
            values.push(Box::new(level));
        }
        if let Some(notes) = &patch.notes {
            sets.push("notes = ?");
            values.push(Box::new(notes.clone()));
        }
        if let Some(hours) = patch.sleep_hours {
            if !(0.0..=24.0).contains(&hours) {
                return Err(Error::validation(format!(
                    "sleep hours {} is out of range 0..=24",
                    hours
                )));
            }
            sets.push("sleep_hours = ?");
            values.push(Box::new(hours));
        }
        if let Some(activity) = patch.physical_activity {
            sets.push("physical_activity = ?");
            values.push(Box::new(activity));
        }

        if sets.is_empty() {
            return Err(Error::validation("update patch has no fields"));
        }

        self.db.with_tx(|tx| {
            let query = format!("UPDATE stress_logs SET {} WHERE id = ?", sets.join(", "));
            values.push(Box::new(id));

            let affected = tx.execute(&query, rusqlite::params_from_iter(values.iter()))?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }

            info!(id, "Stress log updated");
            tx.query_row(
                "SELECT * FROM stress_logs WHERE id = ?1",
                params![id],
                map_log,
            )
            .map_err(Error::Storage)
        })
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.db.with_tx(|tx| {
            let affected = tx.execute("DELETE FROM stress_logs WHERE id = ?1", params![id])?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }
            info!(id, "Stress log deleted");
            Ok(())
        })
    }
}
