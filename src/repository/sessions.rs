use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{column_error, map_constraint, now, Repository};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewSession, Session, SessionStatus};

#[derive(Clone)]
pub struct SessionRepository {
    db: Database,
}

/// Options for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub user_id: Option<i64>,
    pub exercise_id: Option<i64>,
    pub limit: Option<i64>,
}

fn map_session(row: &Row) -> rusqlite::Result<Session> {
    let status: String = row.get("status")?;
    Ok(Session {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        exercise_id: row.get("exercise_id")?,
        completed_at: row.get("completed_at")?,
        duration: row.get("duration")?,
        status: SessionStatus::from_str(&status).map_err(column_error)?,
        notes: row.get("notes")?,
    })
}

impl SessionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Repository for SessionRepository {
    type Entity = Session;
    type New = NewSession;
    // Sessions are a record of something that happened; there is nothing to
    // edit afterwards.
    type Patch = ();
    type Filter = SessionFilter;

    const ENTITY: &'static str = "session";

    fn create(&self, new: &NewSession) -> Result<i64> {
        if new.duration < 0 {
            return Err(Error::validation("session duration must not be negative"));
        }

        self.db.with_tx(|tx| {
            let id = tx
                .query_row(
                    "INSERT INTO sessions
                     (user_id, exercise_id, completed_at, duration, status, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     RETURNING id",
                    params![
                        new.user_id,
                        new.exercise_id,
                        now(),
                        new.duration,
                        new.status.as_str(),
                        new.notes
                    ],
                    |row| row.get(0),
                )
                .map_err(|e| {
                    map_constraint(e, "session references an unknown user or exercise")
                })?;

            info!(
                user_id = new.user_id,
                exercise_id = new.exercise_id,
                "Session recorded"
            );
            Ok(id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Session>> {
        self.db.with_tx(|tx| {
            tx.query_row(
                "SELECT * FROM sessions WHERE id = ?1",
                params![id],
                map_session,
            )
            .optional()
            .map_err(Error::Storage)
        })
    }

    fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        self.db.with_tx(|tx| {
            let mut query = String::from("SELECT * FROM sessions WHERE 1=1");
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(user_id) = filter.user_id {
                query.push_str(" AND user_id = ?");
                params.push(Box::new(user_id));
            }
            if let Some(exercise_id) = filter.exercise_id {
                query.push_str(" AND exercise_id = ?");
                params.push(Box::new(exercise_id));
            }
            query.push_str(" ORDER BY completed_at DESC, id DESC");
            if let Some(limit) = filter.limit {
                query.push_str(" LIMIT ?");
                params.push(Box::new(limit));
            }

            let mut stmt = tx.prepare(&query)?;
            let sessions = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), map_session)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
    }

    fn update(&self, _id: i64, _patch: &()) -> Result<Session> {
        Err(Error::validation("sessions are read-only after creation"))
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.db.with_tx(|tx| {
            let affected = tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }
            info!(id, "Session deleted");
            Ok(())
        })
    }
}
