use rusqlite::{params, OptionalExtension, Row, Transaction};
use tracing::info;

use super::{column_error, map_constraint, now, Repository};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewUser, Role, User, UserPatch};

#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

/// Options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub include_inactive: bool,
    pub role: Option<Role>,
}

fn map_user(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        email: row.get("email")?,
        role: Role::from_str(&role).map_err(column_error)?,
        is_active: row.get::<_, i64>("is_active")? != 0,
        created_at: row.get("created_at")?,
    })
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Lookup by username; absence is expected on the login path, so this
    /// returns `None` rather than a not-found error.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.db.with_tx(|tx| {
            tx.query_row(
                "SELECT * FROM users WHERE username = ?1",
                params![username],
                map_user,
            )
            .optional()
            .map_err(Error::Storage)
        })
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.find_by_username(username)?.is_some())
    }

    /// True when any stress log, session, or test result references the user.
    fn is_referenced(tx: &Transaction, user_id: i64) -> Result<bool> {
        let count: i64 = tx.query_row(
            "SELECT (SELECT COUNT(*) FROM stress_logs WHERE user_id = ?1)
                  + (SELECT COUNT(*) FROM sessions WHERE user_id = ?1)
                  + (SELECT COUNT(*) FROM anxiety_results WHERE user_id = ?1)",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl Repository for UserRepository {
    type Entity = User;
    type New = NewUser;
    type Patch = UserPatch;
    type Filter = UserFilter;

    const ENTITY: &'static str = "user";

    fn create(&self, new: &NewUser) -> Result<i64> {
        if new.username.trim().is_empty() {
            return Err(Error::validation("username must not be empty"));
        }
        if new.password_hash.is_empty() {
            return Err(Error::validation("password hash must not be empty"));
        }

        self.db.with_tx(|tx| {
            let id = tx
                .query_row(
                    "INSERT INTO users (username, password_hash, email, role, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING id",
                    params![
                        new.username,
                        new.password_hash,
                        new.email,
                        new.role.as_str(),
                        now()
                    ],
                    |row| row.get(0),
                )
                .map_err(|e| {
                    map_constraint(e, &format!("username '{}' already exists", new.username))
                })?;

            info!(username = %new.username, id, "User created");
            Ok(id)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.db.with_tx(|tx| {
            tx.query_row("SELECT * FROM users WHERE id = ?1", params![id], map_user)
                .optional()
                .map_err(Error::Storage)
        })
    }

    fn list(&self, filter: &UserFilter) -> Result<Vec<User>> {
        self.db.with_tx(|tx| {
            let mut query = String::from("SELECT * FROM users WHERE 1=1");
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if !filter.include_inactive {
                query.push_str(" AND is_active = 1");
            }
            if let Some(role) = filter.role {
                query.push_str(" AND role = ?");
                params.push(Box::new(role.as_str().to_string()));
            }
            query.push_str(" ORDER BY created_at DESC, id DESC");

            let mut stmt = tx.prepare(&query)?;
            let users = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), map_user)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    fn update(&self, id: i64, patch: &UserPatch) -> Result<User> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(username) = &patch.username {
            if username.trim().is_empty() {
                return Err(Error::validation("username must not be empty"));
            }
            sets.push("username = ?");
            values.push(Box::new(username.clone()));
        }
        if let Some(email) = &patch.email {
            sets.push("email = ?");
            values.push(Box::new(email.clone()));
        }
        if let Some(role) = patch.role {
            sets.push("role = ?");
            values.push(Box::new(role.as_str().to_string()));
        }
        if let Some(is_active) = patch.is_active {
            sets.push("is_active = ?");
            values.push(Box::new(is_active as i64));
        }
        if let Some(hash) = &patch.password_hash {
            if hash.is_empty() {
                return Err(Error::validation("password hash must not be empty"));
            }
            sets.push("password_hash = ?");
            values.push(Box::new(hash.clone()));
        }

        if sets.is_empty() {
            return Err(Error::validation("update patch has no fields"));
        }

        self.db.with_tx(|tx| {
            let query = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
            values.push(Box::new(id));

            let affected = tx
                .execute(&query, rusqlite::params_from_iter(values.iter()))
                .map_err(|e| map_constraint(e, "username already exists"))?;
            if affected == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }

            info!(id, "User updated");
            tx.query_row("SELECT * FROM users WHERE id = ?1", params![id], map_user)
                .map_err(Error::Storage)
        })
    }

    /// Disable rather than delete when dependent records reference the user;
    /// hard delete only for unreferenced accounts.
    fn delete(&self, id: i64) -> Result<()> {
        self.db.with_tx(|tx| {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM users WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(Error::not_found(Self::ENTITY, id));
            }

            if Self::is_referenced(tx, id)? {
                tx.execute("UPDATE users SET is_active = 0 WHERE id = ?1", params![id])?;
                info!(id, "User disabled (has dependent records)");
            } else {
                tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
                info!(id, "User deleted");
            }
            Ok(())
        })
    }
}
