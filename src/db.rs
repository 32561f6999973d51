//! SQLite connection, schema management, and backup/restore.
//!
//! The whole application shares one database file. `Database` wraps the
//! connection in `Arc<Mutex<..>>` so repositories can hold cheap clones while
//! SQLite sees a single writer. Every repository operation goes through
//! [`Database::with_tx`], which guarantees commit-or-rollback on all exit
//! paths.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::backup::Backup;
use rusqlite::{Connection, OpenFlags, Transaction};
use tracing::info;

use crate::error::{Error, Result};

/// Version of the on-disk schema this build understands.
const SCHEMA_VERSION: i64 = 1;

/// Tables a valid database instance must contain.
const EXPECTED_TABLES: &[&str] = &[
    "schema_version",
    "users",
    "stress_logs",
    "exercises",
    "sessions",
    "anxiety_questions",
    "anxiety_results",
];

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database and bring the schema up to date.
    pub fn new(database_path: &Path) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        conn.pragma_update(None, "foreign_keys", true)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.ensure_schema()?;

        info!(path = %database_path.display(), "Connected to database");
        Ok(db)
    }

    /// In-memory database for tests and throwaway tooling.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.ensure_schema()?;
        Ok(db)
    }

    /// Take the connection lock, recovering from poisoning. A poisoned lock
    /// only means another caller panicked mid-operation; its uncommitted
    /// transaction was already rolled back on unwind, so the connection
    /// itself is still sound.
    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on
    /// `Err` (the transaction's drop handler rolls back uncommitted work, so
    /// every exit path is covered, including panics).
    pub fn with_tx<T>(&self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Create the schema on first run and apply versioned migrations after.
    fn ensure_schema(&self) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
                [],
            )?;

            let version: i64 = tx.query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )?;

            match version {
                0 => {
                    Self::create_tables(tx)?;
                    tx.execute(
                        "INSERT INTO schema_version (version) VALUES (?1)",
                        [SCHEMA_VERSION],
                    )?;
                    info!(version = SCHEMA_VERSION, "Database schema created");
                    Ok(())
                }
                v if v == SCHEMA_VERSION => Ok(()),
                // Placeholder for future upgrades: step through versions here.
                v if v < SCHEMA_VERSION => Err(Error::Configuration(format!(
                    "no migration path from schema version {} to {}",
                    v, SCHEMA_VERSION
                ))),
                v => Err(Error::Configuration(format!(
                    "database schema version {} is newer than supported version {}",
                    v, SCHEMA_VERSION
                ))),
            }
        })
    }

    fn create_tables(tx: &Transaction) -> Result<()> {
        tx.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                email TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE stress_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                stress_level INTEGER NOT NULL
                    CHECK(stress_level >= 1 AND stress_level <= 10),
                notes TEXT,
                sleep_hours REAL,
                physical_activity INTEGER,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                duration INTEGER NOT NULL,
                category TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                duration INTEGER NOT NULL,
                status TEXT NOT NULL,
                notes TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (exercise_id) REFERENCES exercises(id)
            );

            CREATE TABLE anxiety_questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position INTEGER UNIQUE NOT NULL
                    CHECK(position >= 1 AND position <= 7),
                text TEXT NOT NULL
            );

            CREATE TABLE anxiety_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                taken_at TEXT NOT NULL,
                answers TEXT NOT NULL,
                score INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );",
        )?;
        Ok(())
    }

    /// Row counts per table, for the admin overview.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        self.with_tx(|tx| {
            let mut counts = Vec::new();
            for table in EXPECTED_TABLES.iter().filter(|t| **t != "schema_version") {
                let count: i64 =
                    tx.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
                counts.push((*table, count));
            }
            Ok(counts)
        })
    }

    /// Copy the live database to `backup_path` with the SQLite online
    /// backup API. Blocks the caller until the copy finishes.
    pub fn backup(&self, backup_path: &Path) -> Result<()> {
        let conn = self.lock_conn();
        let mut dst = Connection::open(backup_path)?;
        let backup = Backup::new(&conn, &mut dst)?;
        backup.run_to_completion(64, Duration::from_millis(0), None)?;

        info!(path = %backup_path.display(), "Database backed up");
        Ok(())
    }

    /// Replace the live database contents with the backup at `backup_path`.
    ///
    /// The source is verified to be a valid instance of the expected schema
    /// before anything is overwritten; an invalid file fails with a storage
    /// error and leaves the live database untouched.
    pub fn restore(&self, backup_path: &Path) -> Result<()> {
        // Read-only open: a missing path must fail here, not leave a fresh
        // empty file behind.
        let src = Connection::open_with_flags(
            backup_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::verify_schema(&src, backup_path)?;

        let mut conn = self.lock_conn();
        let backup = Backup::new(&src, &mut conn)?;
        backup.run_to_completion(64, Duration::from_millis(0), None)?;

        info!(path = %backup_path.display(), "Database restored");
        Ok(())
    }

    /// Check that `conn` holds every expected table and a supported schema
    /// version.
    fn verify_schema(conn: &Connection, path: &Path) -> Result<()> {
        let invalid = |detail: String| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} is not a valid backup: {}", path.display(), detail),
            ))
        };

        for table in EXPECTED_TABLES {
            let exists: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .map_err(|e| invalid(e.to_string()))?;
            if exists == 0 {
                return Err(invalid(format!("missing table '{}'", table)));
            }
        }

        let version: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .map_err(|e| invalid(e.to_string()))?;
        if version != SCHEMA_VERSION {
            return Err(invalid(format!("unsupported schema version {}", version)));
        }

        Ok(())
    }
}
