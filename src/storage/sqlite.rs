//! SQLite storage implementation

use std::path::Path;
use std::time::Duration;
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use crate::{Challenge, Metric, Response, Result, User};
use super::schema;

/// Default time a writer waits for the database lock
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection options for [`SqliteStore::open_with`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,
    /// Use write-ahead logging (file databases only)
    pub wal: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            wal: true,
        }
    }
}

/// SQLite-backed storage for the community schema
///
/// One store owns one connection. Concurrent callers open their own store on
/// the same file; SQLite serialises the writers.
pub struct SqliteStore {
    pub(super) conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &StoreOptions::default())
    }

    /// Open a database file with explicit connection options
    pub fn open_with(path: &Path, options: &StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        if options.wal {
            // journal_mode returns the resulting mode as a row
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        }
        let store = Self { conn };
        store.initialize_schema()?;
        tracing::debug!("Opened store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Enable constraints and bring the schema up to date
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON")?;
        self.conn.execute(schema::CREATE_SCHEMA_VERSION_TABLE, [])?;

        let current = self.schema_version()?;
        if current < schema::current_version() {
            self.migrate(current)?;
        }
        Ok(())
    }

    /// Highest applied migration (0 for an empty database)
    pub fn schema_version(&self) -> Result<i64> {
        let version: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    /// Apply every migration newer than `from_version`, each in its own transaction
    fn migrate(&self, from_version: i64) -> Result<()> {
        for migration in schema::MIGRATIONS.iter().filter(|m| m.version > from_version) {
            let applied = self.transaction(|tx| {
                // Another connection may have migrated since we read the version
                let done: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM schema_version WHERE version = ?1)",
                    [migration.version],
                    |row| row.get(0),
                )?;
                if done {
                    return Ok(false);
                }
                for stmt in migration.statements {
                    tx.execute(stmt, [])?;
                }
                tx.execute(
                    concat!(
                        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ",
                        schema::sql_now!(),
                        ")"
                    ),
                    [migration.version],
                )?;
                Ok(true)
            })?;
            if applied {
                tracing::info!(
                    "Database migrated to version {} ({})",
                    migration.version,
                    migration.description
                );
            }
        }
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Transactions ==========

    /// Run `f` inside an IMMEDIATE transaction.
    ///
    /// The write lock is taken up front, so concurrent writers queue on the
    /// busy timeout instead of failing on a read-to-write upgrade. Commits when
    /// `f` returns `Ok`; the transaction rolls back on drop otherwise.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ========== Bulk Operations ==========

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            users: self.count_users()?,
            challenges: self.count_challenges()?,
            responses: self.count_responses()?,
            metrics: self.count_metrics()?,
            schema_version: self.schema_version()?,
        })
    }

    /// Dump every row of every table, ordered by id
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            schema: schema::SCHEMA_NAME.to_string(),
            schema_version: self.schema_version()?,
            users: self.list_users()?,
            challenges: self.challenges_by_id()?,
            responses: self.list_responses()?,
            metrics: self.metrics_by_id()?,
        })
    }

    pub(crate) fn count_rows(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether a row with this id exists in `table`
    pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table);
        let exists: bool = conn.query_row(&sql, params![id], |row| row.get(0))?;
        Ok(exists)
    }

    /// Fail with a referential violation unless `id` is NULL or exists in `table`
    pub(crate) fn check_reference(
        conn: &Connection,
        column: &str,
        table: &str,
        id: Option<i64>,
    ) -> Result<()> {
        match id {
            Some(id) if !Self::row_exists(conn, table, id)? => {
                Err(crate::Error::ReferentialViolation(format!(
                    "{} = {} does not reference an existing {} row",
                    column, id, table
                )))
            }
            _ => Ok(()),
        }
    }

    /// Fail with a referential violation if any `dependants` row points at `id`
    pub(crate) fn check_no_dependants(
        conn: &Connection,
        table: &str,
        id: i64,
        dependants: &[(&str, &str)],
    ) -> Result<()> {
        for (dep_table, dep_column) in dependants {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", dep_table, dep_column);
            let count: i64 = conn.query_row(&sql, params![id], |row| row.get(0))?;
            if count > 0 {
                return Err(crate::Error::ReferentialViolation(format!(
                    "cannot delete {} {}: referenced by {} row(s) in {}.{}",
                    table, id, count, dep_table, dep_column
                )));
            }
        }
        Ok(())
    }

    /// Delete one row by id, mapping a zero-row delete to `NotFound`
    pub(crate) fn delete_row(
        &self,
        table: &str,
        id: i64,
        dependants: &[(&str, &str)],
    ) -> Result<()> {
        self.transaction(|tx| {
            if !Self::row_exists(tx, table, id)? {
                return Err(crate::Error::NotFound(format!("{} {}", table, id)));
            }
            Self::check_no_dependants(tx, table, id, dependants)?;
            let sql = format!("DELETE FROM {} WHERE id = ?1", table);
            tx.execute(&sql, params![id])
                .map_err(|e| super::errors::classify(e, &format!("delete from {}", table)))?;
            Ok(())
        })?;
        tracing::debug!("Deleted {} {}", table, id);
        Ok(())
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub users: usize,
    pub challenges: usize,
    pub responses: usize,
    pub metrics: usize,
    pub schema_version: i64,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Users: {}", self.users)?;
        writeln!(f, "  Challenges: {}", self.challenges)?;
        writeln!(f, "  Responses: {}", self.responses)?;
        writeln!(f, "  Metrics: {}", self.metrics)?;
        writeln!(f, "  Schema version: {}", self.schema_version)
    }
}

/// Full dump of the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema: String,
    pub schema_version: i64,
    pub users: Vec<User>,
    pub challenges: Vec<Challenge>,
    pub responses: Vec<Response>,
    pub metrics: Vec<Metric>,
}
