//! User operations

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use crate::{Error, NewUser, Result, User};
use super::schema::sql_now;
use super::{errors, time, SqliteStore};

const USER_COLUMNS: &str = "id, username, is_active, last_active, joined_at";

const INSERT_USER: &str = concat!(
    "INSERT INTO users (username, is_active, last_active, joined_at) ",
    "VALUES (?1, COALESCE(?2, 1), ?3, COALESCE(?4, ",
    sql_now!(),
    "))"
);

impl SqliteStore {
    /// Register a user. `is_active` defaults to true and `joined_at` to now.
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let user = self.transaction(|tx| {
            let id = Self::insert_user(tx, new)?;
            Self::query_user(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("users {}", id)))
        })?;
        tracing::debug!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Insert without opening a transaction; returns the generated id
    pub(crate) fn insert_user(conn: &Connection, new: &NewUser) -> Result<i64> {
        let last_active = time::encode_opt(new.last_active.as_ref())?;
        let joined_at = time::encode_opt(new.joined_at.as_ref())?;
        conn.execute(
            INSERT_USER,
            params![new.username, new.is_active, last_active, joined_at],
        )
        .map_err(|e| errors::classify(e, "insert into users"))?;
        Ok(conn.last_insert_rowid())
    }

    fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        conn.query_row(&sql, [id], row_to_user)
            .optional()
            .map_err(Into::into)
    }

    /// Get a user by id
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        Self::query_user(&self.conn, id)
    }

    /// All users, oldest id first
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.select_users("1 = 1", params![])
    }

    /// Users with exactly this username (usernames are not unique)
    pub fn find_users_by_username(&self, username: &str) -> Result<Vec<User>> {
        self.select_users("username = ?1", params![username])
    }

    /// Users whose `is_active` flag is set, a NULL flag counting as the default
    pub fn list_active_users(&self) -> Result<Vec<User>> {
        self.select_users("COALESCE(is_active, 1) = 1", params![])
    }

    fn select_users(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} ORDER BY id", USER_COLUMNS, filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map(args, row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Set the `is_active` flag
    pub fn set_user_active(&self, id: i64, active: bool) -> Result<User> {
        self.update_user(id, "is_active = ?2", params![id, active])
    }

    /// Set or clear `last_active`
    pub fn set_user_last_active(&self, id: i64, at: Option<DateTime<Utc>>) -> Result<User> {
        let encoded = time::encode_opt(at.as_ref())?;
        self.update_user(id, "last_active = ?2", params![id, encoded])
    }

    fn update_user(&self, id: i64, assignment: &str, args: &[&dyn rusqlite::ToSql]) -> Result<User> {
        let sql = format!("UPDATE users SET {} WHERE id = ?1", assignment);
        let user = self.transaction(|tx| {
            let changed = tx
                .execute(&sql, args)
                .map_err(|e| errors::classify(e, "update users"))?;
            if changed == 0 {
                return Err(Error::NotFound(format!("users {}", id)));
            }
            Self::query_user(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("users {}", id)))
        })?;
        tracing::debug!("Updated user {} ({})", id, assignment);
        Ok(user)
    }

    /// Delete a user that no response references
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.delete_row("users", id, &[("responses", "user_id")])
    }

    /// Count all users
    pub fn count_users(&self) -> Result<usize> {
        self.count_rows("users")
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        is_active: row.get(2)?,
        last_active: time::column(row, 3)?,
        joined_at: time::column(row, 4)?,
    })
}
