//! Translation of SQLite constraint failures into store errors

use crate::Error;
use rusqlite::ffi;

/// Map a failed write to the error taxonomy.
///
/// NOT NULL failures carry the offending `table.column` in SQLite's message
/// (`NOT NULL constraint failed: challenges.week`); foreign key failures do
/// not name the column, so `context` describes the attempted write.
pub(crate) fn classify(err: rusqlite::Error, context: &str) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_NOTNULL => {
                let column = message
                    .as_deref()
                    .and_then(|m| m.rsplit(": ").next())
                    .unwrap_or(context)
                    .to_string();
                return Error::ConstraintViolation(column);
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return Error::ReferentialViolation(format!(
                    "{} violates a foreign key constraint",
                    context
                ));
            }
            _ => {}
        }
    }
    Error::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_not_null_names_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (a TEXT NOT NULL)", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (a) VALUES (NULL)", [])
            .unwrap_err();

        match classify(err, "insert into t") {
            Error::ConstraintViolation(column) => assert_eq!(column, "t.a"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_foreign_key_failure() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE p (id INTEGER PRIMARY KEY);
             CREATE TABLE c (p_id INTEGER REFERENCES p(id));",
        )
        .unwrap();
        let err = conn
            .execute("INSERT INTO c (p_id) VALUES (7)", [])
            .unwrap_err();

        assert!(matches!(
            classify(err, "insert into c"),
            Error::ReferentialViolation(_)
        ));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();
        assert!(matches!(classify(err, "select"), Error::Storage(_)));
    }
}
