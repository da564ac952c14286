//! Database schema definitions
//!
//! Column names and nullability mirror the `community_ai` relational schema.
//! Foreign keys carry no ON DELETE / ON UPDATE action, so SQLite applies
//! NO ACTION and rejects deletes that would leave dependants dangling.

/// Name of the logical schema. Also the default database file stem.
pub const SCHEMA_NAME: &str = "community_ai";

/// SQL expression producing the current UTC time in the stored timestamp format.
macro_rules! sql_now {
    () => {
        "strftime('%Y-%m-%d %H:%M:%f+00:00', 'now')"
    };
}
pub(crate) use sql_now;

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = concat!(
    r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    is_active BOOLEAN DEFAULT 1,
    last_active TIMESTAMP,
    joined_at TIMESTAMP DEFAULT ("#,
    sql_now!(),
    r#")
)
"#
);

/// SQL to create the challenges table
pub const CREATE_CHALLENGES_TABLE: &str = concat!(
    r#"
CREATE TABLE IF NOT EXISTS challenges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    week INTEGER NOT NULL,
    goal TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    created_at TIMESTAMP DEFAULT ("#,
    sql_now!(),
    r#")
)
"#
);

/// SQL to create the responses table
pub const CREATE_RESPONSES_TABLE: &str = concat!(
    r#"
CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES users(id),
    challenge_id INTEGER REFERENCES challenges(id),
    content TEXT,
    created_at TIMESTAMP DEFAULT ("#,
    sql_now!(),
    r#")
)
"#
);

/// SQL to create the metrics table
/// Several snapshots per challenge are allowed; `analyzed_at` orders them
pub const CREATE_METRICS_TABLE: &str = concat!(
    r#"
CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    challenge_id INTEGER REFERENCES challenges(id),
    completion_rate DOUBLE PRECISION,
    engagement_score DOUBLE PRECISION,
    sales_conversion DOUBLE PRECISION,
    reactivation_rate DOUBLE PRECISION,
    analyzed_at TIMESTAMP DEFAULT ("#,
    sql_now!(),
    r#")
)
"#
);

/// Bookkeeping table for applied migrations
pub const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_responses_challenge ON responses(challenge_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_responses_user ON responses(user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_metrics_challenge ON metrics(challenge_id, analyzed_at)",
];

/// One step of the schema history.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// Ordered schema history. Append only; never edit an applied step.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create users, challenges, responses and metrics",
        statements: &[
            CREATE_USERS_TABLE,
            CREATE_CHALLENGES_TABLE,
            CREATE_RESPONSES_TABLE,
            CREATE_METRICS_TABLE,
        ],
    },
    Migration {
        version: 2,
        description: "add lookup indexes for responses and metrics",
        statements: CREATE_INDEXES,
    },
];

/// Version the schema reaches once every migration is applied
pub fn current_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// All schema creation statements, in application order
pub fn all_schema_statements() -> Vec<&'static str> {
    MIGRATIONS
        .iter()
        .flat_map(|m| m.statements.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_strictly_ordered() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(current_version(), 2);
    }

    #[test]
    fn test_timestamp_defaults_use_shared_format() {
        for ddl in [CREATE_USERS_TABLE, CREATE_CHALLENGES_TABLE, CREATE_RESPONSES_TABLE, CREATE_METRICS_TABLE] {
            assert!(ddl.contains("strftime('%Y-%m-%d %H:%M:%f+00:00', 'now')"));
        }
    }
}
