//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - users(id, username, is_active, last_active, joined_at)
//! - challenges(id, week, goal, title, description, created_at)
//! - responses(id, user_id, challenge_id, content, created_at)
//! - metrics(id, challenge_id, completion_rate, engagement_score, sales_conversion, reactivation_rate, analyzed_at)

pub mod schema;
pub mod sqlite;
pub mod time;
pub mod report;
pub mod seed;
mod errors;
mod users;
mod challenges;
mod responses;
mod metrics;

pub use sqlite::{SqliteStore, StoreOptions, DbStats, Snapshot, DEFAULT_BUSY_TIMEOUT_MS};
pub use report::GoalSummary;
pub use seed::SeedOutcome;
