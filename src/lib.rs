//! # community-ai - Community Engagement Store
//!
//! Relational storage for tracking community engagement around weekly challenges.
//!
//! community-ai provides:
//! - Four normalized tables: users, challenges, responses, metrics
//! - Store-generated surrogate keys that are never reused
//! - Referential integrity with restrict semantics (no cascades)
//! - SQLite-backed persistence with versioned migrations
//! - A small seed dataset and read-only summary reports

pub mod user;
pub mod challenge;
pub mod response;
pub mod metric;
pub mod storage;
pub mod output;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use user::{User, NewUser};
pub use challenge::{Challenge, NewChallenge, Goal};
pub use response::{Response, NewResponse};
pub use metric::{Metric, NewMetric};
pub use storage::SqliteStore;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A not-null column was omitted on insert (`table.column`)
    #[error("Constraint violation: {0} must not be null")]
    ConstraintViolation(String),

    /// A foreign key points nowhere, or a delete would orphan dependent rows
    #[error("Referential violation: {0}")]
    ReferentialViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value the store cannot keep faithfully (NaN, out-of-range timestamp)
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
