//! Response rows - a user's submission to a challenge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `responses` table.
///
/// Both references are nullable, so orphaned responses are structurally allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub user_id: Option<i64>,
    pub challenge_id: Option<i64>,
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `responses` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewResponse {
    pub user_id: Option<i64>,
    pub challenge_id: Option<i64>,
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewResponse {
    pub fn new(user_id: Option<i64>, challenge_id: Option<i64>) -> Self {
        Self {
            user_id,
            challenge_id,
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// A response joined with the challenge it answers, for answer histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub response: Response,
    pub challenge_title: Option<String>,
    pub week: Option<i64>,
    pub goal: Option<String>,
}
